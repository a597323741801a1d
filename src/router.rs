use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Home,
    Catalog,
    Assistants,
    Chat,
    Quiz,
    Favorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Home,
    Catalog,
    Chat,
    Favorites,
}

/// Backdrop the shell paints behind a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Hero,
    Plain,
    Conversation,
}

struct Route {
    screen: Screen,
    tab: Tab,
    background: Background,
    back: Option<Screen>,
}

const ROUTES: &[Route] = &[
    Route { screen: Screen::Home, tab: Tab::Home, background: Background::Hero, back: None },
    Route { screen: Screen::Catalog, tab: Tab::Catalog, background: Background::Plain, back: Some(Screen::Home) },
    Route { screen: Screen::Assistants, tab: Tab::Catalog, background: Background::Plain, back: Some(Screen::Catalog) },
    Route { screen: Screen::Chat, tab: Tab::Chat, background: Background::Conversation, back: Some(Screen::Assistants) },
    Route { screen: Screen::Quiz, tab: Tab::Home, background: Background::Hero, back: Some(Screen::Home) },
    Route { screen: Screen::Favorites, tab: Tab::Favorites, background: Background::Plain, back: Some(Screen::Home) },
];

fn route(screen: Screen) -> &'static Route {
    ROUTES
        .iter()
        .find(|r| r.screen == screen)
        .unwrap_or(&ROUTES[0])
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Home,
        Screen::Catalog,
        Screen::Assistants,
        Screen::Chat,
        Screen::Quiz,
        Screen::Favorites,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Catalog => "catalog",
            Screen::Assistants => "assistants",
            Screen::Chat => "chat",
            Screen::Quiz => "quiz",
            Screen::Favorites => "favorites",
        }
    }

    pub fn tab(self) -> Tab {
        route(self).tab
    }

    pub fn background(self) -> Background {
        route(self).background
    }

    /// Where this screen's back control leads.
    pub fn back_target(self) -> Option<Screen> {
        route(self).back
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Screen::ALL
            .into_iter()
            .find(|screen| screen.name() == s)
            .ok_or_else(|| format!("Unknown screen: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub screen: Screen,
    pub tab: Tab,
    pub background: Background,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Open an assistant before switching to the chat tab")]
    ChatUnavailable,
    #[error("Already on the first screen")]
    NoBackTarget,
}

/// Exactly one screen is active. There is no history stack.
#[derive(Debug, Clone)]
pub struct Router {
    active: Screen,
    chat_available: bool,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            active: Screen::Home,
            chat_available: false,
        }
    }
}

impl Router {
    pub fn active(&self) -> Screen {
        self.active
    }

    pub fn current(&self) -> Navigation {
        Navigation {
            screen: self.active,
            tab: self.active.tab(),
            background: self.active.background(),
        }
    }

    pub fn chat_available(&self) -> bool {
        self.chat_available
    }

    /// The chat tab stays disabled until a session has been opened.
    pub fn set_chat_available(&mut self, available: bool) {
        self.chat_available = available;
    }

    pub fn navigate(&mut self, screen: Screen) -> Result<Navigation, RouteError> {
        if screen == Screen::Chat && !self.chat_available {
            return Err(RouteError::ChatUnavailable);
        }
        tracing::debug!(from = %self.active, to = %screen, "show screen");
        self.active = screen;
        Ok(self.current())
    }

    pub fn back(&mut self) -> Result<Navigation, RouteError> {
        let target = self.active.back_target().ok_or(RouteError::NoBackTarget)?;
        self.active = target;
        Ok(self.current())
    }
}
