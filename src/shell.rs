//! Interactive terminal front end: one screen at a time, slash commands for
//! navigation, plain lines are chat messages.

use crate::app::{App, AppState};
use crate::catalog;
use crate::chat::{ChatView, Delivery};
use crate::commands;
use crate::models::Role;
use crate::router::Screen;
use crate::view;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Go(Screen),
    Back,
    Activate { section: String, tier: String },
    Open(String),
    Refresh,
    Say(String),
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
/home /catalog /assistants /quiz /favorites /chat   switch screen
/back                                               previous screen
/buy <section> <tier>                               buy, upgrade or open a tier
/open <assistant>                                   start or resume a chat
/refresh                                            reload chat history
/quit                                               leave
anything else is sent to the open chat";

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(ShellCommand::Empty);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(ShellCommand::Say(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        match (name.as_str(), args.as_slice()) {
            ("back", []) => Ok(ShellCommand::Back),
            ("refresh", []) => Ok(ShellCommand::Refresh),
            ("help", _) => Ok(ShellCommand::Help),
            ("quit" | "exit", _) => Ok(ShellCommand::Quit),
            ("buy" | "tier", [section, tier]) => Ok(ShellCommand::Activate {
                section: section.to_string(),
                tier: tier.to_string(),
            }),
            ("open", [slug]) => Ok(ShellCommand::Open(slug.to_string())),
            (screen, []) => screen.parse().map(ShellCommand::Go),
            _ => Err(format!("Unknown command: /{rest}")),
        }
    }
}

fn print_update(view: &ChatView) {
    if let Some(entry) = view.pending() {
        println!("{}", view::entry(entry));
    }
    if let Some(status) = &view.status {
        println!("* {status}");
    }
}

fn render_screen(app: &App, state: &AppState) -> Result<String, String> {
    let body = match state.router.active() {
        Screen::Home => view::home(),
        Screen::Catalog => view::sections(&commands::catalog::list_sections(app)?),
        Screen::Assistants => match state.selection {
            Some((section, tier)) => {
                let list: Vec<_> = catalog::tier_assistants(section, tier)
                    .into_iter()
                    .map(|a| (a, true))
                    .collect();
                view::assistants(&list)
            }
            None => view::assistants(&commands::catalog::list_assistants(app)?),
        },
        Screen::Chat => view::chat(&state.chat),
        Screen::Quiz => view::quiz(),
        Screen::Favorites => view::favorites(),
    };
    let bar = view::nav_bar(&state.router.current(), state.router.chat_available());
    Ok(format!("{bar}\n\n{body}"))
}

/// Applies one command; returns `false` when the user asked to quit.
pub async fn handle(app: &App, state: &mut AppState, command: ShellCommand) -> Result<bool, String> {
    match command {
        ShellCommand::Empty => {}
        ShellCommand::Quit => return Ok(false),
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Go(screen) => {
            if screen == Screen::Assistants {
                state.selection = None;
            }
            state.router.navigate(screen).map_err(|e| e.to_string())?;
            println!("{}", render_screen(app, state)?);
        }
        ShellCommand::Back => {
            state.router.back().map_err(|e| e.to_string())?;
            println!("{}", render_screen(app, state)?);
        }
        ShellCommand::Activate { section, tier } => {
            let activation = commands::catalog::activate_tier(app, state, &section, &tier)?;
            println!("{}", view::activation(&activation));
        }
        ShellCommand::Open(slug) => {
            commands::chat::open_chat(app, state, &slug, print_update).await?;
            println!("{}", render_screen(app, state)?);
        }
        ShellCommand::Refresh => {
            commands::chat::refresh_history(app, state).await?;
            println!("{}", render_screen(app, state)?);
        }
        ShellCommand::Say(text) => {
            if state.router.active() != Screen::Chat {
                return Err("Open a chat first: /open <assistant>".to_string());
            }
            commands::chat::send_message(app, state, &text, print_update).await?;
            // The transcript may have been replaced; echo from the newest user turn.
            let start = state
                .chat
                .entries
                .iter()
                .rposition(|e| e.role == Role::User)
                .unwrap_or(0);
            for entry in &state.chat.entries[start..] {
                if entry.role == Role::User && entry.delivery == Delivery::Confirmed {
                    continue;
                }
                println!("{}", view::entry(entry));
            }
            if let Some(status) = &state.chat.status {
                println!("* {status}");
            }
        }
    }
    Ok(true)
}

pub async fn run(app: &App) -> Result<(), String> {
    let mut state = AppState::default();
    println!("{}", render_screen(app, &state)?);
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("* {e}");
                continue;
            }
        };
        match handle(app, &mut state, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("* {e}"),
        }
    }
    Ok(())
}
