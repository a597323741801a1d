//! Plain-text rendering of the screens.

use crate::catalog::{Activation, Assistant, SectionOffer};
use crate::chat::{ChatEntry, ChatView, Delivery};
use crate::models::Role;
use crate::router::{Navigation, Tab};
use std::fmt::Write;

const TABS: [(Tab, &str); 4] = [
    (Tab::Home, "Home"),
    (Tab::Catalog, "Assistants"),
    (Tab::Chat, "Chat"),
    (Tab::Favorites, "Favorites"),
];

pub fn nav_bar(nav: &Navigation, chat_available: bool) -> String {
    TABS.iter()
        .map(|(tab, label)| {
            if *tab == nav.tab {
                format!("[{label}]")
            } else if *tab == Tab::Chat && !chat_available {
                format!(" ({label}) ")
            } else {
                format!(" {label} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn home() -> String {
    "MAMINO\n\
     Calm, caring assistants for pregnancy and the first year.\n\
     \n\
     /catalog   choose a plan and an assistant\n\
     /quiz      find the assistant that fits you\n\
     /favorites your saved assistants\n"
        .to_string()
}

pub fn quiz() -> String {
    "Quiz\n\
     1. Are you expecting, or is the baby already here?\n\
     2. What worries you most: feelings, body, routine or care?\n\
     \n\
     Expecting: see \"Calm pregnancy\". Baby is here: see \"Our first days together\".\n"
        .to_string()
}

pub fn favorites() -> String {
    "Favorites\nNothing saved yet.\n".to_string()
}

pub fn sections(offers: &[SectionOffer]) -> String {
    let mut out = String::new();
    for offer in offers {
        let _ = writeln!(out, "{} ({})", offer.section.title, offer.section.key);
        let _ = writeln!(out, "  {}", offer.section.subtitle);
        for tier in &offer.tiers {
            let _ = writeln!(
                out,
                "  {:<6} {:>2} assistants  [{}]",
                tier.tier.name(),
                tier.unlock_count,
                tier.action.label()
            );
            for title in &tier.assistant_titles {
                let _ = writeln!(out, "           - {title}");
            }
        }
    }
    out
}

pub fn assistants(list: &[(&Assistant, bool)]) -> String {
    let mut out = String::new();
    for (assistant, unlocked) in list {
        let lock = if *unlocked { " " } else { "*" };
        let _ = writeln!(out, "{lock} {:<20} {}", assistant.slug, assistant.title);
        let _ = writeln!(out, "   {}", assistant.description);
    }
    out
}

pub fn activation(activation: &Activation) -> String {
    let mut out = format!(
        "{}: {} [{}]\n",
        activation.section.title,
        activation.tier,
        activation.action.label()
    );
    for assistant in &activation.unlocked {
        let _ = writeln!(out, "  {:<20} {}", assistant.slug, assistant.title);
    }
    out
}

pub fn entry(entry: &ChatEntry) -> String {
    let who = match entry.role {
        Role::User => "you",
        Role::Assistant | Role::System | Role::Other => "mamino",
    };
    let marker = match entry.delivery {
        Delivery::Pending => " …",
        Delivery::Confirmed => "",
        Delivery::Failed => " (not delivered)",
    };
    format!("{who}> {}{marker}", entry.text)
}

pub fn chat(view: &ChatView) -> String {
    let mut out = String::new();
    if let Some(title) = &view.title {
        let _ = writeln!(out, "-- {title} --");
    }
    for e in &view.entries {
        let _ = writeln!(out, "{}", entry(e));
    }
    if let Some(status) = &view.status {
        let _ = writeln!(out, "* {status}");
    }
    out
}
