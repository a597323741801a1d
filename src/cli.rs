use crate::app::{App, AppState};
use crate::chat::Delivery;
use crate::commands;
use crate::config::{self, AppConfig};
use crate::db::Database;
use crate::shell;
use crate::view;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mamino")]
#[command(about = "MAMINO parenting assistants in the terminal", long_about = None)]
pub struct Cli {
    /// Directory holding the local database (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive screens (the default)
    Shell,
    /// List assistants and whether they are unlocked
    Assistants {
        #[arg(long)]
        json: bool,
    },
    /// List sections with their tiers and call-to-action
    Sections {
        #[arg(long)]
        json: bool,
    },
    /// Buy, upgrade or open a tier of a section
    Activate { section: String, tier: String },
    /// Print the conversation with an assistant
    Chat { assistant: String },
    /// Send one message to an assistant and print the reply
    Send {
        assistant: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Cached chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub enum SessionsAction {
    List,
    /// Forget one assistant's session, or all of them
    Clear { assistant: Option<String> },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Get,
    Set { key: String, value: String },
    Delete { key: String },
}

pub async fn dispatch(cli: Cli) -> Result<(), String> {
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => config::default_data_dir().map_err(|e| e.to_string())?,
    };
    let db = Arc::new(Database::new(&data_dir).map_err(|e| e.to_string())?);
    tracing::debug!(data_dir = %data_dir.display(), "database opened");

    let command = cli.command.unwrap_or(Commands::Shell);
    if let Commands::Settings { action } = &command {
        return run_settings(&db, action);
    }

    let config = AppConfig::load(&db).map_err(|e| e.to_string())?;
    let app = App::from_config(db.clone(), &config).map_err(|e| e.to_string())?;

    match command {
        Commands::Shell => shell::run(&app).await,
        Commands::Assistants { json } => {
            let list = commands::catalog::list_assistants(&app)?;
            if json {
                let value: Vec<_> = list
                    .iter()
                    .map(|(a, unlocked)| serde_json::json!({ "assistant": a, "unlocked": unlocked }))
                    .collect();
                print_json(&value)
            } else {
                print!("{}", view::assistants(&list));
                Ok(())
            }
        }
        Commands::Sections { json } => {
            let offers = commands::catalog::list_sections(&app)?;
            if json {
                print_json(&offers)
            } else {
                print!("{}", view::sections(&offers));
                Ok(())
            }
        }
        Commands::Activate { section, tier } => {
            let mut state = AppState::default();
            let activation = commands::catalog::activate_tier(&app, &mut state, &section, &tier)?;
            print!("{}", view::activation(&activation));
            Ok(())
        }
        Commands::Chat { assistant } => {
            let mut state = AppState::default();
            commands::chat::open_chat(&app, &mut state, &assistant, |_| {}).await?;
            print!("{}", view::chat(&state.chat));
            Ok(())
        }
        Commands::Send { assistant, text } => {
            let mut state = AppState::default();
            commands::chat::open_chat(&app, &mut state, &assistant, |_| {}).await?;
            commands::chat::send_message(&app, &mut state, &text.join(" "), |_| {}).await?;
            if state
                .chat
                .entries
                .iter()
                .any(|e| e.delivery == Delivery::Failed)
            {
                return Err(state.chat.status.unwrap_or_default());
            }
            if let Some(reply) = state.chat.entries.last() {
                println!("{}", reply.text);
            }
            Ok(())
        }
        Commands::Sessions { action } => match action {
            SessionsAction::List => {
                for (slug, session_id) in commands::chat::list_sessions(&app)? {
                    println!("{slug:<20} {session_id}");
                }
                Ok(())
            }
            SessionsAction::Clear { assistant } => {
                let removed = commands::chat::clear_sessions(&app, assistant.as_deref())?;
                println!("{removed} session(s) forgotten");
                Ok(())
            }
        },
        Commands::Settings { .. } => Ok(()),
    }
}

fn run_settings(db: &Database, action: &SettingsAction) -> Result<(), String> {
    match action {
        SettingsAction::Get => {
            for (key, value) in commands::settings::get_settings(db)? {
                let overridden = std::env::var(config::env_var_for(&key)).is_ok();
                let note = if overridden { "  (overridden by env)" } else { "" };
                println!("{key} = {value}{note}");
            }
            Ok(())
        }
        SettingsAction::Set { key, value } => commands::settings::set_setting(db, key, value),
        SettingsAction::Delete { key } => commands::settings::delete_setting(db, key),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}
