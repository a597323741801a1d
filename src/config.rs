use crate::api::http::{ApiConfig, DEFAULT_BASE_URL};
use crate::db::Database;
use crate::identity::IdentityResolver;
use crate::storage::StorageError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Keys accepted in the `settings` table.
pub const SETTING_KEYS: &[&str] = &[
    "api_base_url",
    "telegram_id",
    "telegram_init_data",
    "allow_debug_identity",
    "request_timeout_secs",
];

const SECRET_KEYS: &[&str] = &["telegram_init_data"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown setting key: {0}")]
    UnknownKey(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("No data directory available; pass --data-dir")]
    NoDataDir,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub telegram_id: Option<String>,
    pub telegram_init_data: Option<String>,
    pub allow_debug_identity: bool,
    /// `None` disables the timeout.
    pub request_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            telegram_id: None,
            telegram_init_data: None,
            allow_debug_identity: true,
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

pub fn env_var_for(key: &str) -> String {
    format!("MAMINO_{}", key.to_ascii_uppercase())
}

pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("mamino"))
        .ok_or(ConfigError::NoDataDir)
}

pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    if SETTING_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(ConfigError::UnknownKey(key.to_string()))
    }
}

/// Masks secrets for display.
pub fn display_value(key: &str, value: &str) -> String {
    if SECRET_KEYS.contains(&key) && value.chars().count() > 8 {
        let chars: Vec<char> = value.chars().collect();
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        value.to_string()
    }
}

impl AppConfig {
    /// Defaults, overlaid by stored settings, overlaid by `MAMINO_*` env vars.
    pub fn load(db: &Database) -> Result<Self, ConfigError> {
        Self::resolve(|key| {
            let from_env = std::env::var(env_var_for(key))
                .ok()
                .filter(|v| !v.trim().is_empty());
            match from_env {
                Some(value) => Ok(Some(value)),
                None => db.get_setting(key).map_err(ConfigError::from),
            }
        })
    }

    pub fn resolve(
        mut lookup: impl FnMut(&str) -> Result<Option<String>, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(url) = lookup("api_base_url")? {
            config.api_base_url = url.trim().to_string();
        }
        config.telegram_id = lookup("telegram_id")?;
        config.telegram_init_data = lookup("telegram_init_data")?;
        if let Some(value) = lookup("allow_debug_identity")? {
            config.allow_debug_identity = parse_bool("allow_debug_identity", &value)?;
        }
        if let Some(value) = lookup("request_timeout_secs")? {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "request_timeout_secs".into(),
                value: value.clone(),
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base_url.clone(),
            init_data: self.telegram_init_data.clone(),
            timeout: self.request_timeout,
        }
    }

    pub fn identity(&self) -> IdentityResolver {
        IdentityResolver {
            init_data: self.telegram_init_data.clone(),
            telegram_id: self.telegram_id.clone(),
            allow_debug: self.allow_debug_identity,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
