//! Resolves the Telegram user id a chat session is opened for.

use serde::Deserialize;

/// Identity used when running outside Telegram with debug identity allowed.
pub const DEBUG_TELEGRAM_ID: &str = "debug-123";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("No Telegram user available; open the app from Telegram or configure `telegram_id`")]
    Unavailable,
    #[error("Invalid Telegram init data: {0}")]
    InvalidInitData(String),
}

/// The `user` object embedded in WebApp init data.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    pub init_data: Option<String>,
    pub telegram_id: Option<String>,
    pub allow_debug: bool,
}

impl IdentityResolver {
    /// Init data first, then an explicitly configured id, then the debug
    /// constant if allowed.
    pub fn resolve(&self) -> Result<String, IdentityError> {
        if let Some(init_data) = self.init_data.as_deref().filter(|d| !d.is_empty()) {
            if let Some(user) = parse_init_data_user(init_data)? {
                return Ok(user.id.to_string());
            }
        }
        if let Some(id) = self.telegram_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        if self.allow_debug {
            tracing::debug!("no Telegram identity, using debug id");
            return Ok(DEBUG_TELEGRAM_ID.to_string());
        }
        Err(IdentityError::Unavailable)
    }
}

/// Extracts the `user` field from url-encoded init data. Absent `user` is not
/// an error; a present but unparsable one is.
pub fn parse_init_data_user(init_data: &str) -> Result<Option<TelegramUser>, IdentityError> {
    let raw_user = url::form_urlencoded::parse(init_data.as_bytes())
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.into_owned());

    match raw_user {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| IdentityError::InvalidInitData(e.to_string())),
    }
}
