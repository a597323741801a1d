use crate::config::{display_value, validate_key, SETTING_KEYS};
use crate::db::Database;

/// Stored settings with secrets masked.
pub fn get_settings(db: &Database) -> Result<Vec<(String, String)>, String> {
    let mut settings = Vec::new();
    for key in SETTING_KEYS {
        if let Some(value) = db.get_setting(key).map_err(|e| e.to_string())? {
            settings.push((key.to_string(), display_value(key, &value)));
        }
    }
    Ok(settings)
}

pub fn set_setting(db: &Database, key: &str, value: &str) -> Result<(), String> {
    validate_key(key).map_err(|e| e.to_string())?;
    db.set_setting(key, value).map_err(|e| e.to_string())
}

pub fn delete_setting(db: &Database, key: &str) -> Result<(), String> {
    validate_key(key).map_err(|e| e.to_string())?;
    db.delete_setting(key).map_err(|e| e.to_string())
}
