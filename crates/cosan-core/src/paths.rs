//! Path Utilities
//!
//! Well-known locations under the cosan base directory (`~/.cosan/`).

use std::path::PathBuf;

use crate::error::SettingsError;

/// Default log file template, expanded at use time
pub const DEFAULT_LOG_TEMPLATE: &str = "~/.cosan/logs/session.log";

/// Default private runtime directory template
pub const DEFAULT_PRIVATE_DIR_TEMPLATE: &str = "~/.cosan/private";

/// Get the cosan base directory (`~/.cosan/`)
pub fn cosan_dir() -> Result<PathBuf, SettingsError> {
    let home = dirs::home_dir().ok_or(SettingsError::NoHome)?;
    Ok(home.join(".cosan"))
}

/// Get a path within the cosan directory
///
/// # Example
/// ```ignore
/// let settings = cosan_path("settings.json")?;
/// ```
pub fn cosan_path(relative_path: &str) -> Result<PathBuf, SettingsError> {
    Ok(cosan_dir()?.join(relative_path))
}

/// Get the settings file path
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    cosan_path("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_path_under_base() {
        // Only meaningful where a home directory can be found
        if let (Ok(base), Ok(settings)) = (cosan_dir(), settings_path()) {
            assert!(settings.starts_with(&base));
            assert!(settings.ends_with("settings.json"));
        }
    }

    #[test]
    fn test_default_templates_use_home() {
        assert!(DEFAULT_LOG_TEMPLATE.starts_with('~'));
        assert!(DEFAULT_PRIVATE_DIR_TEMPLATE.starts_with('~'));
    }
}
