//! Settings Store
//!
//! JSON settings document at `~/.cosan/settings.json` holding the configured
//! log file, log font and private runtime directory.
//!
//! Documents older than [`TEMPLATE_FORMAT_VERSION`] stored paths literally.
//! Loading such a document escapes its path fields once and stamps the current
//! version, so a saved document is never escaped again.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SettingsError;
use crate::expand::Environment;
use crate::handle::{DisplayNameHandle, PathHandle};
use crate::legacy::migrate;
use crate::parent::ensure_parent_exists;
use crate::paths::{settings_path, DEFAULT_LOG_TEMPLATE, DEFAULT_PRIVATE_DIR_TEMPLATE};
use crate::provision::verify_exclusive_ownership;

/// Format version written by this build
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// First format version whose path fields are templates
pub const TEMPLATE_FORMAT_VERSION: u32 = 2;

// Documents without a version field predate versioning entirely
fn unversioned() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "unversioned")]
    pub format_version: u32,
    #[serde(default)]
    pub log_file: PathHandle,
    #[serde(default)]
    pub log_font: DisplayNameHandle,
    #[serde(default)]
    pub private_dir: PathHandle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            log_file: PathHandle::from(DEFAULT_LOG_TEMPLATE),
            log_font: DisplayNameHandle::default(),
            private_dir: PathHandle::from(DEFAULT_PRIVATE_DIR_TEMPLATE),
        }
    }
}

impl Settings {
    /// Parse a document and bring it up to the current format
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let raw: Settings = serde_json::from_str(json)?;
        Ok(raw.upgrade())
    }

    /// Escape literal path fields of a pre-template document. Documents
    /// already at the template format pass through untouched.
    pub fn upgrade(mut self) -> Self {
        if self.format_version < TEMPLATE_FORMAT_VERSION {
            info!(
                "Upgrading settings from format {} to {}",
                self.format_version, CURRENT_FORMAT_VERSION
            );
            self.log_file = migrate(self.log_file);
            self.private_dir = migrate(self.private_dir);
            self.format_version = CURRENT_FORMAT_VERSION;
        }
        self
    }

    /// Expand the log file template and make sure its directory exists.
    ///
    /// `None` when no log file is configured or the template expands to
    /// nothing.
    pub fn resolve_log_file<E: Environment + ?Sized>(
        &self,
        env: &E,
    ) -> Result<Option<PathBuf>, SettingsError> {
        let expanded = self.log_file.clone().expand(env);
        if expanded.is_null() {
            return Ok(None);
        }

        let path = expanded.to_path_buf();
        ensure_parent_exists(&path)?;
        Ok(Some(path))
    }

    /// Expand the private directory template, create it if needed and check
    /// that it is exclusively ours. Its parent is created like any output
    /// directory.
    pub fn resolve_private_dir<E: Environment + ?Sized>(
        &self,
        env: &E,
    ) -> Result<Option<PathBuf>, SettingsError> {
        let expanded = self.private_dir.clone().expand(env);
        if expanded.is_null() {
            return Ok(None);
        }

        // `private/` names the same directory as `private`; without trimming,
        // the parent step would create the leaf itself with the open mode.
        let dir = PathHandle::new(trim_trailing_separators(expanded.as_bytes())).to_path_buf();
        ensure_parent_exists(&dir)?;
        verify_exclusive_ownership(&dir)?;
        Ok(Some(dir))
    }
}

// Keeps a lone `/` so the root stays the root
fn trim_trailing_separators(path: &[u8]) -> &[u8] {
    let end = path
        .iter()
        .rposition(|&b| b != b'/')
        .map_or(path.len().min(1), |i| i + 1);
    &path[..end]
}

/// Reads and writes the settings document
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location (`~/.cosan/settings.json`)
    pub fn open_default() -> Result<Self, SettingsError> {
        Ok(Self::new(settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, upgrading older formats. A missing file yields the
    /// defaults.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            info!("Settings file does not exist: {:?}", self.path);
            return Ok(Settings::default());
        }

        let data = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        Settings::from_json(&data)
    }

    /// Write the document atomically (temp file, then rename)
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        ensure_parent_exists(&self.path)?;

        let json = serde_json::to_string_pretty(settings)?;
        let file_name = self
            .path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("settings.json");
        let tmp_path = self.path.with_file_name(format!("{file_name}.tmp"));

        fs::write(&tmp_path, json).map_err(|source| SettingsError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}
