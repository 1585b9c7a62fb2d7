//! Error Types
//!
//! One error enum per concern. Expansion and legacy escaping never fail, so
//! they have no error type.

use std::path::PathBuf;

/// Errors from the NUL-terminated record codec
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No terminator within the scanned bound
    #[error("malformed record: no NUL terminator within {bound} bytes")]
    Malformed { bound: usize },

    #[error("record needs {needed} bytes but the buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Errors from directory provisioning
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// A path component could not be created for a reason other than
    /// already existing.
    #[error("{}: mkdir: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: stat: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// Directory exists but belongs to someone else
    #[error("{}: directory owned by uid {uid}, not by us", path.display())]
    NotOwned { path: PathBuf, uid: u32, expected: u32 },

    /// Directory grants group or other access
    #[error("{}: directory has overgenerous permissions {mode:03o} (expected 700)", path.display())]
    OverlyPermissive { path: PathBuf, mode: u32 },
}

impl ProvisionError {
    /// True for the security checks that must stop any further use of the
    /// directory.
    pub fn is_security_violation(&self) -> bool {
        matches!(
            self,
            ProvisionError::NotOwned { .. }
                | ProvisionError::OverlyPermissive { .. }
                | ProvisionError::NotADirectory { .. }
        )
    }

    /// The path the failure refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            ProvisionError::Create { path, .. }
            | ProvisionError::Stat { path, .. }
            | ProvisionError::NotADirectory { path }
            | ProvisionError::NotOwned { path, .. }
            | ProvisionError::OverlyPermissive { path, .. } => path,
        }
    }
}

/// Errors from loading or saving the settings document
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("Could not determine home directory")]
    NoHome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_message_names_component() {
        let err = ProvisionError::Create {
            path: PathBuf::from("/a/b"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("/a/b: mkdir: "), "{msg}");
        assert!(!err.is_security_violation());
    }

    #[test]
    fn test_permission_message_is_octal() {
        let err = ProvisionError::OverlyPermissive {
            path: PathBuf::from("/tmp/x"),
            mode: 0o750,
        };
        assert_eq!(
            err.to_string(),
            "/tmp/x: directory has overgenerous permissions 750 (expected 700)"
        );
        assert!(err.is_security_violation());
    }

    #[test]
    fn test_ownership_message() {
        let err = ProvisionError::NotOwned {
            path: PathBuf::from("/tmp/x"),
            uid: 0,
            expected: 1000,
        };
        assert_eq!(err.to_string(), "/tmp/x: directory owned by uid 0, not by us");
        assert_eq!(err.path(), std::path::Path::new("/tmp/x"));
    }
}
