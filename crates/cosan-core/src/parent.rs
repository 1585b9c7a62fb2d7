//! Parent Directory Resolution
//!
//! Makes sure the directory holding an output file exists. Used for ordinary
//! output locations such as session logs; directories that will hold private
//! material go through [`crate::provision::verify_exclusive_ownership`]
//! instead.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::ProvisionError;
use crate::provision::{create_path_chain, PERMISSIVE_DIR_MODE};

/// What [`ensure_parent_exists`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentStatus {
    /// No `/` in the path, so nothing to create
    NoParent,
    AlreadyPresent,
    Created,
}

impl ParentStatus {
    pub fn created(&self) -> bool {
        matches!(self, ParentStatus::Created)
    }
}

/// Create the directory containing `fullpath` if it is missing.
///
/// The parent is everything before the last `/`. Missing components are
/// created with mode 0777 (subject to umask).
pub fn ensure_parent_exists(fullpath: impl AsRef<Path>) -> Result<ParentStatus, ProvisionError> {
    let bytes = fullpath.as_ref().as_os_str().as_bytes();

    let Some(sep) = bytes.iter().rposition(|&b| b == b'/') else {
        return Ok(ParentStatus::NoParent);
    };

    // `/name`: the parent is the root
    if sep == 0 {
        return Ok(ParentStatus::AlreadyPresent);
    }

    let parent = Path::new(OsStr::from_bytes(&bytes[..sep]));
    if parent.exists() {
        return Ok(ParentStatus::AlreadyPresent);
    }

    debug!("Creating parent directory {:?}", parent);
    create_path_chain(parent, PERMISSIVE_DIR_MODE)?;
    Ok(ParentStatus::Created)
}
