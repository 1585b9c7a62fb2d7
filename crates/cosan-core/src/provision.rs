//! Directory Provisioning
//!
//! Creates directory chains one component at a time, and checks that a
//! directory meant for private runtime files (sockets, logs) really belongs to
//! us before anything sensitive is put in it.
//!
//! Creation is idempotent: a component that already exists counts as success,
//! so repeated or racing attempts on the same path converge. There is no
//! internal locking.

use std::ffi::OsStr;
use std::fs::{self, DirBuilder};
use std::io::ErrorKind;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{DirBuilderExt, MetadataExt};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ProvisionError;

/// Owner read/write/execute only
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Mode for non-sensitive output directories (before umask)
pub const PERMISSIVE_DIR_MODE: u32 = 0o777;

const GROUP_OTHER_BITS: u32 = 0o077;

/// Real uid of the calling process
pub fn current_uid() -> u32 {
    unsafe { libc::getuid() }
}

/// mkdir that treats AlreadyExists as success. Returns whether it created.
fn mkdir_tolerant(path: &Path, mode: u32) -> Result<bool, ProvisionError> {
    match DirBuilder::new().mode(mode).create(path) {
        Ok(()) => {
            debug!("Created directory {:?} (mode {:03o})", path, mode);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(ProvisionError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Byte offsets marking the end of each non-empty `/`-separated component.
/// The prefix `path[..end]` is the directory to create at each step.
fn component_ends(path: &[u8]) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut pos = 0;

    while pos < path.len() {
        let start = pos;
        pos += path[pos..].iter().take_while(|&&b| b != b'/').count();
        if pos > start {
            ends.push(pos);
        }
        pos += path[pos..].iter().take_while(|&&b| b == b'/').count();
    }

    ends
}

/// Create every directory along `path` with `mode`.
///
/// Components that already exist are skipped. Any other failure stops at once
/// and names the component that could not be created.
pub fn create_path_chain(path: impl AsRef<Path>, mode: u32) -> Result<(), ProvisionError> {
    let bytes = path.as_ref().as_os_str().as_bytes();

    for end in component_ends(bytes) {
        let prefix = Path::new(OsStr::from_bytes(&bytes[..end]));
        mkdir_tolerant(prefix, mode)?;
    }

    Ok(())
}

/// Make sure `dirname` exists and is exclusively ours.
///
/// Creates it with mode 0700 if missing. Fails if the directory is owned by
/// another uid or grants any access to group or other. Callers must not use
/// the directory after a failure: someone else may be able to see or replace
/// what we put there.
pub fn verify_exclusive_ownership(dirname: impl AsRef<Path>) -> Result<(), ProvisionError> {
    let dir = dirname.as_ref();
    mkdir_tolerant(dir, PRIVATE_DIR_MODE)?;

    let meta = fs::metadata(dir).map_err(|source| ProvisionError::Stat {
        path: dir.to_path_buf(),
        source,
    })?;

    if !meta.is_dir() {
        warn!(path = %dir.display(), "Private directory path is not a directory");
        return Err(ProvisionError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let expected = current_uid();
    if meta.uid() != expected {
        warn!(
            "Rejecting directory {:?} owned by uid {} (expected {})",
            dir,
            meta.uid(),
            expected
        );
        return Err(ProvisionError::NotOwned {
            path: dir.to_path_buf(),
            uid: meta.uid(),
            expected,
        });
    }

    let mode = meta.mode() & 0o777;
    if mode & GROUP_OTHER_BITS != 0 {
        warn!("Rejecting directory {:?} with permissions {:03o}", dir, mode);
        return Err(ProvisionError::OverlyPermissive {
            path: dir.to_path_buf(),
            mode,
        });
    }

    Ok(())
}
