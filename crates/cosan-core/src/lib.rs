//! cosan core
//!
//! Path templates, stored path handles, and private directory provisioning.

pub mod codec;
pub mod error;
pub mod expand;
pub mod handle;
pub mod legacy;
pub mod parent;
pub mod paths;
pub mod provision;
pub mod settings;

pub use codec::{deserialize, serialize, serialized_len, NulRecord, RecordReader, RecordWriter};
pub use error::{CodecError, ProvisionError, SettingsError};
pub use expand::{expand, expand_to_path, expand_with, Environment, ProcessEnv};
pub use handle::{sanitise_char, sanitise_component, DisplayNameHandle, PathHandle};
pub use legacy::{escape_literal, migrate};
pub use parent::{ensure_parent_exists, ParentStatus};
pub use provision::{create_path_chain, verify_exclusive_ownership, PERMISSIVE_DIR_MODE, PRIVATE_DIR_MODE};
pub use settings::{Settings, SettingsStore, CURRENT_FORMAT_VERSION, TEMPLATE_FORMAT_VERSION};
