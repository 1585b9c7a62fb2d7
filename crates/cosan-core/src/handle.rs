//! Path and Display-Name Handles
//!
//! Owned byte-string values used wherever a configured file path or font name
//! is stored. Neither handle ever holds an interior NUL, so both serialize to a
//! single NUL-terminated record (see [`crate::codec`]).

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::NulRecord;
use crate::expand::{expand_with, Environment};

// Handles are written as a JSON string when the bytes are UTF-8, otherwise as
// an array of byte values, so a non-UTF-8 path survives a save/load cycle.
fn serialize_handle_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    match std::str::from_utf8(bytes) {
        Ok(text) => serializer.serialize_str(text),
        Err(_) => serializer.collect_seq(bytes),
    }
}

struct HandleBytesVisitor;

impl<'de> Visitor<'de> for HandleBytesVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or an array of bytes")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.as_bytes().to_vec())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v.into_bytes())
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(v.to_vec())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            out.push(b);
        }
        Ok(out)
    }
}

/// Copy `bytes` up to (excluding) the first NUL
fn until_nul(bytes: &[u8]) -> Vec<u8> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].to_vec()
}

/// A filesystem path, possibly still an unexpanded template.
///
/// An empty handle is the "null path": no file configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathHandle {
    path: Vec<u8>,
}

impl PathHandle {
    /// Build a handle by copying `bytes`. Anything from the first NUL onward
    /// is dropped.
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            path: until_nul(bytes.as_ref()),
        }
    }

    /// The null path
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.path.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.path
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.path
    }

    /// View the raw bytes as a filesystem path
    pub fn as_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(&self.path))
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.as_path().to_path_buf()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }

    /// Expand `~`, `$NAME` and `${NAME}` references, consuming the template.
    pub fn expand<E: Environment + ?Sized>(self, env: &E) -> PathHandle {
        PathHandle::new(expand_with(self.path, env))
    }

    pub(crate) fn replace_bytes(&mut self, bytes: Vec<u8>) {
        self.path = until_nul(&bytes);
    }
}

impl NulRecord for PathHandle {
    fn record_bytes(&self) -> &[u8] {
        &self.path
    }

    fn from_record_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for PathHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PathHandle {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for PathHandle {
    fn from(p: &Path) -> Self {
        Self::new(p.as_os_str().as_bytes())
    }
}

impl From<PathBuf> for PathHandle {
    fn from(p: PathBuf) -> Self {
        Self::from(p.as_path())
    }
}

impl fmt::Display for PathHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for PathHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_handle_bytes(&self.path, serializer)
    }
}

impl<'de> Deserialize<'de> for PathHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HandleBytesVisitor).map(PathHandle::new)
    }
}

/// A font or display name. Same storage rules as [`PathHandle`] but never
/// interpreted as a path or template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DisplayNameHandle {
    name: Vec<u8>,
}

impl DisplayNameHandle {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            name: until_nul(bytes.as_ref()),
        }
    }

    pub fn is_null(&self) -> bool {
        self.name.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.name
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}

impl NulRecord for DisplayNameHandle {
    fn record_bytes(&self) -> &[u8] {
        &self.name
    }

    fn from_record_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for DisplayNameHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for DisplayNameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for DisplayNameHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_handle_bytes(&self.name, serializer)
    }
}

impl<'de> Deserialize<'de> for DisplayNameHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HandleBytesVisitor).map(DisplayNameHandle::new)
    }
}

/// Make one byte safe for use inside a single filename component
pub fn sanitise_char(c: u8) -> u8 {
    if c == b'/' {
        b'.'
    } else {
        c
    }
}

/// Apply [`sanitise_char`] to every byte, e.g. to turn a host name into a log
/// filename component.
pub fn sanitise_component(raw: &[u8]) -> Vec<u8> {
    raw.iter().copied().map(sanitise_char).collect()
}
