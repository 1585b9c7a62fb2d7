use std::ffi::OsStr;
use std::fmt::Display;
use std::io::Read;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{json, Value};

use cosan_core::{
    create_path_chain, deserialize, ensure_parent_exists, escape_literal, migrate,
    verify_exclusive_ownership, DisplayNameHandle, NulRecord, PathHandle, ProcessEnv, SettingsStore,
};

/// What a command prints
#[derive(Debug)]
pub enum Outcome {
    /// One JSON object per line
    Json(Vec<Value>),
    /// Bytes written to stdout verbatim
    Raw(Vec<u8>),
}

impl Outcome {
    fn one(value: Value) -> Self {
        Outcome::Json(vec![value])
    }
}

/// Parse an octal permission mode such as `755` or `0o700`
pub fn parse_mode(raw: &str) -> Result<u32, String> {
    let digits = raw.strip_prefix("0o").unwrap_or(raw);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|e| format!("invalid octal mode '{}': {}", raw, e))?;
    if mode > 0o7777 {
        return Err(format!("mode '{}' is out of range", raw));
    }
    Ok(mode)
}

pub fn expand(template: &OsStr, legacy: bool) -> Outcome {
    let mut handle = PathHandle::new(template.as_bytes());
    if legacy {
        handle = migrate(handle);
    }
    let template = handle.to_string();
    let expanded = handle.expand(&ProcessEnv);

    Outcome::one(json!({
        "template": template,
        "expanded": expanded.to_string(),
    }))
}

pub fn escape(path: &OsStr) -> Outcome {
    let escaped = escape_literal(path.as_bytes());
    Outcome::one(json!({
        "path": path.to_string_lossy(),
        "escaped": String::from_utf8_lossy(&escaped),
    }))
}

pub fn mkdir(path: &Path, mode: u32) -> anyhow::Result<Outcome> {
    create_path_chain(path, mode)?;
    Ok(Outcome::one(json!({
        "path": path.display().to_string(),
        "mode": format!("{:03o}", mode),
    })))
}

pub fn private_dir(dir: &Path) -> anyhow::Result<Outcome> {
    verify_exclusive_ownership(dir).context("refusing to use private directory")?;
    Ok(Outcome::one(json!({
        "path": dir.display().to_string(),
        "exclusive": true,
    })))
}

pub fn ensure_parent(path: &Path) -> anyhow::Result<Outcome> {
    let status = ensure_parent_exists(path)?;
    Ok(Outcome::one(json!({
        "path": path.display().to_string(),
        "status": status,
    })))
}

pub fn encode(value: &OsStr, font: bool) -> Outcome {
    let record = if font {
        DisplayNameHandle::new(value.as_bytes()).to_record()
    } else {
        PathHandle::new(value.as_bytes()).to_record()
    };
    Outcome::Raw(record)
}

pub fn decode<R: Read>(mut input: R, bound: Option<usize>, font: bool) -> anyhow::Result<Outcome> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf).context("failed to read records from stdin")?;

    let values = if font {
        decode_all::<DisplayNameHandle>(&buf, bound)?
    } else {
        decode_all::<PathHandle>(&buf, bound)?
    };
    Ok(Outcome::Json(values))
}

fn decode_all<T: NulRecord + Display>(buf: &[u8], bound: Option<usize>) -> anyhow::Result<Vec<Value>> {
    let mut values = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let rest = &buf[offset..];
        let (value, used) = deserialize::<T>(rest, bound.unwrap_or(rest.len()))
            .with_context(|| format!("bad record at offset {}", offset))?;
        values.push(json!({
            "offset": offset,
            "consumed": used,
            "value": value.to_string(),
        }));
        offset += used;
    }

    Ok(values)
}

fn open_store(file: Option<PathBuf>) -> anyhow::Result<SettingsStore> {
    match file {
        Some(path) => Ok(SettingsStore::new(path)),
        None => Ok(SettingsStore::open_default()?),
    }
}

pub fn settings_show(file: Option<PathBuf>) -> anyhow::Result<Outcome> {
    let store = open_store(file)?;
    let settings = store
        .load()
        .with_context(|| format!("failed to load {}", store.path().display()))?;

    Ok(Outcome::one(json!({
        "path": store.path().display().to_string(),
        "settings": serde_json::to_value(&settings)?,
    })))
}

pub fn settings_log_file(file: Option<PathBuf>) -> anyhow::Result<Outcome> {
    let store = open_store(file)?;
    let settings = store.load()?;
    let log_file = settings.resolve_log_file(&ProcessEnv)?;

    Ok(Outcome::one(json!({
        "log_file": log_file.map(|p| p.display().to_string()),
    })))
}

pub fn settings_private_dir(file: Option<PathBuf>) -> anyhow::Result<Outcome> {
    let store = open_store(file)?;
    let settings = store.load()?;
    let dir = settings
        .resolve_private_dir(&ProcessEnv)
        .context("refusing to use private directory")?;

    Ok(Outcome::one(json!({
        "private_dir": dir.map(|p| p.display().to_string()),
    })))
}
