//! Legacy Path Migration
//!
//! Settings written before paths became templates stored `$` and `~` as plain
//! filename bytes. Escaping them once makes template expansion reproduce the
//! original bytes.
//!
//! Apply to each legacy value exactly once, before it is ever expanded: a
//! second pass double-escapes and changes the value. The settings loader
//! guarantees this by bumping the stored format version.

use std::borrow::Cow;

use tracing::info;

use crate::handle::PathHandle;

fn needs_escape(b: u8) -> bool {
    b == b'$' || b == b'~'
}

/// Insert a backslash before every `$` and `~`.
///
/// Borrows the input unchanged when there is nothing to escape.
pub fn escape_literal(raw: &[u8]) -> Cow<'_, [u8]> {
    let count = raw.iter().filter(|&&b| needs_escape(b)).count();
    if count == 0 {
        return Cow::Borrowed(raw);
    }

    let mut out = Vec::with_capacity(raw.len() + count);
    for &b in raw {
        if needs_escape(b) {
            out.push(b'\\');
        }
        out.push(b);
    }
    Cow::Owned(out)
}

/// Rewrite a pre-template path so that expansion yields its old literal value
pub fn migrate(mut path: PathHandle) -> PathHandle {
    let escaped = match escape_literal(path.as_bytes()) {
        Cow::Borrowed(_) => return path,
        Cow::Owned(escaped) => escaped,
    };

    info!(
        from = %path,
        to = %String::from_utf8_lossy(&escaped),
        "Escaped legacy path for template expansion"
    );
    path.replace_bytes(escaped);
    path
}
