//! Template Expansion
//!
//! Expands `~`, `$NAME` and `${NAME}` in path templates. Nothing else is
//! special: no command substitution, no globbing, no `~user` lookup.
//!
//! # Example
//! ```ignore
//! let mut env = HashMap::new();
//! env.insert("HOME".to_string(), "/home/me".to_string());
//! env.insert("HOST".to_string(), "example.org".to_string());
//! let out = expand_with("~/logs/${HOST}.log", &env);
//! // out == b"/home/me/logs/example.org.log"
//! ```

use std::collections::HashMap;
use std::ffi::OsStr;
use std::hash::BuildHasher;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;

use tracing::debug;

/// Source of variable values for expansion
pub trait Environment {
    /// Value bound to `name`, or `None` if unbound
    fn lookup(&self, name: &[u8]) -> Option<Vec<u8>>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn lookup(&self, name: &[u8]) -> Option<Vec<u8>> {
        // Names the OS cannot represent are never bound
        if name.is_empty() || name.contains(&b'=') || name.contains(&0) {
            return None;
        }
        std::env::var_os(OsStr::from_bytes(name)).map(|v| v.into_vec())
    }
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn lookup(&self, name: &[u8]) -> Option<Vec<u8>> {
        let name = std::str::from_utf8(name).ok()?;
        self.get(name).map(|v| v.as_bytes().to_vec())
    }
}

/// One unit of a scanned template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Copied to the output as-is
    Literal(u8),
    /// `$NAME` or `${NAME}`
    Var(&'a [u8]),
    /// Bare `~`
    Home,
}

/// Left-to-right scanner over a template
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    src: &'a [u8],
    pos: usize,
}

pub fn tokenize(template: &[u8]) -> Tokens<'_> {
    Tokens { src: template, pos: 0 }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let src = self.src;
        let c = *src.get(self.pos)?;

        let token = match c {
            // `\$` and `\~` lose the backslash and keep the next byte literal.
            // A backslash before anything else is an ordinary byte.
            b'\\' if matches!(src.get(self.pos + 1), Some(b'$' | b'~')) => {
                self.pos += 2;
                Token::Literal(src[self.pos - 1])
            }
            b'$' => match parse_reference(&src[self.pos..]) {
                Some((name, len)) => {
                    self.pos += len;
                    Token::Var(name)
                }
                None => {
                    self.pos += 1;
                    Token::Literal(b'$')
                }
            },
            b'~' => {
                self.pos += 1;
                Token::Home
            }
            _ => {
                self.pos += 1;
                Token::Literal(c)
            }
        };

        Some(token)
    }
}

/// Parse a reference at the start of `s` (which begins with `$`).
///
/// Returns the name and the length of the whole reference, or `None` when the
/// `$` does not start one (including an unterminated `${`).
fn parse_reference(s: &[u8]) -> Option<(&[u8], usize)> {
    match s.get(1) {
        Some(b'{') => {
            let close = s[2..].iter().position(|&b| b == b'}')?;
            Some((&s[2..2 + close], close + 3))
        }
        Some(&c) if c.is_ascii_alphabetic() || c == b'_' => {
            let len = s[1..]
                .iter()
                .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_')
                .count();
            Some((&s[1..1 + len], len + 1))
        }
        _ => None,
    }
}

/// Expand `template` against `env`, consuming it.
///
/// Unbound variables (and `~` without `HOME`) expand to nothing. Malformed
/// references are copied through literally; expansion never fails.
pub fn expand_with<E: Environment + ?Sized>(template: impl Into<Vec<u8>>, env: &E) -> Vec<u8> {
    let template = template.into();
    let mut out = Vec::with_capacity(template.len());

    for token in tokenize(&template) {
        match token {
            Token::Literal(b) => out.push(b),
            Token::Var(name) => {
                if let Some(value) = env.lookup(name) {
                    out.extend_from_slice(&value);
                }
            }
            Token::Home => {
                if let Some(home) = env.lookup(b"HOME") {
                    out.extend_from_slice(&home);
                }
            }
        }
    }

    debug!(
        template = %String::from_utf8_lossy(&template),
        expanded = %String::from_utf8_lossy(&out),
        "Expanded path template"
    );
    out
}

/// Expand against the process environment
pub fn expand(template: impl Into<Vec<u8>>) -> Vec<u8> {
    expand_with(template, &ProcessEnv)
}

/// Expand against the process environment and view the result as a path
pub fn expand_to_path(template: impl Into<Vec<u8>>) -> PathBuf {
    PathBuf::from(OsStr::from_bytes(&expand(template)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(template: &str, env: &HashMap<String, String>) -> String {
        String::from_utf8(expand_with(template, env)).unwrap()
    }

    #[test]
    fn test_simple_var_then_noop() {
        let e = env(&[("VAR", "abc")]);
        let once = run("$VAR", &e);
        assert_eq!(once, "abc");
        assert_eq!(run(&once, &e), "abc");
    }

    #[test]
    fn test_escaped_dollar_is_literal() {
        assert_eq!(run(r"\$FOO", &env(&[])), "$FOO");
        assert_eq!(run(r"\$FOO", &env(&[("FOO", "bar")])), "$FOO");
        assert_eq!(run(r"\${FOO}", &env(&[("FOO", "bar")])), "${FOO}");
    }

    #[test]
    fn test_escaped_tilde_is_literal() {
        assert_eq!(run(r"\~/x", &env(&[("HOME", "/home/me")])), "~/x");
    }

    #[test]
    fn test_backslash_elsewhere_is_kept() {
        assert_eq!(run(r"a\b\\c", &env(&[])), r"a\b\\c");
        assert_eq!(run(r"trailing\", &env(&[])), r"trailing\");
    }

    #[test]
    fn test_double_backslash_escapes_only_once() {
        // First backslash is ordinary, second escapes the `$`
        assert_eq!(run(r"\\$HOME", &env(&[("HOME", "/h")])), r"\$HOME");
    }

    #[test]
    fn test_unbound_braced_var_vanishes() {
        assert_eq!(run("${UNBOUND}", &env(&[])), "");
        assert_eq!(run("a${UNBOUND}b", &env(&[])), "ab");
    }

    #[test]
    fn test_unterminated_brace_is_literal() {
        assert_eq!(run("${UNCLOSED", &env(&[("UNCLOSED", "x")])), "${UNCLOSED");
    }

    #[test]
    fn test_unterminated_brace_later_refs_still_expand() {
        assert_eq!(run("${A/$B", &env(&[("B", "bee")])), "${A/bee");
    }

    #[test]
    fn test_braced_name_is_unrestricted() {
        let e = env(&[("A B", "spaced"), ("", "never")]);
        assert_eq!(run("${A B}", &e), "spaced");
        assert_eq!(run("x${}y", &env(&[])), "xy");
    }

    #[test]
    fn test_bare_name_is_maximal() {
        let e = env(&[("HOME", "/h")]);
        assert_eq!(run("$HOME_DIR", &e), "");
        assert_eq!(run("${HOME}_DIR", &e), "/h_DIR");
        assert_eq!(run("$HOME/x", &e), "/h/x");
        assert_eq!(run("$_a1-b", &env(&[("_a1", "v")])), "v-b");
    }

    #[test]
    fn test_dollar_without_name_is_literal() {
        let e = env(&[]);
        assert_eq!(run("$", &e), "$");
        assert_eq!(run("cost$5", &e), "cost$5");
        assert_eq!(run("a$-b", &e), "a$-b");
        assert_eq!(run("$$", &e), "$$");
    }

    #[test]
    fn test_tilde_expands_home_anywhere() {
        let e = env(&[("HOME", "/home/me")]);
        assert_eq!(run("~", &e), "/home/me");
        assert_eq!(run("~/logs", &e), "/home/me/logs");
        assert_eq!(run("/a~b", &e), "/a/home/meb");
    }

    #[test]
    fn test_tilde_user_is_not_a_user_lookup() {
        let e = env(&[("HOME", "/home/me")]);
        assert_eq!(run("~bob/x", &e), "/home/mebob/x");
    }

    #[test]
    fn test_tilde_without_home_vanishes() {
        assert_eq!(run("~/logs", &env(&[])), "/logs");
    }

    #[test]
    fn test_values_are_not_reexpanded() {
        let e = env(&[("VAR", "$HOME~"), ("HOME", "/h")]);
        assert_eq!(run("$VAR", &e), "$HOME~");
    }

    #[test]
    fn test_tokenize() {
        let toks: Vec<_> = tokenize(br"a\$${X}~$Y$").collect();
        assert_eq!(
            toks,
            vec![
                Token::Literal(b'a'),
                Token::Literal(b'$'),
                Token::Var(b"X"),
                Token::Home,
                Token::Var(b"Y"),
                Token::Literal(b'$'),
            ]
        );
    }

    #[test]
    fn test_process_env() {
        std::env::set_var("COSAN_EXPAND_TEST_VALUE", "from-process");
        assert_eq!(expand("<$COSAN_EXPAND_TEST_VALUE>"), b"<from-process>");
        assert_eq!(
            expand_to_path("/tmp/${COSAN_EXPAND_TEST_VALUE}"),
            PathBuf::from("/tmp/from-process")
        );
        assert_eq!(ProcessEnv.lookup(b""), None);
        assert_eq!(ProcessEnv.lookup(b"A=B"), None);
        assert_eq!(ProcessEnv.lookup(b"COSAN_EXPAND_TEST_UNSET_NAME"), None);
    }
}
