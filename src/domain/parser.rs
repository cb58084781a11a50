//! ACCEPT argument parser.
//!
//! Splits the free-form argument list of the ACCEPT command into individual
//! actions. Whitespace and commas both separate tokens, so all of these are
//! equivalent:
//!
//! ```text
//! ACCEPT nick1,nick2 -nick3
//! ACCEPT nick1 nick2,-nick3
//! ACCEPT ,nick1,,nick2 ,-nick3,
//! ```

/// A single action requested through ACCEPT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptToken {
    /// `*`: list the accept list
    List,
    /// `nick` or `+nick`
    Add(String),
    /// `-nick`
    Remove(String),
}

impl AcceptToken {
    /// Classify a single non-empty sub-token.
    pub fn classify(token: &str) -> Self {
        if token == "*" {
            AcceptToken::List
        } else if let Some(nick) = token.strip_prefix('-') {
            AcceptToken::Remove(nick.to_string())
        } else {
            let nick = token.strip_prefix('+').unwrap_or(token);
            AcceptToken::Add(nick.to_string())
        }
    }
}

/// Split ACCEPT arguments into raw sub-tokens, prefixes kept.
///
/// Empty sub-tokens are skipped.
pub fn split_accept_args<S: AsRef<str>>(args: &[S]) -> Vec<&str> {
    args.iter()
        .flat_map(|arg| arg.as_ref().split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|token| !token.is_empty())
        .collect()
}
