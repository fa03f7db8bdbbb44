//! Canonical member names.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A member name reduced to its canonical tokens.
///
/// Canonicalization splits on underscores and camel-case boundaries,
/// lowercases every token, and drops a leading `get` or `set` token when
/// something follows it. `Name`, `_name`, `get_name` and `setName` all
/// become `[name]`; `NameStyle` becomes `[name, style]`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberKey {
    tokens: Vec<String>,
}

impl MemberKey {
    /// Canonicalizes `name`.
    pub fn new(name: &str) -> Self {
        let mut tokens = Vec::new();
        for part in name.split('_').filter(|part| !part.is_empty()) {
            split_camel(part, &mut tokens);
        }
        if tokens.len() > 1 && matches!(tokens[0].as_str(), "get" | "set") {
            tokens.remove(0);
        }
        Self { tokens }
    }

    /// The canonical tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether `name` canonicalizes to this key.
    pub fn matches(&self, name: &str) -> bool {
        *self == MemberKey::new(name)
    }
}

/// Splits one underscore-free segment on case boundaries.
///
/// A boundary sits before an uppercase letter that follows a lowercase
/// letter or digit, and before the last capital of an acronym run that is
/// followed by a lowercase letter (`HTTPServer` -> `http`, `server`).
fn split_camel(part: &str, tokens: &mut Vec<String>) {
    let chars: Vec<char> = part.chars().collect();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                tokens.push(core::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
}

impl fmt::Debug for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberKey({})", self)
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            f.write_str(token)?;
        }
        Ok(())
    }
}

impl From<&str> for MemberKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
