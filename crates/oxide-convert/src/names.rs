//! Identifier sanitization and collision resolution.
//!
//! Target identifiers may only contain ASCII letters, digits and `_`, must
//! start with a letter, and are compared case-insensitively. Source names
//! are free-form: check constraint names go through [`sanitize_name`] and
//! then [`NameRegistry::register`], foreign key names through the registry
//! only.

use std::collections::HashSet;

use tracing::debug;

/// Default maximum identifier length of the target.
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 128;

/// Substitute for an illegal leading character.
const LEADING_SUBSTITUTE: char = 'A';

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn truncate_chars(name: &str, max_len: usize) -> String {
    name.chars().take(max_len).collect()
}

/// Turns an arbitrary display name into a legal target identifier.
///
/// Illegal characters become `_`. A first character that is not a letter is
/// replaced with `A`. The result is cut to `max_len` characters. No
/// uniqueness check is done here.
///
/// ```
/// use oxide_convert::names::sanitize_name;
///
/// assert_eq!(sanitize_name("@invalid_name", 128), "Ainvalid_name");
/// assert_eq!(sanitize_name("order total", 128), "order_total");
/// ```
#[must_use]
pub fn sanitize_name(name: &str, max_len: usize) -> String {
    let trimmed = name.trim();
    let mut out = String::with_capacity(trimmed.len() + 1);

    for (i, ch) in trimmed.chars().enumerate() {
        if i == 0 && !ch.is_ascii_alphabetic() {
            out.push(LEADING_SUBSTITUTE);
        } else if is_identifier_char(ch) {
            out.push(ch);
        } else {
            out.push('_');
        }
    }

    if out.is_empty() {
        out.push(LEADING_SUBSTITUTE);
    }
    truncate_chars(&out, max_len.max(1))
}

/// Wraps a name in double quotes when it contains anything other than ASCII
/// letters, digits and `_`, the same alphabet [`sanitize_name`] keeps. Used
/// for display in reports and messages.
///
/// ```
/// use oxide_convert::names::quote_if_needed;
///
/// assert_eq!(quote_if_needed("table Name"), "\"table Name\"");
/// assert_eq!(quote_if_needed("orders"), "orders");
/// ```
#[must_use]
pub fn quote_if_needed(name: &str) -> String {
    if name.chars().all(is_identifier_char) {
        return name.to_string();
    }
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for ch in name.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Set of identifiers already assigned to target objects.
///
/// Scoped to one conversion run; it only grows. Calling [`register`] twice
/// for the same object leaves an unused reservation behind, which is
/// harmless.
///
/// [`register`]: NameRegistry::register
#[derive(Debug, Clone)]
pub struct NameRegistry {
    used: HashSet<String>,
    max_len: usize,
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDENTIFIER_LENGTH)
    }
}

impl NameRegistry {
    /// Creates an empty registry whose generated names fit in `max_len`.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            used: HashSet::new(),
            max_len: max_len.max(1),
        }
    }

    /// Maximum length of generated names.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Returns whether `name` is already used (case-insensitive).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(&Self::key(name))
    }

    /// Marks `name` as used without disambiguating it.
    ///
    /// Returns `false` if it was already taken.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(Self::key(name))
    }

    /// Reserves `candidate`, or the first free `candidate_N` (N = 1, 2, ...)
    /// if it is taken, and returns the reserved name.
    pub fn register(&mut self, candidate: &str) -> String {
        if self.reserve(candidate) {
            return candidate.to_string();
        }

        let mut counter: u64 = 1;
        loop {
            let suffix = format!("_{}", counter);
            let base_len = self.max_len.saturating_sub(suffix.len());
            let name = format!("{}{}", truncate_chars(candidate, base_len), suffix);
            if self.reserve(&name) {
                debug!(candidate = %candidate, name = %name, "Disambiguated colliding name");
                return name;
            }
            counter += 1;
        }
    }

    /// Number of used names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Returns true if no name has been used yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
