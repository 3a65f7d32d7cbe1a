// SPDX-License-Identifier: MIT OR Apache-2.0

//! Setting key newtype with case-insensitive identity.
//!
//! Keys are dotted names such as `Server.Port`. Two keys that differ only by
//! case name the same setting; the casing of the first write is preserved for
//! output.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A dotted setting name, compared, hashed and ordered without regard to case.
///
/// # Examples
///
/// ```
/// use instancecfg::domain::SettingKey;
///
/// let key = SettingKey::from("Server.Port");
/// assert_eq!(key, SettingKey::from("server.port"));
/// assert_eq!(key.as_str(), "Server.Port");
/// assert_eq!(key.segments().collect::<Vec<_>>(), vec!["Server", "Port"]);
/// ```
#[derive(Clone, Debug)]
pub struct SettingKey(String);

impl SettingKey {
    /// Creates a new `SettingKey` from a `String`.
    pub fn new(key: String) -> Self {
        SettingKey(key)
    }

    /// Returns the key as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the key into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Splits the key on `.` for hierarchical output.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns `true` if the key names the same setting as `other`.
    pub fn matches(&self, other: &str) -> bool {
        folded(&self.0).eq(folded(other))
    }
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

impl From<String> for SettingKey {
    fn from(s: String) -> Self {
        SettingKey(s)
    }
}

impl From<&str> for SettingKey {
    fn from(s: &str) -> Self {
        SettingKey(s.to_string())
    }
}

impl From<SettingKey> for String {
    fn from(key: SettingKey) -> Self {
        key.0
    }
}

impl AsRef<str> for SettingKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for SettingKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for SettingKey {}

impl Hash for SettingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in folded(&self.0) {
            c.hash(state);
        }
    }
}

impl PartialOrd for SettingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SettingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        folded(&self.0).cmp(folded(&other.0))
    }
}
