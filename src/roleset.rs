//! Role-set codec: the comma-joined role string stored on a user record
//!
//! Decoding trims whitespace, drops empty tokens and duplicates, and keeps
//! first-seen order. Names are not checked against the role table here;
//! unknown names simply never match during evaluation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free role names held by one principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    pub fn new() -> Self {
        RoleSet(Vec::new())
    }

    /// Parse a stored role string. `""` is the empty set.
    pub fn decode(raw: &str) -> Self {
        let mut set = RoleSet::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            set.insert(token);
        }
        set
    }

    /// Canonical stored form: names joined by `,`, no padding.
    pub fn encode(&self) -> String {
        self.0.join(",")
    }

    /// Append `role` unless already held. Returns whether it was added.
    pub fn insert(&mut self, role: &str) -> bool {
        let role = role.trim();
        if role.is_empty() || self.contains(role) {
            return false;
        }
        self.0.push(role.to_string());
        true
    }

    /// Drop `role` if held. Returns whether it was present.
    pub fn remove(&mut self, role: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|r| r != role.trim());
        self.0.len() != before
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r == role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Decode, append `role` if absent.
pub fn add_role(raw: &str, role: &str) -> RoleSet {
    let mut set = RoleSet::decode(raw);
    set.insert(role);
    set
}

/// Decode, filter `role` out if present.
pub fn remove_role(raw: &str, role: &str) -> RoleSet {
    let mut set = RoleSet::decode(raw);
    set.remove(role);
    set
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for RoleSet {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        Ok(RoleSet::decode(raw))
    }
}

impl From<String> for RoleSet {
    fn from(raw: String) -> Self {
        RoleSet::decode(&raw)
    }
}

impl From<RoleSet> for String {
    fn from(set: RoleSet) -> Self {
        set.encode()
    }
}

impl<'a> FromIterator<&'a str> for RoleSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut set = RoleSet::new();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&String) -> &str>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().map(String::as_str as fn(&String) -> &str)
    }
}
