//! Strongly-typed module name wrapper.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Name of a module as recorded in the system catalog.
///
/// Module names end up inside hand-built SQL and session file names, so only
/// ASCII letters, digits and underscores are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleName(String);

impl ModuleName {
    /// Create a new `ModuleName`, panicking if the name is not valid.
    ///
    /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        assert!(Self::is_valid(&s), "invalid module name: {s:?}");
        Self(s)
    }

    /// Try to create a new `ModuleName`, returning `None` if the name is
    /// empty or contains characters outside `[A-Za-z0-9_]`.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if Self::is_valid(&s) {
            Some(Self(s))
        } else {
            None
        }
    }

    fn is_valid(s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ModuleName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ModuleName {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(s.clone()).ok_or_else(|| format!("invalid module name: {s:?}"))
    }
}

impl From<ModuleName> for String {
    fn from(name: ModuleName) -> Self {
        name.0
    }
}

impl PartialEq<str> for ModuleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModuleName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_creation() {
        let name = ModuleName::new("comment");
        assert_eq!(name.as_str(), "comment");
        assert_eq!(name, "comment");
    }

    #[test]
    fn test_module_name_rejects_sql_characters() {
        assert!(ModuleName::try_new("").is_none());
        assert!(ModuleName::try_new("forum'; --").is_none());
        assert!(ModuleName::try_new("../etc").is_none());
        assert!(ModuleName::try_new("node_access2").is_some());
    }

    #[test]
    fn test_module_name_serde() {
        let name = ModuleName::new("forum");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#""forum""#);
        let back: ModuleName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);

        let bad: Result<ModuleName, _> = serde_json::from_str(r#""a b""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_module_name_borrow() {
        use std::collections::BTreeMap;
        let mut map: BTreeMap<ModuleName, i64> = BTreeMap::new();
        map.insert(ModuleName::new("system"), 156);
        assert_eq!(map.get("system"), Some(&156));
    }
}
