//! Blob key and username validation.
//!
//! Valid blob keys:
//! - Must be non-empty and at most [`MAX_KEY_LEN`] bytes
//! - Must not contain control characters or `\`
//! - Must not start or end with `/`
//! - Components between slashes must be non-empty and must not start with `.`
//!
//! The last rule keeps `..` traversal out of filesystem-backed stores and
//! reserves dot-prefixed names for backend bookkeeping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Longest accepted blob key, in bytes.
pub const MAX_KEY_LEN: usize = 1024;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Name of a blob inside a container.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobKey(String);

impl BlobKey {
    /// Validate and wrap a key.
    ///
    /// ```
    /// use wiki_types::BlobKey;
    ///
    /// assert!(BlobKey::new("Water Oak").is_ok());
    /// assert!(BlobKey::new("users/alice").is_ok());
    /// assert!(BlobKey::new("").is_err());
    /// assert!(BlobKey::new("../etc/passwd").is_err());
    /// ```
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join `segment` under this key as a new `/`-separated key.
    pub fn join(&self, segment: &str) -> Result<Self, TypeError> {
        Self::new(format!("{}/{}", self.0, segment))
    }

    /// Every enclosing `/`-separated prefix, shortest first: `a/b/c`
    /// yields `a` and `a/b`.
    pub fn ancestors(&self) -> impl Iterator<Item = BlobKey> + '_ {
        self.0
            .match_indices('/')
            .map(|(i, _)| BlobKey(self.0[..i].to_string()))
    }
}

fn invalid_key(key: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_key(key: &str) -> Result<(), TypeError> {
    if key.is_empty() {
        return Err(invalid_key(key, "key must not be empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(invalid_key(
            key,
            format!("key is longer than {MAX_KEY_LEN} bytes"),
        ));
    }
    if let Some(ch) = key.chars().find(|c| c.is_control() || *c == '\\') {
        return Err(invalid_key(key, format!("contains forbidden character: {ch:?}")));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(invalid_key(key, "must not start or end with '/'"));
    }
    for component in key.split('/') {
        if component.is_empty() {
            return Err(invalid_key(key, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid_key(
                key,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({:?})", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BlobKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for BlobKey {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BlobKey> for String {
    fn from(key: BlobKey) -> Self {
        key.0
    }
}

/// Account name.
///
/// 1 to [`MAX_USERNAME_LEN`] characters of ASCII alphanumerics, `_`, `-`
/// or `.`, not starting with `.`. A valid username is always a valid
/// single-component [`BlobKey`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let invalid = |reason: &str| TypeError::InvalidUsername {
            name: name.clone(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("username must not be empty"));
        }
        if name.chars().count() > MAX_USERNAME_LEN {
            return Err(invalid("username is too long"));
        }
        if name.starts_with('.') {
            return Err(invalid("username must not start with '.'"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(invalid(
                "only ASCII letters, digits, '_', '-' and '.' are allowed",
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_page_names_with_spaces() {
        let key = BlobKey::new("Coast Redwood").unwrap();
        assert_eq!(key.as_str(), "Coast Redwood");
        assert_eq!(key.ancestors().count(), 0);
    }

    #[test]
    fn accepts_nested_keys() {
        let key = BlobKey::new("users/alice").unwrap();
        let users = BlobKey::new("users").unwrap();
        assert_eq!(users.join("alice").unwrap(), key);
        assert!(users.join(".tmp").is_err());

        let deep = BlobKey::new("a/b/c").unwrap();
        let ancestors: Vec<String> = deep.ancestors().map(String::from).collect();
        assert_eq!(ancestors, vec!["a", "a/b"]);
    }

    #[test]
    fn rejects_traversal_and_dot_components() {
        assert!(BlobKey::new("..").is_err());
        assert!(BlobKey::new("a/../b").is_err());
        assert!(BlobKey::new(".hidden").is_err());
        assert!(BlobKey::new("a/.tmp123").is_err());
    }

    #[test]
    fn rejects_bad_slashes() {
        assert!(BlobKey::new("/abs").is_err());
        assert!(BlobKey::new("trailing/").is_err());
        assert!(BlobKey::new("a//b").is_err());
    }

    #[test]
    fn rejects_control_characters_and_backslash() {
        assert!(BlobKey::new("line\nbreak").is_err());
        assert!(BlobKey::new("win\\path").is_err());
    }

    #[test]
    fn rejects_overlong_key() {
        let long = "a".repeat(MAX_KEY_LEN + 1);
        assert!(matches!(
            BlobKey::new(long),
            Err(TypeError::InvalidKey { .. })
        ));
    }

    #[test]
    fn join_builds_nested_key() {
        let base = BlobKey::new("users").unwrap();
        assert_eq!(base.join("bob").unwrap().as_str(), "users/bob");
        assert!(base.join("../bob").is_err());
    }

    #[test]
    fn key_serde_validates() {
        let parsed: BlobKey = serde_json::from_str("\"pages/one\"").unwrap();
        assert_eq!(parsed.as_str(), "pages/one");
        assert!(serde_json::from_str::<BlobKey>("\"../x\"").is_err());
    }

    #[test]
    fn usernames() {
        assert!(Username::new("alice").is_ok());
        assert!(Username::new("a.b-c_d9").is_ok());
        assert!(Username::new("").is_err());
        assert!(Username::new(".alice").is_err());
        assert!(Username::new("al/ice").is_err());
        assert!(Username::new("al ice").is_err());
        assert!(Username::new("x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    proptest! {
        #[test]
        fn valid_usernames_are_valid_keys(name in "[a-zA-Z0-9_-][a-zA-Z0-9_.-]{0,63}") {
            let user = Username::new(name.clone()).unwrap();
            prop_assert!(BlobKey::new(user.as_str()).is_ok());
        }
    }
}
