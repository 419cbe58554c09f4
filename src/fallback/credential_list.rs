//! Defines [`CredentialList`], the ordered pool of API keys tried by the
//! [`crate::FallbackFetcher`].

use crate::fallback::error::FetchError;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// An ordered, non-empty, duplicate-free list of opaque provider credentials.
///
/// The order is the order in which credentials are attempted. Duplicates are
/// dropped on construction, keeping the first occurrence, so a single fetch
/// never spends two attempts on the same key. Blank entries are ignored.
///
/// # Examples
///
/// ```
/// use air_quality_monitor::CredentialList;
///
/// let keys = CredentialList::new(["key-a", "key-b", "key-a"]).unwrap();
/// assert_eq!(keys.len(), 2);
/// assert_eq!(keys.iter().collect::<Vec<_>>(), ["key-a", "key-b"]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialList {
    credentials: Vec<String>,
}

impl CredentialList {
    /// Builds a credential list, de-duplicating while preserving first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::EmptyCredentialList`] when no non-blank credential remains.
    pub fn new<I, S>(credentials: I) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for credential in credentials {
            let credential = credential.into().trim().to_string();
            if credential.is_empty() || unique.contains(&credential) {
                continue;
            }
            unique.push(credential);
        }
        if unique.is_empty() {
            return Err(FetchError::EmptyCredentialList);
        }
        Ok(Self {
            credentials: unique,
        })
    }

    /// Parses a comma separated list, as found in environment variables.
    pub fn from_comma_separated(raw: &str) -> Result<Self, FetchError> {
        Self::new(raw.split(','))
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// A constructed list holds at least one credential, so this is `false`.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.credentials.iter().map(String::as_str)
    }
}

// Keys never end up in logs.
impl fmt::Debug for CredentialList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialList({} credentials)", self.credentials.len())
    }
}

impl<'de> Deserialize<'de> for CredentialList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        CredentialList::new(raw).map_err(serde::de::Error::custom)
    }
}
