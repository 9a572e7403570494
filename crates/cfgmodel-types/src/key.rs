use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Name-based identity of a configuration entry.
///
/// Two keys are equal iff their names are equal, and the hash is derived from
/// the name alone. A key never changes after construction; stores and callers
/// clone it freely.
///
/// `ConfigKey` derefs and borrows as `str`, so maps keyed by `ConfigKey` can be
/// queried with a plain `&str` and `&key` can be passed wherever `&str` is
/// expected.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Create a key from any name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Create a key from user input, rejecting empty names and names that
    /// contain whitespace.
    pub fn parse(name: &str) -> TypeResult<Self> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidKey(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// The key name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigKey({:?})", self.0)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for ConfigKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ConfigKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConfigKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ConfigKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}
