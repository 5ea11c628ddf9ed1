//! Validated cluster identifiers.
//!
//! Cluster names address per-cluster state in the status store, so they are
//! validated once at the boundary and carried as a typed value afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a cluster name, in characters.
pub const MAX_CLUSTER_NAME_LEN: usize = 60;

/// A validated cluster name.
///
/// Names start with an ASCII letter, continue with ASCII alphanumerics or
/// hyphens, and are at most [`MAX_CLUSTER_NAME_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterName(String);

impl ClusterName {
    /// Create a cluster name, validating the naming rules.
    ///
    /// # Errors
    ///
    /// Returns a [`ClusterNameError`] describing the violated rule.
    pub fn new(name: impl Into<String>) -> Result<Self, ClusterNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClusterNameError::Empty);
        }
        if name.len() > MAX_CLUSTER_NAME_LEN {
            return Err(ClusterNameError::TooLong(name.len()));
        }
        let mut chars = name.chars();
        // Always present: the name is non-empty.
        if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(ClusterNameError::InvalidStart(name));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ClusterNameError::InvalidCharacter(name));
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClusterName {
    type Err = ClusterNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClusterName {
    type Error = ClusterNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClusterName> for String {
    fn from(name: ClusterName) -> Self {
        name.0
    }
}

impl AsRef<str> for ClusterName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error returned for an invalid cluster name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterNameError {
    /// The name was empty.
    #[error("cluster name must not be empty")]
    Empty,

    /// The name exceeded [`MAX_CLUSTER_NAME_LEN`] characters.
    #[error("cluster name is {0} characters, maximum is {MAX_CLUSTER_NAME_LEN}")]
    TooLong(usize),

    /// The name did not start with an ASCII letter.
    #[error("cluster name must start with a letter: {0}")]
    InvalidStart(String),

    /// The name contained a character outside `[A-Za-z0-9-]`.
    #[error("cluster name may only contain letters, digits and hyphens: {0}")]
    InvalidCharacter(String),
}
