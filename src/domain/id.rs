//! Task identifiers
//!
//! ID Format:
//! - Declared IDs: any non-empty token without whitespace (e.g., `setup-db`, `T3`)
//! - Derived IDs: `t-{7-char-hash}` (e.g., `t-9d3e5f2`), used when a task
//!   record arrives without an ID
//!
//! Derived hashes come from the task title only, so re-planning an unchanged
//! task list yields the same IDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Task ID must not be empty")]
    Empty,

    #[error("Invalid task ID '{0}': IDs must not contain whitespace")]
    Whitespace(String),
}

/// Generates a 7-character hash from a title
fn generate_hash(title: &str) -> String {
    let normalized = title.trim().to_lowercase();
    let hash = blake3::hash(normalized.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Stable unique key of a task within one planning run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Derives an ID from a task title: `t-{hash}`
    pub fn from_title(title: &str) -> Self {
        Self(format!("t-{}", generate_hash(title)))
    }

    /// Returns the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&str> for TaskId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
