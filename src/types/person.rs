//! User node types for the social graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error raised when an entity fails validation before reaching a backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A user or group name was empty (or only whitespace).
    #[error("{label} name must not be empty")]
    EmptyName {
        /// Node label the name belongs to ("User" or "Group").
        label: &'static str,
    },
    /// A stored sex code could not be parsed.
    #[error("unknown sex code: {0:?}")]
    UnknownSex(String),
}

/// Sex of a user, stored as a one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Stored as `"m"`.
    #[serde(rename = "m")]
    Male,
    /// Stored as `"f"`.
    #[serde(rename = "f")]
    Female,
}

impl Sex {
    /// Parse a sex code (`"m"` / `"f"`, case-insensitive).
    pub fn from_code(s: &str) -> Result<Self, ValidationError> {
        match s.to_lowercase().as_str() {
            "m" | "male" => Ok(Self::Male),
            "f" | "female" => Ok(Self::Female),
            _ => Err(ValidationError::UnknownSex(s.to_string())),
        }
    }

    /// The code persisted in the backend.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "m",
            Self::Female => "f",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A user of the social network.
///
/// Identity is the `name`: writing a person whose name already exists
/// replaces `sex`, `age` and `posts` on the existing node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    /// Unique user name.
    pub name: String,
    /// Sex code.
    pub sex: Sex,
    /// Age in years.
    pub age: u32,
    /// Posts in authored order.
    #[serde(default)]
    pub posts: Vec<String>,
}

impl Person {
    /// Create a new person.
    pub fn new(
        name: impl Into<String>,
        sex: Sex,
        age: u32,
        posts: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            sex,
            age,
            posts: posts.into_iter().map(Into::into).collect(),
        }
    }

    /// Reject persons that cannot be stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(crate::USER_LABEL, &self.name)
    }

    /// Truncated mean post length in characters; `0` when the person has no posts.
    pub fn average_post_length(&self) -> u64 {
        average_post_length(&self.posts)
    }

    /// Posts strictly longer than `threshold` characters, in authored order.
    pub fn posts_longer_than(&self, threshold: i64) -> Vec<String> {
        posts_longer_than(&self.posts, threshold)
    }
}

/// Reject empty names for the given node label.
pub fn validate_name(label: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName { label });
    }
    Ok(())
}

/// Length of a post as the graph engine counts it (characters, not bytes).
pub fn post_length(post: &str) -> usize {
    post.chars().count()
}

/// Integer mean post length, truncated toward zero like the engine's
/// integer division. An empty post list averages to `0`.
pub fn average_post_length(posts: &[String]) -> u64 {
    if posts.is_empty() {
        return 0;
    }
    let total: usize = posts.iter().map(|p| post_length(p)).sum();
    (total / posts.len()) as u64
}

/// Keep posts strictly longer than `threshold`, preserving order.
pub fn posts_longer_than(posts: &[String], threshold: i64) -> Vec<String> {
    posts
        .iter()
        .filter(|p| post_length(p) as i64 > threshold)
        .cloned()
        .collect()
}
