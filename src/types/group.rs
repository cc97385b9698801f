//! Group node type.

use serde::{Deserialize, Serialize};

use super::person::{validate_name, ValidationError};

/// A group users can subscribe to. Identity is the `name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Group {
    /// Unique group name.
    pub name: String,
}

impl Group {
    /// Create a new group.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Reject groups that cannot be stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(crate::GROUP_LABEL, &self.name)
    }
}

impl From<&str> for Group {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
