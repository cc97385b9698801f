//! Relationship types between users and groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship kinds stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Friendship, materialized as one directed edge per direction.
    Knows,
    /// User follows a group.
    Subscribe,
}

impl Relation {
    /// Relationship type name as used in graph queries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Knows => "KNOWS",
            Self::Subscribe => "SUBSCRIBE",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A requested friendship between two users.
///
/// Order does not matter: storing it creates both `first -> second`
/// and `second -> first`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// One side of the friendship.
    pub first: String,
    /// The other side.
    pub second: String,
}

impl Connection {
    /// Create a new connection request.
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// The two directed KNOWS edges this connection materializes.
    ///
    /// A self connection yields the same edge twice.
    pub fn directed_edges(&self) -> [(&str, &str); 2] {
        [
            (self.first.as_str(), self.second.as_str()),
            (self.second.as_str(), self.first.as_str()),
        ]
    }
}

/// A user subscribing to a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscribing user.
    pub user: String,
    /// Target group.
    pub group: String,
}

impl Subscription {
    /// Create a new subscription.
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_is_materialized_both_ways() {
        let conn = Connection::new("Alex", "Megan");
        assert_eq!(conn.directed_edges(), [("Alex", "Megan"), ("Megan", "Alex")]);
    }

    #[test]
    fn test_relation_labels() {
        assert_eq!(Relation::Knows.to_string(), "KNOWS");
        assert_eq!(Relation::Subscribe.label(), "SUBSCRIBE");
    }
}
