//! # social-graph-store
//!
//! Data-access layer over a graph database modeling a social network:
//! users, groups, `KNOWS` friendships and `SUBSCRIBE` memberships, plus a
//! fixed set of analytical read queries.
//!
//! ## Core Contract
//!
//! 1. Writes are merges: users and groups are keyed by name, edges by
//!    their endpoints, so every write can be repeated safely
//! 2. A friendship is stored as two directed `KNOWS` edges
//! 3. Reads are single queries; unknown names give empty results
//!
//! ## Architecture
//!
//! ```text
//! caller → GraphStore → backend (Memory | Postgres | Neo4j) → result records
//!              ↑
//!       SocialGraphSeed / NetworkReport
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Name lists are ascending
//! - Ranked lists break ties on name ascending
//! - Posts keep authored order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod seed;
pub mod report;

// Re-exports
pub use types::{
    Person, Sex, ValidationError, Group, Relation, Connection, Subscription,
    NameAge, NameCount, NameAverage, UserPosts,
};
pub use store::{GraphStore, InMemoryGraphStore};
pub use store::memory::InMemoryError;
#[cfg(feature = "postgres")]
pub use store::PostgresGraphStore;
#[cfg(feature = "postgres")]
pub use store::postgres::{PostgresConfig, PostgresError};
#[cfg(feature = "neo4j")]
pub use store::Neo4jGraphStore;
#[cfg(feature = "neo4j")]
pub use store::neo4j::{Neo4jConfig, Neo4jError, DEFAULT_NEO4J_URI};
pub use seed::{SocialGraphSeed, SeedError};
pub use report::NetworkReport;

/// Label of user nodes.
pub const USER_LABEL: &str = "User";

/// Label of group nodes.
pub const GROUP_LABEL: &str = "Group";
