//! Core types for the social graph.

pub mod person;
pub mod group;
pub mod relation;
pub mod stats;

pub use person::{Person, Sex, ValidationError};
pub use group::Group;
pub use relation::{Relation, Connection, Subscription};
pub use stats::{NameAge, NameCount, NameAverage, UserPosts};
