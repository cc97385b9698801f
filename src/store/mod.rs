//! Graph storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "neo4j")]
pub mod neo4j;

use async_trait::async_trait;
use crate::types::{NameAge, NameAverage, NameCount, Person, UserPosts};

/// Data-access contract for the social graph.
///
/// Writes are merges: repeating any of them leaves the graph unchanged.
/// Reads return a freshly computed projection and never fail on unknown
/// names; they yield an empty result instead. Every ordered read breaks
/// ties on name ascending so results are identical across backends.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    // ── writes ──────────────────────────────────────────────────────────

    /// Upsert a user keyed on `name`, replacing sex, age and posts.
    async fn add_person(&self, person: &Person) -> Result<(), Self::Error>;

    /// Upsert a group keyed on `name`.
    async fn add_group(&self, name: &str) -> Result<(), Self::Error>;

    /// Merge KNOWS in both directions between two existing users.
    ///
    /// No-op when either user does not exist.
    async fn add_connection(&self, first: &str, second: &str) -> Result<(), Self::Error>;

    /// Merge a SUBSCRIBE edge from an existing user to an existing group.
    ///
    /// No-op when either endpoint does not exist.
    async fn add_subscriber(&self, user_name: &str, group_name: &str) -> Result<(), Self::Error>;

    // ── reads ───────────────────────────────────────────────────────────

    /// All user names, ascending.
    async fn get_names(&self) -> Result<Vec<String>, Self::Error>;

    /// Male users with their age, oldest first.
    async fn get_males_ordered_by_age(&self) -> Result<Vec<NameAge>, Self::Error>;

    /// Names with a KNOWS edge into `name`, ascending.
    async fn get_person_friends(&self, name: &str) -> Result<Vec<String>, Self::Error>;

    /// Names two KNOWS hops away from `name`, ascending.
    ///
    /// Not deduplicated, and includes `name` itself when a path leads back.
    async fn get_friends_of_friends(&self, name: &str) -> Result<Vec<String>, Self::Error>;

    /// Incoming KNOWS count for every user that has at least one, by name.
    async fn get_user_info(&self) -> Result<Vec<NameCount>, Self::Error>;

    /// All group names, ascending.
    async fn get_groups(&self) -> Result<Vec<String>, Self::Error>;

    /// Groups `name` subscribes to, ascending.
    async fn get_groups_of_person(&self, name: &str) -> Result<Vec<String>, Self::Error>;

    /// Subscriber count per group with at least one subscriber, largest first.
    async fn get_count_of_subscribers(&self) -> Result<Vec<NameCount>, Self::Error>;

    /// Subscribed-group count per user with at least one, largest first.
    async fn get_persons_with_groups(&self) -> Result<Vec<NameCount>, Self::Error>;

    /// Total subscriptions held by users two KNOWS hops away from `name`.
    ///
    /// Counted per path, so a user reached twice is counted twice. The
    /// underlying aggregate always yields exactly one row; this is that
    /// row's value, so `[2]` in row form is `2` here and no match is `0`.
    async fn get_count_of_friends_groups(&self, name: &str) -> Result<u64, Self::Error>;

    /// Posts of every node named `name` (users or groups), users first.
    ///
    /// Nodes without a `posts` property (groups) contribute an empty list
    /// where the graph engine itself would return null.
    async fn get_user_posts(&self, name: &str) -> Result<Vec<Vec<String>>, Self::Error>;

    /// Integer mean post length per user (total characters divided by post
    /// count, truncated), longest first. Users without posts report `0`.
    async fn get_posts_stat(&self) -> Result<Vec<NameAverage>, Self::Error>;

    /// For every user (by name), their posts longer than `length` characters.
    async fn get_posts_more_than(&self, length: i64) -> Result<Vec<UserPosts>, Self::Error>;

    /// Post count per user, largest first.
    async fn get_users_stat_by_posts(&self) -> Result<Vec<NameCount>, Self::Error>;

    /// Posts of every user two KNOWS hops away from `name`, one entry per path.
    async fn get_friends_friends_posts_by_given_p(
        &self,
        name: &str,
    ) -> Result<Vec<UserPosts>, Self::Error>;
}

#[async_trait]
impl<S: GraphStore + ?Sized> GraphStore for std::sync::Arc<S> {
    type Error = S::Error;

    async fn add_person(&self, person: &Person) -> Result<(), Self::Error> {
        (**self).add_person(person).await
    }

    async fn add_group(&self, name: &str) -> Result<(), Self::Error> {
        (**self).add_group(name).await
    }

    async fn add_connection(&self, first: &str, second: &str) -> Result<(), Self::Error> {
        (**self).add_connection(first, second).await
    }

    async fn add_subscriber(&self, user_name: &str, group_name: &str) -> Result<(), Self::Error> {
        (**self).add_subscriber(user_name, group_name).await
    }

    async fn get_names(&self) -> Result<Vec<String>, Self::Error> {
        (**self).get_names().await
    }

    async fn get_males_ordered_by_age(&self) -> Result<Vec<NameAge>, Self::Error> {
        (**self).get_males_ordered_by_age().await
    }

    async fn get_person_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        (**self).get_person_friends(name).await
    }

    async fn get_friends_of_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        (**self).get_friends_of_friends(name).await
    }

    async fn get_user_info(&self) -> Result<Vec<NameCount>, Self::Error> {
        (**self).get_user_info().await
    }

    async fn get_groups(&self) -> Result<Vec<String>, Self::Error> {
        (**self).get_groups().await
    }

    async fn get_groups_of_person(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        (**self).get_groups_of_person(name).await
    }

    async fn get_count_of_subscribers(&self) -> Result<Vec<NameCount>, Self::Error> {
        (**self).get_count_of_subscribers().await
    }

    async fn get_persons_with_groups(&self) -> Result<Vec<NameCount>, Self::Error> {
        (**self).get_persons_with_groups().await
    }

    async fn get_count_of_friends_groups(&self, name: &str) -> Result<u64, Self::Error> {
        (**self).get_count_of_friends_groups(name).await
    }

    async fn get_user_posts(&self, name: &str) -> Result<Vec<Vec<String>>, Self::Error> {
        (**self).get_user_posts(name).await
    }

    async fn get_posts_stat(&self) -> Result<Vec<NameAverage>, Self::Error> {
        (**self).get_posts_stat().await
    }

    async fn get_posts_more_than(&self, length: i64) -> Result<Vec<UserPosts>, Self::Error> {
        (**self).get_posts_more_than(length).await
    }

    async fn get_users_stat_by_posts(&self) -> Result<Vec<NameCount>, Self::Error> {
        (**self).get_users_stat_by_posts().await
    }

    async fn get_friends_friends_posts_by_given_p(
        &self,
        name: &str,
    ) -> Result<Vec<UserPosts>, Self::Error> {
        (**self).get_friends_friends_posts_by_given_p(name).await
    }
}

pub use memory::InMemoryGraphStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresGraphStore;

#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraphStore;
