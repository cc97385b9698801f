//! Declarative seed data for a social graph.
//!
//! A seed lists people, groups, connections and subscriptions and loads
//! them through the regular write operations, so any backend can be
//! brought to a known state.

use serde::{Deserialize, Serialize};

use crate::store::GraphStore;
use crate::types::{Connection, Person, Sex, Subscription};

/// A write failed while loading a seed.
#[derive(Debug, thiserror::Error)]
#[error("Seeding failed while adding {step}: {source}")]
pub struct SeedError<E: std::error::Error + 'static> {
    /// What was being written.
    pub step: String,
    /// Underlying store error.
    #[source]
    pub source: E,
}

/// Contents of a social graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialGraphSeed {
    /// Users to upsert.
    #[serde(default)]
    pub people: Vec<Person>,
    /// Group names to upsert.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Friendships to merge (both directions).
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// User to group subscriptions to merge.
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl SocialGraphSeed {
    /// Parse a seed from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Three users in a chain, two groups, three subscriptions.
    ///
    /// ```text
    /// Alex <-> Megan <-> Bob
    /// Bob, Megan -> test1      Alex -> test2
    /// ```
    pub fn fixture() -> Self {
        Self {
            people: vec![
                Person::new("Alex", Sex::Male, 23, ["Super test post", "test", "twit"]),
                Person::new("Megan", Sex::Female, 34, ["post", "test_1", ":)"]),
                Person::new("Bob", Sex::Male, 21, ["ahahha:D", "LMFAO", "wtf"]),
            ],
            groups: vec!["test1".to_string(), "test2".to_string()],
            connections: vec![
                Connection::new("Alex", "Megan"),
                Connection::new("Megan", "Bob"),
            ],
            subscriptions: vec![
                Subscription::new("Bob", "test1"),
                Subscription::new("Megan", "test1"),
                Subscription::new("Alex", "test2"),
            ],
        }
    }

    /// Write the seed into `store`.
    ///
    /// Nodes are written before the edges that reference them. Stops at the
    /// first failing write; everything before it stays applied.
    pub async fn apply<S>(&self, store: &S) -> Result<(), SeedError<S::Error>>
    where
        S: GraphStore + ?Sized,
    {
        for person in &self.people {
            store
                .add_person(person)
                .await
                .map_err(|source| store_error(format!("user {}", person.name), source))?;
        }
        for group in &self.groups {
            store
                .add_group(group)
                .await
                .map_err(|source| store_error(format!("group {group}"), source))?;
        }
        for conn in &self.connections {
            store
                .add_connection(&conn.first, &conn.second)
                .await
                .map_err(|source| {
                    store_error(format!("connection {} - {}", conn.first, conn.second), source)
                })?;
        }
        for sub in &self.subscriptions {
            store
                .add_subscriber(&sub.user, &sub.group)
                .await
                .map_err(|source| {
                    store_error(format!("subscription {} -> {}", sub.user, sub.group), source)
                })?;
        }

        tracing::info!(
            people = self.people.len(),
            groups = self.groups.len(),
            connections = self.connections.len(),
            subscriptions = self.subscriptions.len(),
            "Seed applied"
        );
        Ok(())
    }
}

fn store_error<E: std::error::Error + 'static>(step: String, source: E) -> SeedError<E> {
    SeedError { step, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryGraphStore;
    use crate::store::memory::InMemoryError;

    #[test]
    fn test_parse_seed_json() {
        let seed = SocialGraphSeed::from_json(
            r#"{
                "people": [{"name": "Ann", "sex": "f", "age": 30, "posts": ["hi"]}],
                "groups": ["rust"],
                "connections": [],
                "subscriptions": [{"user": "Ann", "group": "rust"}]
            }"#,
        )
        .unwrap();

        assert_eq!(seed.people[0].sex, Sex::Female);
        assert_eq!(seed.groups, vec!["rust"]);
        assert_eq!(seed.subscriptions[0], Subscription::new("Ann", "rust"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed = SocialGraphSeed::from_json(r#"{"groups": ["solo"]}"#).unwrap();
        assert!(seed.people.is_empty());
        assert!(seed.connections.is_empty());
    }

    #[test]
    fn test_fixture_round_trips_through_json() {
        let fixture = SocialGraphSeed::fixture();
        let json = serde_json::to_string(&fixture).unwrap();
        assert_eq!(SocialGraphSeed::from_json(&json).unwrap(), fixture);
    }

    #[tokio::test]
    async fn test_apply_fixture() {
        let store = InMemoryGraphStore::new();
        SocialGraphSeed::fixture().apply(&store).await.unwrap();

        assert_eq!(store.num_users(), 3);
        assert_eq!(store.num_groups(), 2);
        assert_eq!(store.num_knows_edges(), 4);
        assert_eq!(store.num_subscriptions(), 3);
    }

    #[tokio::test]
    async fn test_apply_reports_failing_step() {
        let store = InMemoryGraphStore::new();
        let seed = SocialGraphSeed {
            groups: vec!["ok".to_string(), String::new()],
            ..Default::default()
        };

        let err = seed.apply(&store).await.unwrap_err();
        assert_eq!(err.step, "group ");
        assert!(matches!(err.source, InMemoryError::Invalid(_)));
        // Writes before the failure stay applied
        assert_eq!(store.num_groups(), 1);
    }
}
