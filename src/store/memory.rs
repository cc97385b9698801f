//! In-memory graph store.
//!
//! Reference implementation of the query semantics, used by tests and
//! benchmarks. Uses BTreeMap/BTreeSet so iteration is already ordered by
//! name, and a single `RwLock` so each write is applied atomically.

use std::collections::{BTreeMap, BTreeSet};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{
    Connection, NameAge, NameAverage, NameCount, Person, Relation, Sex, UserPosts,
    ValidationError,
};
use crate::types::group::Group;
use crate::types::stats::sort_desc_then_name;
use super::GraphStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemoryError {
    /// Entity rejected before it was written.
    #[error("Invalid entity: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Default)]
struct Graph {
    /// Users by name.
    users: BTreeMap<String, Person>,
    /// Group names.
    groups: BTreeSet<String>,
    /// KNOWS source -> targets.
    knows_out: BTreeMap<String, BTreeSet<String>>,
    /// KNOWS target -> sources.
    knows_in: BTreeMap<String, BTreeSet<String>>,
    /// User -> subscribed groups.
    subscriptions: BTreeMap<String, BTreeSet<String>>,
    /// Group -> subscribing users.
    subscribers: BTreeMap<String, BTreeSet<String>>,
}

impl Graph {
    fn merge_knows(&mut self, from: &str, to: &str) -> bool {
        let inserted = self
            .knows_out
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.knows_in
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
        inserted
    }

    fn friends_of(&self, name: &str) -> impl Iterator<Item = &String> {
        self.knows_in.get(name).into_iter().flatten()
    }

    /// Every `(friend, friend_of_friend)` pair on a path
    /// `name <- friend <- friend_of_friend`, in name order.
    ///
    /// A path may not traverse the same edge twice, which only matters for
    /// a self loop on `name`.
    fn two_hop_paths<'a>(&'a self, name: &'a str) -> Vec<(&'a str, &'a str)> {
        if !self.users.contains_key(name) {
            return Vec::new();
        }
        let mut paths = Vec::new();
        for friend in self.friends_of(name) {
            for fof in self.friends_of(friend) {
                if fof == friend && friend == name {
                    continue;
                }
                paths.push((friend.as_str(), fof.as_str()));
            }
        }
        paths
    }
}

/// In-memory graph store.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    graph: RwLock<Graph>,
}

impl InMemoryGraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of users.
    pub fn num_users(&self) -> usize {
        self.graph.read().users.len()
    }

    /// Get number of groups.
    pub fn num_groups(&self) -> usize {
        self.graph.read().groups.len()
    }

    /// Get number of directed KNOWS edges.
    pub fn num_knows_edges(&self) -> usize {
        self.graph.read().knows_out.values().map(BTreeSet::len).sum()
    }

    /// Get number of SUBSCRIBE edges.
    pub fn num_subscriptions(&self) -> usize {
        self.graph.read().subscriptions.values().map(BTreeSet::len).sum()
    }

    /// Look up a user by name.
    pub fn person(&self, name: &str) -> Option<Person> {
        self.graph.read().users.get(name).cloned()
    }

    /// Remove every node and edge.
    pub fn clear(&self) {
        *self.graph.write() = Graph::default();
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    type Error = InMemoryError;

    async fn add_person(&self, person: &Person) -> Result<(), Self::Error> {
        person.validate()?;
        let replaced = self
            .graph
            .write()
            .users
            .insert(person.name.clone(), person.clone())
            .is_some();
        tracing::debug!(name = %person.name, replaced, "Merged user");
        Ok(())
    }

    async fn add_group(&self, name: &str) -> Result<(), Self::Error> {
        Group::new(name).validate()?;
        let created = self.graph.write().groups.insert(name.to_string());
        tracing::debug!(name, created, "Merged group");
        Ok(())
    }

    async fn add_connection(&self, first: &str, second: &str) -> Result<(), Self::Error> {
        let mut graph = self.graph.write();
        if !graph.users.contains_key(first) || !graph.users.contains_key(second) {
            tracing::debug!(first, second, "Connection skipped, user missing");
            return Ok(());
        }
        let mut created = false;
        for (from, to) in Connection::new(first, second).directed_edges() {
            created |= graph.merge_knows(from, to);
        }
        tracing::debug!(
            first,
            second,
            created,
            relation = %Relation::Knows,
            "Merged edge"
        );
        Ok(())
    }

    async fn add_subscriber(&self, user_name: &str, group_name: &str) -> Result<(), Self::Error> {
        let mut graph = self.graph.write();
        if !graph.users.contains_key(user_name) || !graph.groups.contains(group_name) {
            tracing::debug!(user_name, group_name, "Subscription skipped, endpoint missing");
            return Ok(());
        }
        let created = graph
            .subscriptions
            .entry(user_name.to_string())
            .or_default()
            .insert(group_name.to_string());
        graph
            .subscribers
            .entry(group_name.to_string())
            .or_default()
            .insert(user_name.to_string());
        tracing::debug!(
            user_name,
            group_name,
            created,
            relation = %Relation::Subscribe,
            "Merged edge"
        );
        Ok(())
    }

    async fn get_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.graph.read().users.keys().cloned().collect())
    }

    async fn get_males_ordered_by_age(&self) -> Result<Vec<NameAge>, Self::Error> {
        let mut males: Vec<NameAge> = self
            .graph
            .read()
            .users
            .values()
            .filter(|p| p.sex == Sex::Male)
            .map(|p| NameAge::new(p.name.clone(), p.age))
            .collect();
        sort_desc_then_name(&mut males, |r| r.age, |r| r.name.as_str());
        Ok(males)
    }

    async fn get_person_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        let graph = self.graph.read();
        if !graph.users.contains_key(name) {
            return Ok(Vec::new());
        }
        Ok(graph.friends_of(name).cloned().collect())
    }

    async fn get_friends_of_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        let graph = self.graph.read();
        let mut names: Vec<String> = graph
            .two_hop_paths(name)
            .into_iter()
            .map(|(_, fof)| fof.to_string())
            .collect();
        names.sort();
        tracing::trace!(name, count = names.len(), "Friends of friends");
        Ok(names)
    }

    async fn get_user_info(&self) -> Result<Vec<NameCount>, Self::Error> {
        let graph = self.graph.read();
        Ok(graph
            .knows_in
            .iter()
            .filter(|(name, sources)| !sources.is_empty() && graph.users.contains_key(*name))
            .map(|(name, sources)| NameCount::new(name.clone(), sources.len() as u64))
            .collect())
    }

    async fn get_groups(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.graph.read().groups.iter().cloned().collect())
    }

    async fn get_groups_of_person(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .graph
            .read()
            .subscriptions
            .get(name)
            .map(|groups| groups.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_count_of_subscribers(&self) -> Result<Vec<NameCount>, Self::Error> {
        let mut counts: Vec<NameCount> = self
            .graph
            .read()
            .subscribers
            .iter()
            .filter(|(_, users)| !users.is_empty())
            .map(|(group, users)| NameCount::new(group.clone(), users.len() as u64))
            .collect();
        sort_desc_then_name(&mut counts, |r| r.count, |r| r.name.as_str());
        Ok(counts)
    }

    async fn get_persons_with_groups(&self) -> Result<Vec<NameCount>, Self::Error> {
        let mut counts: Vec<NameCount> = self
            .graph
            .read()
            .subscriptions
            .iter()
            .filter(|(_, groups)| !groups.is_empty())
            .map(|(user, groups)| NameCount::new(user.clone(), groups.len() as u64))
            .collect();
        sort_desc_then_name(&mut counts, |r| r.count, |r| r.name.as_str());
        Ok(counts)
    }

    async fn get_count_of_friends_groups(&self, name: &str) -> Result<u64, Self::Error> {
        let graph = self.graph.read();
        let total = graph
            .two_hop_paths(name)
            .into_iter()
            .map(|(_, fof)| graph.subscriptions.get(fof).map_or(0, BTreeSet::len) as u64)
            .sum();
        Ok(total)
    }

    async fn get_user_posts(&self, name: &str) -> Result<Vec<Vec<String>>, Self::Error> {
        let graph = self.graph.read();
        let mut posts = Vec::new();
        if let Some(person) = graph.users.get(name) {
            posts.push(person.posts.clone());
        }
        if graph.groups.contains(name) {
            posts.push(Vec::new());
        }
        Ok(posts)
    }

    async fn get_posts_stat(&self) -> Result<Vec<NameAverage>, Self::Error> {
        let mut stats: Vec<NameAverage> = self
            .graph
            .read()
            .users
            .values()
            .map(|p| NameAverage::new(p.name.clone(), p.average_post_length()))
            .collect();
        sort_desc_then_name(&mut stats, |r| r.average, |r| r.name.as_str());
        Ok(stats)
    }

    async fn get_posts_more_than(&self, length: i64) -> Result<Vec<UserPosts>, Self::Error> {
        Ok(self
            .graph
            .read()
            .users
            .values()
            .map(|p| UserPosts::new(p.name.clone(), p.posts_longer_than(length)))
            .collect())
    }

    async fn get_users_stat_by_posts(&self) -> Result<Vec<NameCount>, Self::Error> {
        let mut counts: Vec<NameCount> = self
            .graph
            .read()
            .users
            .values()
            .map(|p| NameCount::new(p.name.clone(), p.posts.len() as u64))
            .collect();
        sort_desc_then_name(&mut counts, |r| r.count, |r| r.name.as_str());
        Ok(counts)
    }

    async fn get_friends_friends_posts_by_given_p(
        &self,
        name: &str,
    ) -> Result<Vec<UserPosts>, Self::Error> {
        let graph = self.graph.read();
        let mut posts: Vec<UserPosts> = graph
            .two_hop_paths(name)
            .into_iter()
            .filter_map(|(_, fof)| graph.users.get(fof))
            .map(|p| UserPosts::new(p.name.clone(), p.posts.clone()))
            .collect();
        // Stable: paths reaching the same user keep their traversal order
        posts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn triangle_store() -> InMemoryGraphStore {
        let store = InMemoryGraphStore::new();
        for (name, sex, age) in [("Ann", Sex::Female, 30), ("Ben", Sex::Male, 40), ("Cid", Sex::Male, 40)] {
            store.add_person(&Person::new(name, sex, age, [format!("{name} here")])).await.unwrap();
        }
        store.add_connection("Ann", "Ben").await.unwrap();
        store.add_connection("Ben", "Cid").await.unwrap();
        store.add_connection("Cid", "Ann").await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_add_person_is_upsert_by_name() {
        let store = InMemoryGraphStore::new();
        store.add_person(&Person::new("Alex", Sex::Male, 23, ["a"])).await.unwrap();
        store.add_person(&Person::new("Alex", Sex::Male, 24, ["a", "b"])).await.unwrap();

        assert_eq!(store.num_users(), 1);
        let alex = store.person("Alex").unwrap();
        assert_eq!(alex.age, 24);
        assert_eq!(alex.posts.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_names_rejected() {
        let store = InMemoryGraphStore::new();
        let err = store.add_group("").await.unwrap_err();
        assert_eq!(err, InMemoryError::Invalid(ValidationError::EmptyName { label: crate::GROUP_LABEL }));
        assert_eq!(store.num_groups(), 0);
    }

    #[tokio::test]
    async fn test_connection_requires_both_users() {
        let store = InMemoryGraphStore::new();
        store.add_person(&Person::new("Alex", Sex::Male, 23, ["a"])).await.unwrap();
        store.add_connection("Alex", "Ghost").await.unwrap();

        assert_eq!(store.num_knows_edges(), 0);
        assert!(store.get_person_friends("Alex").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_is_idempotent() {
        let store = triangle_store().await;
        assert_eq!(store.num_knows_edges(), 6);
        store.add_connection("Ben", "Ann").await.unwrap();
        assert_eq!(store.num_knows_edges(), 6);
    }

    #[tokio::test]
    async fn test_self_connection_does_not_reuse_edge() {
        let store = InMemoryGraphStore::new();
        store.add_person(&Person::new("Solo", Sex::Male, 50, ["x"])).await.unwrap();
        store.add_connection("Solo", "Solo").await.unwrap();

        assert_eq!(store.num_knows_edges(), 1);
        assert_eq!(store.get_person_friends("Solo").await.unwrap(), vec!["Solo"]);
        // The only two-hop path would traverse the single loop edge twice
        assert!(store.get_friends_of_friends("Solo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_triangle_friends_of_friends_include_origin() {
        let store = triangle_store().await;
        // Ann <- Ben <- {Ann, Cid}, Ann <- Cid <- {Ann, Ben}
        assert_eq!(
            store.get_friends_of_friends("Ann").await.unwrap(),
            vec!["Ann", "Ann", "Ben", "Cid"]
        );
    }

    #[tokio::test]
    async fn test_ties_break_on_name() {
        let store = triangle_store().await;
        let males = store.get_males_ordered_by_age().await.unwrap();
        assert_eq!(males, vec![NameAge::new("Ben", 40), NameAge::new("Cid", 40)]);
    }

    #[tokio::test]
    async fn test_subscriber_requires_group() {
        let store = triangle_store().await;
        store.add_subscriber("Ann", "missing").await.unwrap();
        assert_eq!(store.num_subscriptions(), 0);

        store.add_group("rust").await.unwrap();
        store.add_subscriber("Ann", "rust").await.unwrap();
        store.add_subscriber("Ann", "rust").await.unwrap();
        assert_eq!(store.num_subscriptions(), 1);
        assert_eq!(store.get_groups_of_person("Ann").await.unwrap(), vec!["rust"]);
    }

    #[tokio::test]
    async fn test_user_posts_matches_groups_too() {
        let store = triangle_store().await;
        store.add_group("Ann").await.unwrap();
        let posts = store.get_user_posts("Ann").await.unwrap();
        assert_eq!(posts, vec![vec!["Ann here".to_string()], Vec::new()]);
    }

    #[tokio::test]
    async fn test_count_of_friends_groups_is_zero_for_unknown() {
        let store = triangle_store().await;
        assert_eq!(store.get_count_of_friends_groups("Nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = triangle_store().await;
        store.clear();
        assert_eq!(store.num_users(), 0);
        assert_eq!(store.num_knows_edges(), 0);
        assert!(store.get_user_info().await.unwrap().is_empty());
    }
}
