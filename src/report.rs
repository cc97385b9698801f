//! Whole-network summary built from the argument-free read queries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::GraphStore;
use crate::types::{NameAge, NameAverage, NameCount};

/// Snapshot of every global statistic the store can answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    /// All user names, ascending.
    pub names: Vec<String>,
    /// Male users, oldest first.
    pub males_by_age: Vec<NameAge>,
    /// Friend count per user with friends.
    pub user_info: Vec<NameCount>,
    /// All group names, ascending.
    pub groups: Vec<String>,
    /// Subscriber count per group, largest first.
    pub subscribers: Vec<NameCount>,
    /// Subscription count per user, largest first.
    pub persons_with_groups: Vec<NameCount>,
    /// Mean post length per user, longest first.
    pub posts_stat: Vec<NameAverage>,
    /// Post count per user, largest first.
    pub users_by_posts: Vec<NameCount>,
}

impl NetworkReport {
    /// Run each global query once against `store`.
    pub async fn collect<S>(store: &S) -> Result<Self, S::Error>
    where
        S: GraphStore + ?Sized,
    {
        let report = Self {
            names: store.get_names().await?,
            males_by_age: store.get_males_ordered_by_age().await?,
            user_info: store.get_user_info().await?,
            groups: store.get_groups().await?,
            subscribers: store.get_count_of_subscribers().await?,
            persons_with_groups: store.get_persons_with_groups().await?,
            posts_stat: store.get_posts_stat().await?,
            users_by_posts: store.get_users_stat_by_posts().await?,
        };
        tracing::debug!(
            users = report.names.len(),
            groups = report.groups.len(),
            "Network report collected"
        );
        Ok(report)
    }

    /// Total SUBSCRIBE edges, as seen from the group side.
    pub fn total_subscriptions(&self) -> u64 {
        self.subscribers.iter().map(|r| r.count).sum()
    }

    /// Render with every statistic in single-key mapping form.
    pub fn to_json(&self) -> Value {
        fn pairs<T>(records: &[T], pair: impl Fn(&T) -> Map<String, Value>) -> Value {
            Value::Array(records.iter().map(|r| Value::Object(pair(r))).collect())
        }

        serde_json::json!({
            "names": self.names,
            "males_by_age": pairs(&self.males_by_age, NameAge::to_pair),
            "user_info": pairs(&self.user_info, NameCount::to_pair),
            "groups": self.groups,
            "subscribers": pairs(&self.subscribers, NameCount::to_pair),
            "persons_with_groups": pairs(&self.persons_with_groups, NameCount::to_pair),
            "posts_stat": pairs(&self.posts_stat, NameAverage::to_pair),
            "users_by_posts": pairs(&self.users_by_posts, NameCount::to_pair),
        })
    }
}
