//! Result records returned by the analytical read queries.
//!
//! Each record has a `to_pair()` helper producing the single-key mapping
//! shape (`{name: value}`) consumers of the query layer expect.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user name paired with the user's age.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameAge {
    /// User name.
    pub name: String,
    /// Age in years.
    pub age: u32,
}

impl NameAge {
    /// Create a new record.
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self { name: name.into(), age }
    }

    /// Render as `{name: age}`.
    pub fn to_pair(&self) -> Map<String, Value> {
        single(&self.name, Value::from(self.age))
    }
}

/// A user or group name paired with a count.
///
/// Used for friend counts, subscriber counts, subscription counts and
/// post counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameCount {
    /// User or group name.
    pub name: String,
    /// Aggregated count.
    pub count: u64,
}

impl NameCount {
    /// Create a new record.
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self { name: name.into(), count }
    }

    /// Render as `{name: count}`.
    pub fn to_pair(&self) -> Map<String, Value> {
        single(&self.name, Value::from(self.count))
    }
}

/// A user name paired with the mean character length of their posts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameAverage {
    /// User name.
    pub name: String,
    /// Integer mean post length (truncated); `0` for users without posts.
    pub average: u64,
}

impl NameAverage {
    /// Create a new record.
    pub fn new(name: impl Into<String>, average: u64) -> Self {
        Self { name: name.into(), average }
    }

    /// Render as `{name: average}`.
    pub fn to_pair(&self) -> Map<String, Value> {
        single(&self.name, Value::from(self.average))
    }
}

/// A user name paired with a list of that user's posts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPosts {
    /// User name.
    pub name: String,
    /// Posts in authored order.
    pub posts: Vec<String>,
}

impl UserPosts {
    /// Create a new record.
    pub fn new(name: impl Into<String>, posts: Vec<String>) -> Self {
        Self { name: name.into(), posts }
    }

    /// Render as `{name: [posts...]}`.
    pub fn to_pair(&self) -> Map<String, Value> {
        single(&self.name, Value::from(self.posts.clone()))
    }
}

fn single(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    map
}

/// Sort `(name, key)` records by key descending, then name ascending.
pub(crate) fn sort_desc_then_name<T, K: PartialOrd>(
    records: &mut [T],
    key: impl Fn(&T) -> K,
    name: impl Fn(&T) -> &str,
) {
    records.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| name(a).cmp(name(b)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs_render_single_key() {
        assert_eq!(Value::Object(NameAge::new("Alex", 23).to_pair()), json!({"Alex": 23}));
        assert_eq!(Value::Object(NameCount::new("test1", 2).to_pair()), json!({"test1": 2}));
        assert_eq!(
            Value::Object(UserPosts::new("Bob", vec!["wtf".into()]).to_pair()),
            json!({"Bob": ["wtf"]})
        );
    }

    #[test]
    fn test_sort_desc_then_name() {
        let mut records = vec![
            NameCount::new("b", 1),
            NameCount::new("c", 2),
            NameCount::new("a", 1),
        ];
        sort_desc_then_name(&mut records, |r| r.count, |r| r.name.as_str());
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
