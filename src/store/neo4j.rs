//! Neo4j graph store over Bolt.
//!
//! Each operation is one parameterized Cypher statement. Writes run in an
//! explicit transaction; reads run as a single auto-commit query. The
//! engine does all traversal, aggregation and ordering.
//!
//! ## Configuration
//!
//! - `NEO4J_URI`: Bolt endpoint (default: `bolt://localhost:7687`)
//! - `NEO4J_USER`: user name (default: `neo4j`)
//! - `NEO4J_PASSWORD`: password (default: empty)
//! - `NEO4J_MAX_CONNECTIONS`: Bolt connection pool size (default: 16)

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query, Row};

use crate::types::{
    Connection, Group, NameAge, NameAverage, NameCount, Person, Relation, UserPosts,
    ValidationError,
};
use super::GraphStore;

/// Default Bolt endpoint of a local server.
pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";

/// Uniqueness constraints applied by [`Neo4jGraphStore::ensure_schema`].
pub const SCHEMA_CYPHER: [&str; 2] = [
    "CREATE CONSTRAINT user_name IF NOT EXISTS FOR (u:User) REQUIRE u.name IS UNIQUE",
    "CREATE CONSTRAINT group_name IF NOT EXISTS FOR (g:Group) REQUIRE g.name IS UNIQUE",
];

/// Connection settings for a Neo4j server.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// Bolt URI, e.g. `bolt://localhost:7687`.
    pub uri: String,
    /// Authentication user.
    pub user: String,
    /// Authentication password.
    pub password: String,
    /// Maximum pooled Bolt connections (default: 16).
    pub max_connections: usize,
}

impl Neo4jConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            uri: std::env::var("NEO4J_URI").unwrap_or_else(|_| DEFAULT_NEO4J_URI.to_string()),
            user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: std::env::var("NEO4J_PASSWORD").unwrap_or_default(),
            max_connections: std::env::var("NEO4J_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
        }
    }

    /// Environment defaults with an explicit endpoint.
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::from_env()
        }
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Error type for Neo4j store.
#[derive(Debug, thiserror::Error)]
pub enum Neo4jError {
    /// The server was unreachable or rejected the connection.
    #[error("Connection failed: {0}")]
    Connection(#[source] neo4rs::Error),
    /// Query or transaction failed in the engine.
    #[error("Query failed: {0}")]
    Query(#[from] neo4rs::Error),
    /// A result column had an unexpected type.
    #[error("Failed to decode row: {0}")]
    Decode(#[from] neo4rs::DeError),
    /// Entity rejected before it was written.
    #[error("Invalid entity: {0}")]
    Invalid(#[from] ValidationError),
    /// A decoded value is outside the range of its record field.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Neo4j graph store.
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    /// Connect with the given configuration. Fails fast, without retry.
    pub async fn new(config: Neo4jConfig) -> Result<Self, Neo4jError> {
        tracing::info!(
            uri = %config.uri,
            user = %config.user,
            max_connections = config.max_connections,
            "Connecting to Neo4j"
        );

        let bolt_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections)
            .build()
            .map_err(Neo4jError::Connection)?;
        let graph = Graph::connect(bolt_config)
            .await
            .map_err(Neo4jError::Connection)?;

        Ok(Self { graph })
    }

    /// Connect to `uri` with credentials from the environment.
    pub async fn connect(uri: &str) -> Result<Self, Neo4jError> {
        Self::new(Neo4jConfig::with_uri(uri)).await
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, Neo4jError> {
        Self::new(Neo4jConfig::from_env()).await
    }

    /// Create uniqueness constraints on user and group names.
    pub async fn ensure_schema(&self) -> Result<(), Neo4jError> {
        for statement in SCHEMA_CYPHER {
            self.graph.run(query(statement)).await?;
        }
        Ok(())
    }

    /// Remove every node and edge.
    pub async fn clear(&self) -> Result<(), Neo4jError> {
        self.graph.run(query("MATCH (n) DETACH DELETE n")).await?;
        Ok(())
    }

    /// Check if the server answers queries.
    pub async fn is_healthy(&self) -> bool {
        self.graph.run(query("RETURN 1")).await.is_ok()
    }

    async fn write(&self, queries: Vec<Query>) -> Result<(), Neo4jError> {
        let mut txn = self.graph.start_txn().await?;
        txn.run_queries(queries).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn rows(&self, q: Query) -> Result<Vec<Row>, Neo4jError> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn names(&self, q: Query) -> Result<Vec<String>, Neo4jError> {
        self.rows(q)
            .await?
            .iter()
            .map(|row| row.get::<String>("name").map_err(Neo4jError::from))
            .collect()
    }

    async fn counts(&self, q: Query) -> Result<Vec<NameCount>, Neo4jError> {
        self.rows(q)
            .await?
            .iter()
            .map(|row| -> Result<NameCount, Neo4jError> {
                let name: String = row.get("name")?;
                let count: i64 = row.get("count")?;
                Ok(NameCount::new(name, to_count(count)?))
            })
            .collect()
    }

    async fn user_posts(&self, q: Query) -> Result<Vec<UserPosts>, Neo4jError> {
        self.rows(q)
            .await?
            .iter()
            .map(|row| -> Result<UserPosts, Neo4jError> {
                Ok(UserPosts::new(
                    row.get::<String>("name")?,
                    row.get::<Vec<String>>("posts")?,
                ))
            })
            .collect()
    }
}

fn to_count(value: i64) -> Result<u64, Neo4jError> {
    u64::try_from(value).map_err(|_| Neo4jError::InvalidValue(format!("negative count {value}")))
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    type Error = Neo4jError;

    async fn add_person(&self, person: &Person) -> Result<(), Self::Error> {
        person.validate()?;
        self.write(vec![query(
            "MERGE (u:User {name: $name}) SET u.sex = $sex, u.age = $age, u.posts = $posts",
        )
        .param("name", person.name.as_str())
        .param("sex", person.sex.code())
        .param("age", i64::from(person.age))
        .param("posts", person.posts.clone())])
        .await?;

        tracing::debug!(name = %person.name, "Merged user");
        Ok(())
    }

    async fn add_group(&self, name: &str) -> Result<(), Self::Error> {
        Group::new(name).validate()?;
        self.write(vec![query("MERGE (g:Group {name: $name})").param("name", name)])
            .await?;

        tracing::debug!(name, "Merged group");
        Ok(())
    }

    async fn add_connection(&self, first: &str, second: &str) -> Result<(), Self::Error> {
        let queries = Connection::new(first, second)
            .directed_edges()
            .into_iter()
            .map(|(source, target)| {
                query(
                    "MATCH (a:User {name: $source}), (b:User {name: $target}) \
                     MERGE (a)-[:KNOWS]->(b)",
                )
                .param("source", source)
                .param("target", target)
            })
            .collect();
        self.write(queries).await?;

        tracing::debug!(first, second, relation = %Relation::Knows, "Merged edge");
        Ok(())
    }

    async fn add_subscriber(&self, user_name: &str, group_name: &str) -> Result<(), Self::Error> {
        self.write(vec![query(
            "MATCH (u:User {name: $user}), (g:Group {name: $group}) \
             MERGE (u)-[:SUBSCRIBE]->(g)",
        )
        .param("user", user_name)
        .param("group", group_name)])
        .await?;

        tracing::debug!(user_name, group_name, relation = %Relation::Subscribe, "Merged edge");
        Ok(())
    }

    async fn get_names(&self) -> Result<Vec<String>, Self::Error> {
        self.names(query("MATCH (u:User) RETURN u.name AS name ORDER BY name"))
            .await
    }

    async fn get_males_ordered_by_age(&self) -> Result<Vec<NameAge>, Self::Error> {
        self.rows(query(
            "MATCH (u:User) WHERE u.sex = 'm' \
             RETURN u.name AS name, u.age AS age ORDER BY age DESC, name",
        ))
        .await?
        .iter()
        .map(|row| -> Result<NameAge, Neo4jError> {
            let name: String = row.get("name")?;
            let age: i64 = row.get("age")?;
            let age = u32::try_from(age)
                .map_err(|_| Neo4jError::InvalidValue(format!("age {age} for {name}")))?;
            Ok(NameAge::new(name, age))
        })
        .collect()
    }

    async fn get_person_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        self.names(
            query(
                "MATCH (u:User {name: $name})<-[:KNOWS]-(f) \
                 RETURN f.name AS name ORDER BY name",
            )
            .param("name", name),
        )
        .await
    }

    async fn get_friends_of_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        let names = self
            .names(
                query(
                    "MATCH (u:User {name: $name})<-[:KNOWS]-(f)<-[:KNOWS]-(ff) \
                     RETURN ff.name AS name ORDER BY name",
                )
                .param("name", name),
            )
            .await?;
        tracing::trace!(name, count = names.len(), "Friends of friends");
        Ok(names)
    }

    async fn get_user_info(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.counts(query(
            "MATCH (u:User)<-[:KNOWS]-(f) \
             RETURN u.name AS name, count(f) AS count ORDER BY name",
        ))
        .await
    }

    async fn get_groups(&self) -> Result<Vec<String>, Self::Error> {
        self.names(query("MATCH (g:Group) RETURN g.name AS name ORDER BY name"))
            .await
    }

    async fn get_groups_of_person(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        self.names(
            query(
                "MATCH (g:Group)<-[:SUBSCRIBE]-(u:User {name: $name}) \
                 RETURN g.name AS name ORDER BY name",
            )
            .param("name", name),
        )
        .await
    }

    async fn get_count_of_subscribers(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.counts(query(
            "MATCH (g:Group)<-[:SUBSCRIBE]-(u:User) \
             RETURN g.name AS name, count(u) AS count ORDER BY count DESC, name",
        ))
        .await
    }

    async fn get_persons_with_groups(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.counts(query(
            "MATCH (g:Group)<-[:SUBSCRIBE]-(u:User) \
             RETURN u.name AS name, count(g) AS count ORDER BY count DESC, name",
        ))
        .await
    }

    async fn get_count_of_friends_groups(&self, name: &str) -> Result<u64, Self::Error> {
        let rows = self
            .rows(
                query(
                    "MATCH (u:User {name: $name})<-[:KNOWS]-(f:User)<-[:KNOWS]-(ff:User)\
                     -[:SUBSCRIBE]->(g:Group) RETURN count(g) AS count",
                )
                .param("name", name),
            )
            .await?;
        // An aggregate without grouping keys always yields exactly one row
        match rows.first() {
            Some(row) => to_count(row.get("count")?),
            None => Ok(0),
        }
    }

    async fn get_user_posts(&self, name: &str) -> Result<Vec<Vec<String>>, Self::Error> {
        self.rows(
            query(
                "MATCH (n {name: $name}) RETURN coalesce(n.posts, []) AS posts \
                 ORDER BY CASE WHEN n:User THEN 0 ELSE 1 END",
            )
            .param("name", name),
        )
        .await?
        .iter()
        .map(|row| row.get::<Vec<String>>("posts").map_err(Neo4jError::from))
        .collect()
    }

    async fn get_posts_stat(&self) -> Result<Vec<NameAverage>, Self::Error> {
        self.rows(query(
            "MATCH (u:User) \
             WITH u.name AS name, coalesce(u.posts, []) AS posts \
             RETURN name, \
                    CASE size(posts) WHEN 0 THEN 0 \
                    ELSE reduce(total = 0, p IN posts | total + size(p)) / size(posts) \
                    END AS average \
             ORDER BY average DESC, name",
        ))
        .await?
        .iter()
        .map(|row| -> Result<NameAverage, Neo4jError> {
            let name: String = row.get("name")?;
            let average: i64 = row.get("average")?;
            Ok(NameAverage::new(name, to_count(average)?))
        })
        .collect()
    }

    async fn get_posts_more_than(&self, length: i64) -> Result<Vec<UserPosts>, Self::Error> {
        self.user_posts(
            query(
                "MATCH (u:User) \
                 RETURN u.name AS name, \
                        [p IN coalesce(u.posts, []) WHERE size(p) > $length] AS posts \
                 ORDER BY name",
            )
            .param("length", length),
        )
        .await
    }

    async fn get_users_stat_by_posts(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.counts(query(
            "MATCH (u:User) \
             RETURN u.name AS name, size(coalesce(u.posts, [])) AS count \
             ORDER BY count DESC, name",
        ))
        .await
    }

    async fn get_friends_friends_posts_by_given_p(
        &self,
        name: &str,
    ) -> Result<Vec<UserPosts>, Self::Error> {
        self.user_posts(
            query(
                "MATCH (u:User {name: $name})<-[:KNOWS]-(f:User)<-[:KNOWS]-(ff:User) \
                 RETURN ff.name AS name, coalesce(ff.posts, []) AS posts ORDER BY name",
            )
            .param("name", name),
        )
        .await
    }
}
