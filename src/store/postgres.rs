//! PostgreSQL graph store.
//!
//! Stores the social graph relationally: users and groups are keyed by
//! name, KNOWS and SUBSCRIBE edges are join tables whose primary keys give
//! merge semantics through `ON CONFLICT DO NOTHING`. Names are sorted with
//! the `"C"` collation so ordering matches byte-wise string order.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (default: `postgresql://localhost/social_graph`)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

use crate::types::{
    Connection, Group, NameAge, NameAverage, NameCount, Person, Relation, Sex, UserPosts,
    ValidationError,
};
use super::GraphStore;

/// Statements creating the graph tables, applied in order by
/// [`PostgresGraphStore::ensure_schema`].
pub const SCHEMA_SQL: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS sg_users (
        name  TEXT PRIMARY KEY,
        sex   TEXT NOT NULL,
        age   INTEGER NOT NULL CHECK (age >= 0),
        posts TEXT[] NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sg_groups (
        name TEXT PRIMARY KEY
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sg_knows (
        source TEXT NOT NULL REFERENCES sg_users(name) ON DELETE CASCADE,
        target TEXT NOT NULL REFERENCES sg_users(name) ON DELETE CASCADE,
        PRIMARY KEY (source, target)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sg_subscriptions (
        user_name  TEXT NOT NULL REFERENCES sg_users(name) ON DELETE CASCADE,
        group_name TEXT NOT NULL REFERENCES sg_groups(name) ON DELETE CASCADE,
        PRIMARY KEY (user_name, group_name)
    )
    "#,
];

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/social_graph".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// The pool could not be established.
    #[error("Connection failed: {0}")]
    Connection(#[source] sqlx::Error),
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Entity rejected before it was written.
    #[error("Invalid entity: {0}")]
    Invalid(#[from] ValidationError),
    /// A stored row could not be mapped to a record.
    #[error("Invalid row: {0}")]
    Decode(String),
}

/// PostgreSQL graph store.
pub struct PostgresGraphStore {
    pool: PgPool,
}

impl PostgresGraphStore {
    /// Connect with the given configuration. Fails fast, without retry.
    pub async fn new(config: PostgresConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await
            .map_err(PostgresError::Connection)?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, PostgresError> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create the graph tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), PostgresError> {
        for statement in SCHEMA_SQL {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Remove every node and edge.
    pub async fn clear(&self) -> Result<(), PostgresError> {
        sqlx::query("TRUNCATE sg_subscriptions, sg_knows, sg_users, sg_groups")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get the connection pool for health checks.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the database is reachable.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    async fn fetch_names(&self, sql: &str, name: Option<&str>) -> Result<Vec<String>, PostgresError> {
        let mut query = sqlx::query(sql);
        if let Some(name) = name {
            query = query.bind(name);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(PostgresError::from))
            .collect()
    }

    async fn fetch_counts(&self, sql: &str) -> Result<Vec<NameCount>, PostgresError> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(Self::parse_count_row).collect()
    }

    fn parse_count_row(row: &PgRow) -> Result<NameCount, PostgresError> {
        let name: String = row.try_get("name")?;
        let count: i64 = row.try_get("count")?;
        Ok(NameCount::new(name, to_count(count)?))
    }

    fn parse_posts_row(row: &PgRow) -> Result<UserPosts, PostgresError> {
        Ok(UserPosts::new(
            row.try_get::<String, _>("name")?,
            row.try_get::<Vec<String>, _>("posts")?,
        ))
    }
}

fn to_count(value: i64) -> Result<u64, PostgresError> {
    u64::try_from(value).map_err(|_| PostgresError::Decode(format!("negative count {value}")))
}

#[async_trait]
impl GraphStore for PostgresGraphStore {
    type Error = PostgresError;

    async fn add_person(&self, person: &Person) -> Result<(), Self::Error> {
        person.validate()?;
        let age = i32::try_from(person.age)
            .map_err(|_| PostgresError::Decode(format!("age {} out of range", person.age)))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO sg_users (name, sex, age, posts)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET sex = EXCLUDED.sex, age = EXCLUDED.age, posts = EXCLUDED.posts
            "#
        )
        .bind(&person.name)
        .bind(person.sex.code())
        .bind(age)
        .bind(&person.posts)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(name = %person.name, "Merged user");
        Ok(())
    }

    async fn add_group(&self, name: &str) -> Result<(), Self::Error> {
        Group::new(name).validate()?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO sg_groups (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(name, "Merged group");
        Ok(())
    }

    async fn add_connection(&self, first: &str, second: &str) -> Result<(), Self::Error> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        let connection = Connection::new(first, second);
        for (source, target) in connection.directed_edges() {
            created += sqlx::query(
                r#"
                INSERT INTO sg_knows (source, target)
                SELECT a.name, b.name
                FROM sg_users a, sg_users b
                WHERE a.name = $1 AND b.name = $2
                ON CONFLICT DO NOTHING
                "#
            )
            .bind(source)
            .bind(target)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;

        tracing::debug!(first, second, created, relation = %Relation::Knows, "Merged edge");
        Ok(())
    }

    async fn add_subscriber(&self, user_name: &str, group_name: &str) -> Result<(), Self::Error> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query(
            r#"
            INSERT INTO sg_subscriptions (user_name, group_name)
            SELECT u.name, g.name
            FROM sg_users u, sg_groups g
            WHERE u.name = $1 AND g.name = $2
            ON CONFLICT DO NOTHING
            "#
        )
        .bind(user_name)
        .bind(group_name)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;

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
        self.fetch_names(r#"SELECT name FROM sg_users ORDER BY name COLLATE "C""#, None)
            .await
    }

    async fn get_males_ordered_by_age(&self) -> Result<Vec<NameAge>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT name, age FROM sg_users
            WHERE sex = $1
            ORDER BY age DESC, name COLLATE "C"
            "#
        )
        .bind(Sex::Male.code())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<NameAge, PostgresError> {
                let name: String = row.try_get("name")?;
                let age: i32 = row.try_get("age")?;
                let age = u32::try_from(age)
                    .map_err(|_| PostgresError::Decode(format!("negative age for {name}")))?;
                Ok(NameAge::new(name, age))
            })
            .collect()
    }

    async fn get_person_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        self.fetch_names(
            r#"
            SELECT source AS name FROM sg_knows
            WHERE target = $1
            ORDER BY source COLLATE "C"
            "#,
            Some(name),
        )
        .await
    }

    async fn get_friends_of_friends(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        // Paths `name <- k1.source <- k2.source`; a path may not use the same edge twice
        let names = self
            .fetch_names(
                r#"
                SELECT k2.source AS name
                FROM sg_knows k1
                JOIN sg_knows k2 ON k2.target = k1.source
                WHERE k1.target = $1
                  AND (k1.source, k1.target) <> (k2.source, k2.target)
                ORDER BY k2.source COLLATE "C"
                "#,
                Some(name),
            )
            .await?;
        tracing::trace!(name, count = names.len(), "Friends of friends");
        Ok(names)
    }

    async fn get_user_info(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.fetch_counts(
            r#"
            SELECT target AS name, COUNT(*) AS count FROM sg_knows
            GROUP BY target
            ORDER BY target COLLATE "C"
            "#,
        )
        .await
    }

    async fn get_groups(&self) -> Result<Vec<String>, Self::Error> {
        self.fetch_names(r#"SELECT name FROM sg_groups ORDER BY name COLLATE "C""#, None)
            .await
    }

    async fn get_groups_of_person(&self, name: &str) -> Result<Vec<String>, Self::Error> {
        self.fetch_names(
            r#"
            SELECT group_name AS name FROM sg_subscriptions
            WHERE user_name = $1
            ORDER BY group_name COLLATE "C"
            "#,
            Some(name),
        )
        .await
    }

    async fn get_count_of_subscribers(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.fetch_counts(
            r#"
            SELECT group_name AS name, COUNT(*) AS count FROM sg_subscriptions
            GROUP BY group_name
            ORDER BY count DESC, group_name COLLATE "C"
            "#,
        )
        .await
    }

    async fn get_persons_with_groups(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.fetch_counts(
            r#"
            SELECT user_name AS name, COUNT(*) AS count FROM sg_subscriptions
            GROUP BY user_name
            ORDER BY count DESC, user_name COLLATE "C"
            "#,
        )
        .await
    }

    async fn get_count_of_friends_groups(&self, name: &str) -> Result<u64, Self::Error> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(s.group_name) AS count
            FROM sg_knows k1
            JOIN sg_knows k2 ON k2.target = k1.source
            JOIN sg_subscriptions s ON s.user_name = k2.source
            WHERE k1.target = $1
              AND (k1.source, k1.target) <> (k2.source, k2.target)
            "#
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?
        .try_get("count")?;
        to_count(count)
    }

    async fn get_user_posts(&self, name: &str) -> Result<Vec<Vec<String>>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT posts, 0 AS ord FROM sg_users WHERE name = $1
            UNION ALL
            SELECT ARRAY[]::TEXT[] AS posts, 1 AS ord FROM sg_groups WHERE name = $1
            ORDER BY ord
            "#
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<Vec<String>, _>("posts").map_err(PostgresError::from))
            .collect()
    }

    async fn get_posts_stat(&self) -> Result<Vec<NameAverage>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT name,
                   COALESCE(
                       (SELECT SUM(char_length(p)) FROM unnest(posts) AS p)
                           / NULLIF(cardinality(posts), 0),
                       0
                   )::BIGINT AS average
            FROM sg_users
            ORDER BY average DESC, name COLLATE "C"
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<NameAverage, PostgresError> {
                let name: String = row.try_get("name")?;
                let average: i64 = row.try_get("average")?;
                Ok(NameAverage::new(name, to_count(average)?))
            })
            .collect()
    }

    async fn get_posts_more_than(&self, length: i64) -> Result<Vec<UserPosts>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT name,
                   ARRAY(
                       SELECT t.p FROM unnest(posts) WITH ORDINALITY AS t(p, i)
                       WHERE char_length(t.p) > $1
                       ORDER BY t.i
                   ) AS posts
            FROM sg_users
            ORDER BY name COLLATE "C"
            "#
        )
        .bind(length)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_posts_row).collect()
    }

    async fn get_users_stat_by_posts(&self) -> Result<Vec<NameCount>, Self::Error> {
        self.fetch_counts(
            r#"
            SELECT name, cardinality(posts)::BIGINT AS count FROM sg_users
            ORDER BY count DESC, name COLLATE "C"
            "#,
        )
        .await
    }

    async fn get_friends_friends_posts_by_given_p(
        &self,
        name: &str,
    ) -> Result<Vec<UserPosts>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT u.name AS name, u.posts AS posts
            FROM sg_knows k1
            JOIN sg_knows k2 ON k2.target = k1.source
            JOIN sg_users u ON u.name = k2.source
            WHERE k1.target = $1
              AND (k1.source, k1.target) <> (k2.source, k2.target)
            ORDER BY u.name COLLATE "C"
            "#
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_posts_row).collect()
    }
}
