//! Social Graph Report Binary
//!
//! Connects to a graph backend, optionally loads seed data, and prints the
//! whole-network report as JSON on stdout.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `GRAPH_BACKEND`: `memory`, `postgres` or `neo4j` (default: memory)
//! - `SEED_FILE`: JSON seed to load before reporting. The memory backend
//!   falls back to the built-in fixture.
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! Backend-specific settings are read by `PostgresConfig::from_env` and
//! `Neo4jConfig::from_env`.
//!
//! ## Usage
//!
//! ```bash
//! GRAPH_BACKEND=neo4j NEO4J_PASSWORD=... cargo run --bin social_graph_report --features cli,neo4j
//! ```

use std::time::Instant;

use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use social_graph_store::{GraphStore, InMemoryGraphStore, NetworkReport, SocialGraphSeed};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "social_graph_report=info,social_graph_store=info,sqlx=warn".into());

    // Logs go to stderr so stdout carries only the report
    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_seed() -> Result<Option<SocialGraphSeed>, Box<dyn std::error::Error>> {
    match std::env::var("SEED_FILE") {
        Ok(path) if !path.is_empty() => {
            let json = std::fs::read_to_string(&path)?;
            let seed = SocialGraphSeed::from_json(&json)?;
            info!(path = %path, people = seed.people.len(), "Seed file loaded");
            Ok(Some(seed))
        }
        _ => Ok(None),
    }
}

async fn run<S: GraphStore>(
    store: &S,
    seed: Option<SocialGraphSeed>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(seed) = seed {
        seed.apply(store).await?;
    }

    let start = Instant::now();
    let report = NetworkReport::collect(store).await?;
    info!(
        latency_ms = start.elapsed().as_millis() as u64,
        users = report.names.len(),
        groups = report.groups.len(),
        "Report collected"
    );

    println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let backend = std::env::var("GRAPH_BACKEND").unwrap_or_else(|_| "memory".to_string());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %backend,
        "Starting social graph report"
    );

    let seed = load_seed()?;

    match backend.as_str() {
        "memory" => {
            let store = InMemoryGraphStore::new();
            run(&store, Some(seed.unwrap_or_else(SocialGraphSeed::fixture))).await
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let store = social_graph_store::PostgresGraphStore::from_env().await?;
            store.ensure_schema().await?;
            run(&store, seed).await
        }
        #[cfg(feature = "neo4j")]
        "neo4j" => {
            let store = social_graph_store::Neo4jGraphStore::from_env().await?;
            store.ensure_schema().await?;
            run(&store, seed).await
        }
        other => {
            warn!(backend = %other, "Backend not available in this build");
            Err(format!("unsupported GRAPH_BACKEND: {other}").into())
        }
    }
}
