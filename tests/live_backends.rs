//! Scenario tests against live database backends.
//!
//! Compiled only with the `postgres` or `neo4j` feature, and skipped unless
//! `SOCIAL_GRAPH_LIVE_TESTS=1` is set. Each test wipes the target database.

#![cfg(any(feature = "postgres", feature = "neo4j"))]

use social_graph_store::{
    GraphStore, InMemoryGraphStore, NetworkReport, SocialGraphSeed,
};

fn live_tests_enabled() -> bool {
    std::env::var("SOCIAL_GRAPH_LIVE_TESTS").map_or(false, |v| v == "1")
}

/// Run every read against `store` and the in-memory reference and compare.
async fn assert_matches_reference<S: GraphStore>(store: &S) {
    let reference = InMemoryGraphStore::new();
    SocialGraphSeed::fixture().apply(&reference).await.unwrap();

    assert_eq!(
        NetworkReport::collect(store).await.unwrap(),
        NetworkReport::collect(&reference).await.unwrap()
    );

    for name in ["Alex", "Bob", "Megan", "test1", "Nobody"] {
        assert_eq!(
            store.get_person_friends(name).await.unwrap(),
            reference.get_person_friends(name).await.unwrap(),
            "friends of {name}"
        );
        assert_eq!(
            store.get_friends_of_friends(name).await.unwrap(),
            reference.get_friends_of_friends(name).await.unwrap(),
            "friends of friends of {name}"
        );
        assert_eq!(
            store.get_groups_of_person(name).await.unwrap(),
            reference.get_groups_of_person(name).await.unwrap(),
            "groups of {name}"
        );
        assert_eq!(
            store.get_count_of_friends_groups(name).await.unwrap(),
            reference.get_count_of_friends_groups(name).await.unwrap(),
            "friends' groups of {name}"
        );
        assert_eq!(
            store.get_user_posts(name).await.unwrap(),
            reference.get_user_posts(name).await.unwrap(),
            "posts of {name}"
        );
        assert_eq!(
            store.get_friends_friends_posts_by_given_p(name).await.unwrap(),
            reference.get_friends_friends_posts_by_given_p(name).await.unwrap(),
            "friends' friends' posts of {name}"
        );
    }

    for length in [0, 3, 10] {
        assert_eq!(
            store.get_posts_more_than(length).await.unwrap(),
            reference.get_posts_more_than(length).await.unwrap()
        );
    }
}

#[cfg(feature = "postgres")]
#[tokio::test]
async fn test_postgres_matches_reference() {
    use social_graph_store::PostgresGraphStore;

    if !live_tests_enabled() {
        eprintln!("SOCIAL_GRAPH_LIVE_TESTS not set, skipping");
        return;
    }

    let store = PostgresGraphStore::from_env().await.unwrap();
    store.ensure_schema().await.unwrap();
    store.clear().await.unwrap();

    SocialGraphSeed::fixture().apply(&store).await.unwrap();
    // Re-applying must not duplicate anything
    SocialGraphSeed::fixture().apply(&store).await.unwrap();

    assert!(store.is_healthy().await);
    assert_matches_reference(&store).await;
}

#[cfg(feature = "neo4j")]
#[tokio::test]
async fn test_neo4j_matches_reference() {
    use social_graph_store::Neo4jGraphStore;

    if !live_tests_enabled() {
        eprintln!("SOCIAL_GRAPH_LIVE_TESTS not set, skipping");
        return;
    }

    let store = Neo4jGraphStore::from_env().await.unwrap();
    store.ensure_schema().await.unwrap();
    store.clear().await.unwrap();

    SocialGraphSeed::fixture().apply(&store).await.unwrap();
    SocialGraphSeed::fixture().apply(&store).await.unwrap();

    assert!(store.is_healthy().await);
    assert_matches_reference(&store).await;
}
