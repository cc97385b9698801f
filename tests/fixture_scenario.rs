//! Scenario tests for the social graph queries.
//!
//! Users Alex(m,23), Megan(f,34), Bob(m,21); friendships Alex–Megan and
//! Megan–Bob; groups test1, test2; subscriptions Bob→test1, Megan→test1,
//! Alex→test2.

use std::sync::Arc;
use social_graph_store::{
    GraphStore, InMemoryGraphStore, NameAge, NameAverage, NameCount, Person, Sex,
    SocialGraphSeed,
    UserPosts,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn fixture_store() -> InMemoryGraphStore {
    let store = InMemoryGraphStore::new();
    SocialGraphSeed::fixture().apply(&store).await.unwrap();
    store
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// FIXTURE QUERIES
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_names() {
    let store = fixture_store().await;
    assert_eq!(store.get_names().await.unwrap(), strings(&["Alex", "Bob", "Megan"]));
}

#[tokio::test]
async fn test_get_males_ordered_by_age() {
    let store = fixture_store().await;
    assert_eq!(
        store.get_males_ordered_by_age().await.unwrap(),
        vec![NameAge::new("Alex", 23), NameAge::new("Bob", 21)]
    );
}

#[tokio::test]
async fn test_get_person_friends() {
    let store = fixture_store().await;
    assert_eq!(store.get_person_friends("Bob").await.unwrap(), strings(&["Megan"]));
    assert_eq!(store.get_person_friends("Megan").await.unwrap(), strings(&["Alex", "Bob"]));
}

#[tokio::test]
async fn test_get_friends_of_friends_includes_origin() {
    let store = fixture_store().await;
    assert_eq!(store.get_friends_of_friends("Bob").await.unwrap(), strings(&["Alex", "Bob"]));
    // Megan <- Alex <- Megan, Megan <- Bob <- Megan: duplicates are kept
    assert_eq!(
        store.get_friends_of_friends("Megan").await.unwrap(),
        strings(&["Megan", "Megan"])
    );
}

#[tokio::test]
async fn test_get_user_info() {
    let store = fixture_store().await;
    assert_eq!(
        store.get_user_info().await.unwrap(),
        vec![
            NameCount::new("Alex", 1),
            NameCount::new("Bob", 1),
            NameCount::new("Megan", 2),
        ]
    );
}

#[tokio::test]
async fn test_get_groups() {
    let store = fixture_store().await;
    assert_eq!(store.get_groups().await.unwrap(), strings(&["test1", "test2"]));
    assert_eq!(store.get_groups_of_person("Alex").await.unwrap(), strings(&["test2"]));
}

#[tokio::test]
async fn test_get_count_of_subscribers() {
    let store = fixture_store().await;
    assert_eq!(
        store.get_count_of_subscribers().await.unwrap(),
        vec![NameCount::new("test1", 2), NameCount::new("test2", 1)]
    );
}

#[tokio::test]
async fn test_get_persons_with_groups() {
    let store = fixture_store().await;
    assert_eq!(
        store.get_persons_with_groups().await.unwrap(),
        vec![
            NameCount::new("Alex", 1),
            NameCount::new("Bob", 1),
            NameCount::new("Megan", 1),
        ]
    );
}

#[tokio::test]
async fn test_get_count_of_friends_groups() {
    let store = fixture_store().await;
    assert_eq!(store.get_count_of_friends_groups("Megan").await.unwrap(), 2);
    // Bob <- Megan <- {Alex: test2, Bob: test1}
    assert_eq!(store.get_count_of_friends_groups("Bob").await.unwrap(), 2);
}

#[tokio::test]
async fn test_get_user_posts() {
    let store = fixture_store().await;
    assert_eq!(
        store.get_user_posts("Megan").await.unwrap(),
        vec![strings(&["post", "test_1", ":)"])]
    );
    assert_eq!(store.get_user_posts("test1").await.unwrap(), vec![Vec::<String>::new()]);
}

#[tokio::test]
async fn test_get_posts_stat() {
    let store = fixture_store().await;
    let stats = store.get_posts_stat().await.unwrap();

    // Integer division truncates: Alex 23 / 3, Bob 16 / 3, Megan 12 / 3
    assert_eq!(
        stats,
        vec![
            NameAverage::new("Alex", 7),
            NameAverage::new("Bob", 5),
            NameAverage::new("Megan", 4),
        ]
    );
}

#[tokio::test]
async fn test_get_posts_more_than() {
    let store = fixture_store().await;
    let posts = store.get_posts_more_than(10).await.unwrap();

    assert_eq!(
        posts,
        vec![
            UserPosts::new("Alex", strings(&["Super test post"])),
            UserPosts::new("Bob", Vec::new()),
            UserPosts::new("Megan", Vec::new()),
        ]
    );

    let posts = store.get_posts_more_than(3).await.unwrap();
    assert_eq!(posts[1], UserPosts::new("Bob", strings(&["ahahha:D", "LMFAO"])));
}

#[tokio::test]
async fn test_get_users_stat_by_posts() {
    let store = fixture_store().await;
    store
        .add_person(&Person::new("Zed", Sex::Male, 60, ["one", "two", "three", "four"]))
        .await
        .unwrap();

    let counts = store.get_users_stat_by_posts().await.unwrap();
    assert_eq!(counts[0], NameCount::new("Zed", 4));
    assert_eq!(counts[1], NameCount::new("Alex", 3));
    assert_eq!(counts.len(), 4);
}

#[tokio::test]
async fn test_get_friends_friends_posts_by_given_p() {
    let store = fixture_store().await;
    assert_eq!(
        store.get_friends_friends_posts_by_given_p("Bob").await.unwrap(),
        vec![
            UserPosts::new("Alex", strings(&["Super test post", "test", "twit"])),
            UserPosts::new("Bob", strings(&["ahahha:D", "LMFAO", "wtf"])),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// EDGE CASES
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_names_yield_empty_results() {
    let store = fixture_store().await;
    assert!(store.get_person_friends("Nobody").await.unwrap().is_empty());
    assert!(store.get_friends_of_friends("Nobody").await.unwrap().is_empty());
    assert!(store.get_groups_of_person("Nobody").await.unwrap().is_empty());
    assert!(store.get_user_posts("Nobody").await.unwrap().is_empty());
    assert!(store.get_friends_friends_posts_by_given_p("Nobody").await.unwrap().is_empty());
    assert_eq!(store.get_count_of_friends_groups("Nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn test_zero_post_user_averages_to_zero() {
    let store = fixture_store().await;
    store
        .add_person(&Person::new("Lurker", Sex::Female, 19, Vec::<String>::new()))
        .await
        .unwrap();

    let stats = store.get_posts_stat().await.unwrap();
    let last = stats.last().unwrap();
    assert_eq!(last.name, "Lurker");
    assert_eq!(last.average, 0);
}

#[tokio::test]
async fn test_reseeding_changes_nothing() {
    let store = fixture_store().await;
    SocialGraphSeed::fixture().apply(&store).await.unwrap();

    assert_eq!(store.num_users(), 3);
    assert_eq!(store.num_groups(), 2);
    assert_eq!(store.num_knows_edges(), 4);
    assert_eq!(store.num_subscriptions(), 3);
    assert_eq!(store.get_groups().await.unwrap(), strings(&["test1", "test2"]));
}

#[tokio::test]
async fn test_posts_stat_truncates_toward_zero() {
    let store = InMemoryGraphStore::new();
    // (1 + 2) / 2 = 1.5 truncates to 1
    store
        .add_person(&Person::new("Half", Sex::Female, 30, ["a", "bb"]))
        .await
        .unwrap();

    assert_eq!(
        store.get_posts_stat().await.unwrap(),
        vec![NameAverage::new("Half", 1)]
    );
}

#[tokio::test]
async fn test_concurrent_connections_share_one_store() {
    let store = Arc::new(fixture_store().await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.add_connection("Alex", "Bob").await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.num_knows_edges(), 6);
    assert_eq!(store.get_person_friends("Bob").await.unwrap(), strings(&["Alex", "Megan"]));
}
