//! Two-node sync scenarios
//!
//! Nodes are registered as each other's peers by hand and sync rounds are
//! driven explicitly, so nothing depends on broadcast or timers.

use super::fixtures::{authored_post, start_node};
use crate::common::ids;

#[tokio::test]
async fn test_pull_from_peer_then_repeat_is_stable() {
    let a = start_node("node-a").await;
    let b = start_node("node-b").await;

    a.create_post(authored_post("p1", "node-a", 100)).await;
    b.add_peer(&a, "node-a").await;

    let report = b.sync_engine().run_round().await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(ids(&b.storage.posts.load().await.unwrap()), vec!["p1"]);

    // Second cycle: unchanged
    b.sync_engine().run_round().await.unwrap();
    let first = b.storage.posts.load().await.unwrap();
    assert_eq!(ids(&first), vec!["p1"]);

    // Repeated external merge of the same post: unchanged
    let total = vnforum::node::PeerClient::new(std::time::Duration::from_secs(2))
        .unwrap()
        .push_posts(&b.base_url(), &first)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(b.storage.posts.load().await.unwrap(), first);

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn test_mutual_pull_converges_newest_first() {
    let a = start_node("node-a").await;
    let b = start_node("node-b").await;

    a.create_post(authored_post("p1", "node-a", 100)).await;
    b.create_post(authored_post("p2", "node-b", 200)).await;
    a.add_peer(&b, "node-b").await;
    b.add_peer(&a, "node-a").await;

    a.sync_engine().run_round().await.unwrap();
    b.sync_engine().run_round().await.unwrap();

    let on_a = a.storage.posts.load().await.unwrap();
    let on_b = b.storage.posts.load().await.unwrap();
    assert_eq!(ids(&on_a), vec!["p2", "p1"]);
    assert_eq!(ids(&on_b), vec!["p2", "p1"]);
    assert_eq!(on_a, on_b);

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn test_stopped_peer_is_skipped() {
    let a = start_node("node-a").await;
    let c = start_node("node-c").await;

    a.create_post(authored_post("p1", "node-a", 100)).await;
    a.add_peer(&c, "node-c").await;

    // node-c goes away while still registered
    c.shutdown().await;

    let report = a.sync_engine().run_round().await.unwrap();
    assert_eq!(report.peers, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.synced, 0);
    assert_eq!(ids(&a.storage.posts.load().await.unwrap()), vec!["p1"]);

    a.shutdown().await;
}
