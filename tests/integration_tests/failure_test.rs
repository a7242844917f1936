//! Task isolation tests
//!
//! A storage failure ends the background task that hit it; the sync
//! service keeps answering.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use vnforum::error::Error;
use vnforum::shutdown::ShutdownTrigger;

use super::fixtures::{authored_post, start_node, start_node_with};

#[tokio::test]
async fn test_corrupt_store_ends_sync_but_service_keeps_serving() {
    let a = start_node_with("node-a", |b| b.sync_interval_secs(1)).await;
    let b = start_node("node-b").await;

    b.create_post(authored_post("p2", "node-b", 200)).await;
    a.add_peer(&b, "node-b").await;
    std::fs::write(a.storage.posts.path(), "{\"not\": \"a list\"").unwrap();

    // A round driven by hand fails the same way the node's own loop does
    let (_trigger, stop) = ShutdownTrigger::new();
    let result = tokio::time::timeout(Duration::from_secs(5), a.sync_engine().run(stop))
        .await
        .unwrap();
    assert!(matches!(result, Err(Error::CorruptFile { .. })));

    // Give the node's sync loop time to hit the corrupt store too
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let http = reqwest::Client::new();

    let status = http.get(format!("{}/status", a.base_url())).send().await.unwrap();
    assert_eq!(status.status(), StatusCode::OK);
    let status: Value = status.json().await.unwrap();
    assert_eq!(status["host"], "node-a");

    let peers = http.get(format!("{}/peers", a.base_url())).send().await.unwrap();
    assert_eq!(peers.status(), StatusCode::OK);
    let peers: Value = peers.json().await.unwrap();
    assert_eq!(peers["127.0.0.1"]["host"], "node-b");

    let posts = http.get(format!("{}/posts", a.base_url())).send().await.unwrap();
    assert_eq!(posts.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let posts: Value = posts.json().await.unwrap();
    assert_eq!(posts["ok"], false);

    // The file is left alone
    let raw = std::fs::read_to_string(a.storage.posts.path()).unwrap();
    assert_eq!(raw, "{\"not\": \"a list\"");

    // Shutdown reports the sync task's failure
    let stopped = a.handle.shutdown().await;
    assert!(matches!(stopped, Err(Error::CorruptFile { .. })));

    b.shutdown().await;
}
