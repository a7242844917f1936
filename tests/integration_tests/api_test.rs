//! Sync service API tests
//!
//! Exercise every route of a running node over real HTTP.

use reqwest::StatusCode;
use serde_json::{json, Value};

use super::fixtures::{authored_post, start_node};

fn http() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_status_reports_identity() {
    let node = start_node("alpha").await;

    let response = http().get(format!("{}/status", node.base_url())).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"ok": true, "host": "alpha", "port": node.port()}));

    node.shutdown().await;
}

#[tokio::test]
async fn test_posts_returns_store() {
    let node = start_node("alpha").await;
    node.create_post(authored_post("p1", "alpha", 100)).await;

    let body: Value = http()
        .get(format!("{}/posts", node.base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], "p1");
    assert_eq!(posts[0]["created_ts"], 100);

    node.shutdown().await;
}

#[tokio::test]
async fn test_peers_returns_live_registry() {
    let node = start_node("alpha").await;
    let now = vnforum::models::unix_now();
    node.storage.peers.upsert_at("192.168.1.20", 17890, "beta", now).await.unwrap();
    node.storage.peers.upsert_at("192.168.1.21", 17890, "stale", now - 1_000).await.unwrap();

    let body: Value = http()
        .get(format!("{}/peers", node.base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let peers = body.as_object().unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers["192.168.1.20"]["host"], "beta");
    assert_eq!(peers["192.168.1.20"]["port"], 17890);

    node.shutdown().await;
}

#[tokio::test]
async fn test_merge_returns_total_and_preserves_extra_fields() {
    let node = start_node("alpha").await;
    node.create_post(authored_post("p1", "alpha", 100)).await;

    let batch = json!([
        {"id": "p2", "title": "t", "body": "b", "author": "a", "origin": "beta",
         "created": "01/01/1970 00:03", "created_ts": 200,
         "image": "data:image/png;base64,AAAA", "comments": [{"text": "hay quá"}]},
        {"id": "p1", "title": "Post p1", "body": "Xin chào từ mạng LAN", "author": "tester",
         "origin": "alpha", "created": "01/01/1970 00:01", "created_ts": 100}
    ]);
    let response = http()
        .post(format!("{}/merge", node.base_url()))
        .json(&batch)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"ok": true, "total_posts": 2}));

    let stored = node.storage.posts.load().await.unwrap();
    assert_eq!(stored[0].id, "p2");
    assert_eq!(stored[1].id, "p1");
    assert_eq!(stored[0].extra["image"], "data:image/png;base64,AAAA");
    assert_eq!(stored[0].extra["comments"], json!([{"text": "hay quá"}]));

    node.shutdown().await;
}

#[tokio::test]
async fn test_merge_accepts_large_attachments() {
    let node = start_node("alpha").await;

    let image = "A".repeat(3 * 1024 * 1024);
    let batch = json!([{"id": "big", "created_ts": 100, "image_b64": image}]);

    let response = http()
        .post(format!("{}/merge", node.base_url()))
        .json(&batch)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"ok": true, "total_posts": 1}));

    let stored = node.storage.posts.load().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].extra["image_b64"].as_str().map(str::len), Some(3 * 1024 * 1024));

    node.shutdown().await;
}

#[tokio::test]
async fn test_merge_rejects_object_body() {
    let node = start_node("alpha").await;
    node.create_post(authored_post("p1", "alpha", 100)).await;
    let before = std::fs::read(node.storage.posts.path()).unwrap();

    let response = http()
        .post(format!("{}/merge", node.base_url()))
        .json(&json!({"id": "p9", "created_ts": 900}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "payload must be list");

    let after = std::fs::read(node.storage.posts.path()).unwrap();
    assert_eq!(before, after);

    node.shutdown().await;
}

#[tokio::test]
async fn test_merge_rejects_malformed_body() {
    let node = start_node("alpha").await;

    for body in ["[{\"id\": ", "not json at all", "[1, 2, 3]"] {
        let response = http()
            .post(format!("{}/merge", node.base_url()))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");

        let json: Value = response.json().await.unwrap();
        assert_eq!(json["ok"], false);
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    assert!(node.storage.posts.load().await.unwrap().is_empty());
    node.shutdown().await;
}

#[tokio::test]
async fn test_unknown_routes_are_not_found() {
    let node = start_node("alpha").await;
    let base = node.base_url();

    let requests = [
        http().get(format!("{base}/nope")),
        http().get(format!("{base}/merge")),
        http().post(format!("{base}/status")),
        http().post(format!("{base}/posts")),
    ];

    for request in requests {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"ok": false, "error": "not_found"}));
    }

    node.shutdown().await;
}
