//! Startup guard tests
//!
//! A second node on a port already served by a healthy node must stand
//! down before binding anything.

use vnforum::error::Error;
use vnforum::node::{ForumNode, StartOutcome};

use super::fixtures::start_node;

fn config_on_port(dir: &tempfile::TempDir, port: u16) -> vnforum::config::NodeConfig {
    vnforum::config::NodeConfig::builder()
        .service_port(port)
        .bind_ip("127.0.0.1".parse().unwrap())
        .data_dir(dir.path())
        .host_label("second")
        .enable_discovery(false)
        .enable_request_logging(false)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_second_node_stands_down() {
    let first = start_node("first").await;

    let dir = tempfile::TempDir::new().unwrap();
    let second = ForumNode::new(config_on_port(&dir, first.port())).unwrap();

    match second.start().await.unwrap() {
        StartOutcome::AlreadyRunning(status) => {
            assert!(status.ok);
            assert_eq!(status.host, "first");
            assert_eq!(status.port, first.port());
        }
        StartOutcome::Started(_) => panic!("second node must not start"),
    }

    // The first node keeps serving
    let status: serde_json::Value = reqwest::get(format!("{}/status", first.base_url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["host"], "first");

    first.shutdown().await;
}

#[tokio::test]
async fn test_port_held_by_something_else_fails_to_bind() {
    // Accepts connections but never speaks HTTP
    let squatter = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = squatter.local_addr().unwrap().port();

    let dir = tempfile::TempDir::new().unwrap();
    let node = ForumNode::new(config_on_port(&dir, port)).unwrap();

    match node.start().await {
        Err(Error::Bind { addr, .. }) => assert_eq!(addr.port(), port),
        Err(other) => panic!("expected a bind error, got {other}"),
        Ok(_) => panic!("node must not start on an occupied port"),
    }

    drop(squatter);
}
