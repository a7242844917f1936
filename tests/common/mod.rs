//! Common test utilities

use vnforum::models::{local_time, Post};

/// Create a post with a fixed id and creation time
#[allow(dead_code)]
pub fn post_with_id(id: &str, created_ts: i64) -> Post {
    let mut post = Post::new(
        format!("Bài viết {id}"),
        "Nội dung thử nghiệm",
        "tester",
        "test-host",
        local_time(created_ts),
    );
    post.id = id.to_string();
    post
}

/// Ids of a collection, in order
#[allow(dead_code)]
pub fn ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.clone()).collect()
}
