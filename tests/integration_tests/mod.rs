//! Integration tests module
//!
//! End-to-end tests running real nodes in-process, each over its own
//! temporary data directory and an ephemeral service port:
//! - The HTTP sync service
//! - Convergence of two nodes pulling from each other
//! - Single-instance startup guard
//! - Isolation of a failed background task

pub mod api_test;
pub mod failure_test;
pub mod fixtures;
pub mod guard_test;
pub mod sync_test;
