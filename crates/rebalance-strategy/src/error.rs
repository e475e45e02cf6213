//! Errors surfaced by the collaborators a pass talks to.
//!
//! Neither is fatal to a pass: an inventory error drops one node, an
//! eviction error skips one pod.

use thiserror::Error;

/// Failure to list the pods bound to a node.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("inventory unavailable for node {node}: {reason}")]
    Unavailable { node: String, reason: String },
}

/// Failure to evict a single pod.
#[derive(Debug, Error)]
pub enum EvictionError {
    #[error("pod not found: {0}")]
    PodNotFound(String),

    #[error("eviction of {pod} denied: {reason}")]
    Denied { pod: String, reason: String },

    #[error("eviction API error: {0}")]
    Api(String),
}
