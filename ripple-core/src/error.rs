//! Errors reported by the reactive runtime.
//!
//! The graph engine itself never fails: it assumes the host hands it valid
//! node and link handles. These errors come from the runtime layer, where
//! handles are typed and nodes can be disposed.

use thiserror::Error;

use crate::graph::NodeId;

#[derive(Error, Debug)]
pub enum ReactiveError {
    #[error("node {0:?} has been disposed")]
    Disposed(NodeId),

    #[error("node {node:?} does not hold a {expected}")]
    TypeMismatch { node: NodeId, expected: &'static str },

    #[error("computed {0:?} was read during its own first evaluation")]
    CircularDependency(NodeId),

    #[error("effect flush exceeded {limit} runs; effects keep re-triggering each other")]
    FlushLimitExceeded { limit: usize },

    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReactiveError>;
