//! Runtime Configuration
//!
//! Knobs for [`Runtime`](crate::reactive::Runtime). Every field has a
//! default, so a configuration file only needs to name what it changes:
//!
//! ```json
//! { "max_flush_runs": 500 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Upper bound on effect runs in a single flush. Effects that keep
    /// writing each other's inputs hit this instead of spinning forever.
    pub max_flush_runs: usize,

    /// Initial capacity of the pending-effect queue.
    pub effect_queue_capacity: usize,

    /// Nodes to reserve room for up front.
    pub node_capacity: usize,

    /// Links to reserve room for up front.
    pub link_capacity: usize,
}

impl RuntimeConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_runs: 10_000,
            effect_queue_capacity: 32,
            node_capacity: 0,
            link_capacity: 0,
        }
    }
}
