//! Graph snapshots for diagnostics.

use serde::Serialize;
use slotmap::Key;

use super::factory::NodeKind;
use super::node::{LinkId, NodeId};
use super::Graph;

/// A serializable copy of a graph's structure and flag state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub id: u64,
    pub kind: &'static str,
    pub flags: Vec<&'static str>,
    pub deps_epoch: u64,
}

/// One link, in the order it appears in its subscriber's dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSnapshot {
    pub dep: u64,
    pub sub: u64,
    pub version: u64,
    /// Whether the link was confirmed by the subscriber's latest pass.
    pub live: bool,
}

fn raw_node(id: NodeId) -> u64 {
    id.data().as_ffi()
}

impl<P> Graph<P> {
    /// Capture the graph, naming each node's role with `kind`.
    pub fn snapshot_with(&self, kind: impl Fn(&P) -> &'static str) -> GraphSnapshot {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut edges = Vec::with_capacity(self.links.len());

        for (id, node) in &self.nodes {
            nodes.push(NodeSnapshot {
                id: raw_node(id),
                kind: kind(&node.payload),
                flags: node.flags.names().collect(),
                deps_epoch: node.deps_epoch,
            });

            let deps: Vec<LinkId> = self.deps(id).collect();
            for link_id in deps {
                let link = &self.links[link_id];
                edges.push(EdgeSnapshot {
                    dep: raw_node(link.dep),
                    sub: raw_node(link.sub),
                    version: link.version,
                    live: self.is_valid_link(link_id, id),
                });
            }
        }

        GraphSnapshot { nodes, edges }
    }
}

impl<V, G, F> Graph<NodeKind<V, G, F>> {
    /// Capture the graph using the stock role names.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.snapshot_with(NodeKind::name)
    }
}

impl GraphSnapshot {
    /// Render the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
