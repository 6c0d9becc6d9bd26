//! Dependency Graph
//!
//! This module implements the storage side of the reactive engine: the nodes,
//! the edges between them, and the flags that record where each node is in a
//! propagation pass.
//!
//! # Overview
//!
//! - Nodes represent reactive values (signals), derived values (computeds) or
//!   side effects (effects)
//! - A link from B to A records that A read B during its last evaluation
//!
//! Each node owns two intrusive lists: its dependencies and its subscribers.
//! Every link sits in one list of each kind at the same time, which makes
//! edge insertion and removal O(1) without any hashing.
//!
//! # Design Decisions
//!
//! 1. Nodes and links live in two arenas indexed by generation-checked keys.
//!    A freed slot is never confused with the node or link that reuses it.
//!
//! 2. The graph owns no behavior. Traversals live in [`crate::system`] and are
//!    driven by a host that owns the graph.
//!
//! 3. Nodes are only removed on the host's request, never by the engine.

mod factory;
mod flags;
mod node;
mod snapshot;

use std::ops::{Index, IndexMut};

use slotmap::SlotMap;

pub use factory::{ComputedNode, EffectNode, NodeKind, SignalNode};
pub use flags::Flags;
pub use node::{Link, LinkId, NodeId, ReactiveNode};
pub use snapshot::{EdgeSnapshot, GraphSnapshot, NodeSnapshot};

/// Arena holding every node and link of one reactive graph.
#[derive(Debug)]
pub struct Graph<P> {
    pub(crate) nodes: SlotMap<NodeId, ReactiveNode<P>>,
    pub(crate) links: SlotMap<LinkId, Link>,
}

impl<P> Graph<P> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create an empty graph with room for the given number of nodes and links.
    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(nodes),
            links: SlotMap::with_capacity_and_key(links),
        }
    }

    /// Insert a detached node.
    pub fn insert_node(&mut self, flags: Flags, payload: P) -> NodeId {
        self.nodes.insert(ReactiveNode::new(flags, payload))
    }

    /// Remove a node from the graph.
    ///
    /// The host must have unlinked the node from both sides first; the
    /// engine never does this on its own.
    pub fn remove_node(&mut self, id: NodeId) -> Option<ReactiveNode<P>> {
        if let Some(node) = self.nodes.get(id) {
            debug_assert!(
                node.deps.is_none() && node.subs.is_none(),
                "removing node {id:?} that is still linked"
            );
        }
        self.nodes.remove(id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&ReactiveNode<P>> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ReactiveNode<P>> {
        self.nodes.get_mut(id)
    }

    /// Look up a link. Returns `None` once the link has been unlinked.
    pub fn get_link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of links in the graph.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Iterate over the links in `id`'s dependency list, head to tail.
    pub fn deps(&self, id: NodeId) -> Deps<'_, P> {
        Deps {
            graph: self,
            current: self.nodes.get(id).and_then(|node| node.deps),
        }
    }

    /// Iterate over the links in `id`'s subscriber list, head to tail.
    pub fn subs(&self, id: NodeId) -> Subs<'_, P> {
        Subs {
            graph: self,
            current: self.nodes.get(id).and_then(|node| node.subs),
        }
    }

    /// Check whether `link` still belongs to `sub`'s latest dependency set.
    pub fn is_valid_link(&self, link: LinkId, sub: NodeId) -> bool {
        match (self.links.get(link), self.nodes.get(sub)) {
            (Some(link), Some(node)) => link.sub == sub && link.dep_epoch == node.deps_epoch,
            _ => false,
        }
    }
}

impl<P> Default for Graph<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Index<NodeId> for Graph<P> {
    type Output = ReactiveNode<P>;

    fn index(&self, id: NodeId) -> &ReactiveNode<P> {
        &self.nodes[id]
    }
}

impl<P> IndexMut<NodeId> for Graph<P> {
    fn index_mut(&mut self, id: NodeId) -> &mut ReactiveNode<P> {
        &mut self.nodes[id]
    }
}

impl<P> Index<LinkId> for Graph<P> {
    type Output = Link;

    fn index(&self, id: LinkId) -> &Link {
        &self.links[id]
    }
}

/// Iterator over a node's dependency links.
///
/// Created by [`Graph::deps`].
#[derive(Debug)]
pub struct Deps<'a, P> {
    graph: &'a Graph<P>,
    current: Option<LinkId>,
}

impl<P> Iterator for Deps<'_, P> {
    type Item = LinkId;

    fn next(&mut self) -> Option<LinkId> {
        let id = self.current?;
        self.current = self.graph.links[id].next_dep;
        Some(id)
    }
}

/// Iterator over a node's subscriber links.
///
/// Created by [`Graph::subs`].
#[derive(Debug)]
pub struct Subs<'a, P> {
    graph: &'a Graph<P>,
    current: Option<LinkId>,
}

impl<P> Iterator for Subs<'_, P> {
    type Item = LinkId;

    fn next(&mut self) -> Option<LinkId> {
        let id = self.current?;
        self.current = self.graph.links[id].next_sub;
        Some(id)
    }
}
