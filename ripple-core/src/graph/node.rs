//! Graph Nodes
//!
//! This module defines the node and edge types that live in the dependency
//! graph.
//!
//! A [`Link`] is a member of two lists at once: the subscriber's dependency
//! list (`prev_dep`/`next_dep`) and the dependency's subscriber list
//! (`prev_sub`/`next_sub`). Both lists are doubly linked through
//! [`LinkId`]s, so inserting or removing an edge never walks a list.

use slotmap::new_key_type;

use super::flags::Flags;

new_key_type! {
    /// Generation-checked handle to a node in a [`Graph`](super::Graph).
    pub struct NodeId;

    /// Generation-checked handle to an edge in a [`Graph`](super::Graph).
    pub struct LinkId;
}

/// A node in the dependency graph.
///
/// The payload `P` carries whatever the host needs for the node's role
/// (see [`NodeKind`](super::NodeKind) for the stock signal, computed and
/// effect variants). The engine only ever touches the list heads, the flags
/// and the epoch.
#[derive(Debug)]
pub struct ReactiveNode<P> {
    /// First entry of the list of nodes this node reads from.
    pub deps: Option<LinkId>,

    /// Last dependency confirmed in the current tracking pass.
    pub deps_tail: Option<LinkId>,

    /// First entry of the list of nodes reading from this node.
    pub subs: Option<LinkId>,

    pub subs_tail: Option<LinkId>,

    pub flags: Flags,

    /// Bumped by the host at the start of every tracking pass.
    pub deps_epoch: u64,

    pub payload: P,
}

impl<P> ReactiveNode<P> {
    /// Create a detached node with the given flags.
    pub fn new(flags: Flags, payload: P) -> Self {
        Self {
            deps: None,
            deps_tail: None,
            subs: None,
            subs_tail: None,
            flags,
            deps_epoch: 0,
            payload,
        }
    }

    /// True when some node reads from this one.
    pub fn has_subscribers(&self) -> bool {
        self.subs.is_some()
    }

    /// True when this node reads from some other node.
    pub fn has_dependencies(&self) -> bool {
        self.deps.is_some()
    }
}

/// An edge from a dependency to one of its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub(crate) dep: NodeId,
    pub(crate) sub: NodeId,

    pub(crate) prev_sub: Option<LinkId>,
    pub(crate) next_sub: Option<LinkId>,
    pub(crate) prev_dep: Option<LinkId>,
    pub(crate) next_dep: Option<LinkId>,

    /// Host pass tag recorded by the last `link` call that touched this edge.
    pub(crate) version: u64,

    /// The subscriber's `deps_epoch` when this edge was last confirmed.
    pub(crate) dep_epoch: u64,
}

impl Link {
    /// The node being read.
    pub fn dep(&self) -> NodeId {
        self.dep
    }

    /// The node doing the reading.
    pub fn sub(&self) -> NodeId {
        self.sub
    }

    pub fn prev_sub(&self) -> Option<LinkId> {
        self.prev_sub
    }

    pub fn next_sub(&self) -> Option<LinkId> {
        self.next_sub
    }

    pub fn prev_dep(&self) -> Option<LinkId> {
        self.prev_dep
    }

    pub fn next_dep(&self) -> Option<LinkId> {
        self.next_dep
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn dep_epoch(&self) -> u64 {
        self.dep_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_detached() {
        let node = ReactiveNode::new(Flags::MUTABLE, ());

        assert!(!node.has_subscribers());
        assert!(!node.has_dependencies());
        assert!(node.deps_tail.is_none());
        assert!(node.subs_tail.is_none());
        assert_eq!(node.deps_epoch, 0);
        assert_eq!(node.flags, Flags::MUTABLE);
    }

    #[test]
    fn default_ids_are_null() {
        use slotmap::Key;

        assert!(NodeId::default().is_null());
        assert!(LinkId::default().is_null());
    }
}
