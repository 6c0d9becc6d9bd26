//! Reactive Engine
//!
//! The traversal algorithms that keep a [`Graph`] consistent: `link` and
//! `unlink` maintain edges while nodes evaluate, `propagate` pushes
//! invalidation downstream after a write, and `check_dirty` pulls validation
//! upstream before a read.
//!
//! # The host
//!
//! The engine has no idea what a node computes. Everything
//! role-specific is delegated to a [`Host`], which owns the graph and
//! answers three callbacks:
//!
//! - `update(node)`: recompute the node (or commit a signal's staged write)
//!   and report whether its value changed.
//! - `notify(node)`: a watching node was invalidated.
//! - `unwatched(node)`: the node just lost its last subscriber.
//!
//! Any `Host` automatically gets the engine entry points through
//! [`ReactiveSystem`]. For hosts that are just three closures around a graph,
//! see [`create_reactive_system`].
//!
//! # Host contract
//!
//! At the start of every evaluation of `node` the host must bump a global
//! `version` counter, bump `node.deps_epoch`, reset `node.deps_tail` to
//! `None`, and set `RECURSED_CHECK` (clearing `RECURSED`, `DIRTY` and
//! `PENDING`). Each read during the evaluation calls
//! `link(dep, node, version)`. Afterwards the host clears `RECURSED_CHECK`
//! and unlinks every link after `node.deps_tail`.
//!
//! # Threading
//!
//! Every call runs to completion on the calling thread. A graph must not be
//! shared between threads without external serialization.

mod callbacks;
mod check;
mod link;
mod propagate;

pub use callbacks::{create_reactive_system, CallbackHost};

use crate::graph::{Graph, LinkId, NodeId};

/// The owner of a reactive graph and the callbacks the engine calls into.
pub trait Host {
    /// Per-node data the host keeps next to the engine's bookkeeping.
    type Payload;

    fn graph(&self) -> &Graph<Self::Payload>;

    fn graph_mut(&mut self) -> &mut Graph<Self::Payload>;

    /// Recompute `node` and report whether its observable value changed.
    fn update(&mut self, node: NodeId) -> bool;

    /// A watching node was invalidated.
    fn notify(&mut self, node: NodeId);

    /// `node` lost its last subscriber.
    fn unwatched(&mut self, node: NodeId);
}

/// Engine entry points, available on every [`Host`].
pub trait ReactiveSystem: Host {
    /// Record that `sub` read `dep` during the evaluation tagged `version`.
    ///
    /// O(1). Reading the same dependency again in one pass does nothing,
    /// and a dependency read in the same position as in the previous pass
    /// reuses its existing link.
    fn link(&mut self, dep: NodeId, sub: NodeId, version: u64) {
        link::link(self.graph_mut(), dep, sub, version)
    }

    /// Remove `link` from both of its lists in O(1).
    ///
    /// Fires `unwatched` when this was the dependency's last subscriber.
    /// Returns the subscriber's next dependency link, so callers can remove
    /// a tail of links in a loop.
    fn unlink(&mut self, link: LinkId) -> Option<LinkId> {
        link::unlink(self, link)
    }

    /// Mark every subscriber reachable from `link` as pending and notify
    /// the watching ones, each at most once.
    fn propagate(&mut self, link: LinkId) {
        propagate::propagate(self, link)
    }

    /// Decide whether `sub` has to be recomputed, updating stale upstream
    /// nodes along the way. `link` is normally `sub`'s first dependency.
    fn check_dirty(&mut self, link: LinkId, sub: NodeId) -> bool {
        check::check_dirty(self, link, sub)
    }

    /// Promote the pending subscribers in the list starting at `link` to dirty.
    fn shallow_propagate(&mut self, link: LinkId) {
        propagate::shallow_propagate(self, link)
    }

    /// True if `link` belongs to `sub` and was confirmed by `sub`'s latest
    /// evaluation.
    fn is_valid_link(&self, link: LinkId, sub: NodeId) -> bool {
        self.graph().is_valid_link(link, sub)
    }
}

impl<H: Host + ?Sized> ReactiveSystem for H {}
