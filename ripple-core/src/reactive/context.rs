//! Reactive Context
//!
//! The reactive context tracks which computation is currently running, so
//! that a read can link the node being read to the node reading it.
//!
//! # Implementation
//!
//! Every evaluation is bracketed by [`Runtime::start_tracking`] and
//! [`Runtime::end_tracking`]. Starting bumps the global version, which tags
//! every link made during the pass, and rewinds the node's dependency cursor.
//! Ending restores the previous subscriber and drops the links the pass did
//! not confirm.
//!
//! Nested evaluations (a computed read inside an effect) simply save and
//! restore the previous subscriber on the Rust stack.

use crate::graph::{Flags, NodeId};
use crate::system::ReactiveSystem;

use super::Runtime;

/// The currently running computation and the version of its pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrackingContext {
    active_sub: Option<NodeId>,
    version: u64,
}

impl TrackingContext {
    /// The node whose reads are being recorded, if any.
    pub fn active_sub(&self) -> Option<NodeId> {
        self.active_sub
    }

    /// Version tag of the evaluation pass in progress.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the active subscriber, returning the previous one.
    pub(crate) fn set_active_sub(&mut self, sub: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.active_sub, sub)
    }

    pub(crate) fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}

impl Runtime {
    /// Begin an evaluation pass of `node` in the given role
    /// (`MUTABLE` for computeds, `WATCHING` for effects).
    ///
    /// Returns the subscriber that was active before, to hand back to
    /// [`end_tracking`](Self::end_tracking).
    pub(crate) fn start_tracking(&mut self, node: NodeId, role: Flags) -> Option<NodeId> {
        self.context.next_version();

        let entry = &mut self.graph[node];
        entry.deps_epoch += 1;
        entry.deps_tail = None;
        entry.flags = role | Flags::RECURSED_CHECK;

        self.context.set_active_sub(Some(node))
    }

    /// Finish the pass started by [`start_tracking`](Self::start_tracking).
    ///
    /// Links past the dependency cursor were not read this time and are
    /// removed. A node disposed mid-pass is left alone.
    pub(crate) fn end_tracking(&mut self, node: NodeId, previous: Option<NodeId>) {
        self.context.set_active_sub(previous);

        let Some(entry) = self.graph.node_mut(node) else {
            return;
        };
        entry.flags.remove(Flags::RECURSED_CHECK);

        let (tail, head) = (entry.deps_tail, entry.deps);
        let mut stale = match tail {
            Some(tail) => self.graph[tail].next_dep(),
            None => head,
        };
        while let Some(link) = stale {
            stale = self.unlink(link);
        }
    }

    /// Link `dep` to the running computation, if there is one.
    pub(crate) fn track(&mut self, dep: NodeId) {
        let Some(sub) = self.context.active_sub() else {
            return;
        };
        // A computed peeking at its own cached value is not a dependency.
        if sub == dep || !self.graph.contains_node(sub) {
            return;
        }
        let version = self.context.version();
        self.link(dep, sub, version);
    }

    /// Run `f` with dependency tracking switched off.
    ///
    /// Reads inside `f` return current values but do not subscribe the
    /// running computation to them.
    pub fn untracked<R>(&mut self, f: impl FnOnce(&mut Runtime) -> R) -> R {
        let previous = self.context.set_active_sub(None);
        let result = f(self);
        self.context.set_active_sub(previous);
        result
    }

    pub fn context(&self) -> TrackingContext {
        self.context
    }
}
