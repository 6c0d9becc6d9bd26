//! A [`Host`] assembled from three closures.

use std::fmt;

use super::Host;
use crate::graph::{Graph, NodeId};

/// A host that owns a graph and forwards the engine callbacks to closures.
///
/// Each closure receives the graph and the node in question. The closures
/// cannot call back into the engine; hosts that recompute by evaluating
/// other nodes should implement [`Host`] themselves.
pub struct CallbackHost<P, U, N, W> {
    graph: Graph<P>,
    update: U,
    notify: N,
    unwatched: W,
}

/// Build a reactive system over `graph` with the given callbacks.
pub fn create_reactive_system<P, U, N, W>(
    graph: Graph<P>,
    update: U,
    notify: N,
    unwatched: W,
) -> CallbackHost<P, U, N, W>
where
    U: FnMut(&mut Graph<P>, NodeId) -> bool,
    N: FnMut(&mut Graph<P>, NodeId),
    W: FnMut(&mut Graph<P>, NodeId),
{
    CallbackHost {
        graph,
        update,
        notify,
        unwatched,
    }
}

impl<P, U, N, W> CallbackHost<P, U, N, W> {
    /// Give the graph back, dropping the callbacks.
    pub fn into_graph(self) -> Graph<P> {
        self.graph
    }
}

impl<P, U, N, W> Host for CallbackHost<P, U, N, W>
where
    U: FnMut(&mut Graph<P>, NodeId) -> bool,
    N: FnMut(&mut Graph<P>, NodeId),
    W: FnMut(&mut Graph<P>, NodeId),
{
    type Payload = P;

    fn graph(&self) -> &Graph<P> {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut Graph<P> {
        &mut self.graph
    }

    fn update(&mut self, node: NodeId) -> bool {
        (self.update)(&mut self.graph, node)
    }

    fn notify(&mut self, node: NodeId) {
        (self.notify)(&mut self.graph, node)
    }

    fn unwatched(&mut self, node: NodeId) {
        (self.unwatched)(&mut self.graph, node)
    }
}

impl<P, U, N, W> fmt::Debug for CallbackHost<P, U, N, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHost")
            .field("node_count", &self.graph.node_count())
            .field("link_count", &self.graph.link_count())
            .finish()
    }
}
