//! Node Factory
//!
//! Builds the three node roles on top of the base [`ReactiveNode`]. The
//! engine does not care which role a node plays; only the flags chosen here
//! differ.

use super::flags::Flags;
use super::node::NodeId;
use super::Graph;

/// Payload of a source node.
#[derive(Debug, Clone)]
pub struct SignalNode<V> {
    /// The value readers currently see.
    pub current_value: V,

    /// The last written value, committed by the host's `update`.
    pub pending_value: V,
}

/// Payload of a derived node.
#[derive(Debug, Clone)]
pub struct ComputedNode<V, G> {
    /// Cached result of the last evaluation (`None` before the first one).
    pub value: Option<V>,

    pub getter: G,
}

/// Payload of a side-effect node.
#[derive(Debug, Clone)]
pub struct EffectNode<F> {
    pub run: F,
}

/// The stock node roles.
#[derive(Debug, Clone)]
pub enum NodeKind<V, G, F> {
    Signal(SignalNode<V>),
    Computed(ComputedNode<V, G>),
    Effect(EffectNode<F>),
}

impl<V, G, F> NodeKind<V, G, F> {
    /// Short role name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Signal(_) => "signal",
            NodeKind::Computed(_) => "computed",
            NodeKind::Effect(_) => "effect",
        }
    }

    pub fn as_signal(&self) -> Option<&SignalNode<V>> {
        match self {
            NodeKind::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn as_signal_mut(&mut self) -> Option<&mut SignalNode<V>> {
        match self {
            NodeKind::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn as_computed(&self) -> Option<&ComputedNode<V, G>> {
        match self {
            NodeKind::Computed(computed) => Some(computed),
            _ => None,
        }
    }

    pub fn as_computed_mut(&mut self) -> Option<&mut ComputedNode<V, G>> {
        match self {
            NodeKind::Computed(computed) => Some(computed),
            _ => None,
        }
    }

    pub fn as_effect(&self) -> Option<&EffectNode<F>> {
        match self {
            NodeKind::Effect(effect) => Some(effect),
            _ => None,
        }
    }
}

impl<V: Clone, G, F> Graph<NodeKind<V, G, F>> {
    /// Create a signal holding `initial` as both its current and pending value.
    pub fn create_signal_node(&mut self, initial: V) -> NodeId {
        let payload = NodeKind::Signal(SignalNode {
            current_value: initial.clone(),
            pending_value: initial,
        });
        self.insert_node(Flags::MUTABLE, payload)
    }

    /// Create a computed that has never been evaluated.
    ///
    /// The node starts with no flags at all. The host marks it `MUTABLE` on
    /// its first evaluation; until then nothing can have subscribed to it.
    pub fn create_computed_node(&mut self, getter: G) -> NodeId {
        let payload = NodeKind::Computed(ComputedNode {
            value: None,
            getter,
        });
        self.insert_node(Flags::NONE, payload)
    }

    /// Create an effect. Effects always watch and always guard against
    /// re-entering themselves while they collect dependencies.
    pub fn create_effect_node(&mut self, run: F) -> NodeId {
        let payload = NodeKind::Effect(EffectNode { run });
        self.insert_node(Flags::WATCHING | Flags::RECURSED_CHECK, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestGraph = Graph<NodeKind<i32, fn() -> i32, fn()>>;

    #[test]
    fn signal_starts_mutable_with_both_values() {
        let mut graph = TestGraph::new();
        let id = graph.create_signal_node(7);

        let node = &graph[id];
        assert_eq!(node.flags, Flags::MUTABLE);
        let signal = node.payload.as_signal().expect("signal payload");
        assert_eq!(signal.current_value, 7);
        assert_eq!(signal.pending_value, 7);
    }

    #[test]
    fn computed_starts_without_flags() {
        let mut graph = TestGraph::new();
        let id = graph.create_computed_node(|| 1);

        let node = &graph[id];
        assert_eq!(node.flags, Flags::NONE);
        assert!(node.payload.as_computed().expect("computed").value.is_none());
        assert_eq!(node.payload.name(), "computed");
    }

    #[test]
    fn effect_starts_watching_and_guarded() {
        let mut graph = TestGraph::new();
        let id = graph.create_effect_node(|| {});

        assert_eq!(graph[id].flags, Flags::WATCHING | Flags::RECURSED_CHECK);
        assert!(graph[id].payload.as_effect().is_some());
    }
}
