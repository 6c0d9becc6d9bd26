//! Reactive Runtime
//!
//! The runtime owns the graph and connects signals, computeds, and effects
//! to the engine in [`crate::system`]. It is the engine's [`Host`]: it knows
//! how to recompute each kind of node, and it keeps the queue of effects
//! waiting to run.
//!
//! # How It Works
//!
//! 1. Writing a signal stages the new value, marks the signal dirty, and
//!    propagates `PENDING` to everything downstream. Watching effects are
//!    queued as they are reached.
//!
//! 2. The queue is flushed right away. Each queued effect asks the engine
//!    whether any of its inputs really changed, recomputing stale computeds
//!    on the way, and only runs if one did.
//!
//! 3. Computeds are lazy: nothing recomputes them until somebody reads them
//!    or an effect's dirty check walks through them.
//!
//! # Threading
//!
//! A runtime is confined to the thread that created it. Node values are
//! reference counted with `Rc`, so the type is neither `Send` nor `Sync`.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::RuntimeConfig;
use crate::error::{ReactiveError, Result};
use crate::graph::{ComputedNode, Flags, Graph, GraphSnapshot, NodeId, NodeKind, SignalNode};
use crate::system::{Host, ReactiveSystem};

use super::context::TrackingContext;
use super::value::{same, wrap, Value};
use super::{Computed, Effect, Signal};

/// Recomputes a computed from its previous value.
pub type Getter = Rc<dyn Fn(&mut Runtime, Option<&Value>) -> Value>;

/// The body of an effect.
pub type EffectFn = Rc<dyn Fn(&mut Runtime)>;

/// The payload every runtime node carries.
pub type RuntimeNode = NodeKind<Value, Getter, EffectFn>;

/// Counters for the work the runtime has done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// Staged signal writes that were committed.
    pub commits: u64,
    /// Computed getter invocations.
    pub recomputes: u64,
    /// Effects queued by propagation.
    pub notifies: u64,
    /// Effect bodies executed, including the first run.
    pub effect_runs: u64,
}

/// A single-threaded reactive runtime.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::Runtime;
///
/// let mut rt = Runtime::new();
/// let count = rt.signal(1);
/// let doubled = rt.computed(move |rt, _| count.get(rt) * 2);
///
/// assert_eq!(doubled.get(&mut rt), 2);
/// count.set(&mut rt, 5).unwrap();
/// assert_eq!(doubled.get(&mut rt), 10);
/// ```
pub struct Runtime {
    pub(crate) graph: Graph<RuntimeNode>,
    pub(crate) context: TrackingContext,
    queue: VecDeque<NodeId>,
    flushing: bool,
    stats: RuntimeStats,
    config: RuntimeConfig,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        debug!(?config, "creating runtime");
        Self {
            graph: Graph::with_capacity(config.node_capacity, config.link_capacity),
            context: TrackingContext::default(),
            queue: VecDeque::with_capacity(config.effect_queue_capacity),
            flushing: false,
            stats: RuntimeStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Effects waiting for the next flush.
    pub fn pending_effects(&self) -> usize {
        self.queue.len()
    }

    /// A serializable picture of the current graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    /// Create a signal holding `initial`.
    pub fn signal<T>(&mut self, initial: T) -> Signal<T>
    where
        T: Clone + PartialEq + 'static,
    {
        let id = self.graph.create_signal_node(wrap(initial));
        trace!(?id, "signal created");
        Signal::from_id(id)
    }

    /// Create a computed value.
    ///
    /// The getter receives the previous value (`None` on the first run) and
    /// is not called until the computed is first read.
    pub fn computed<T, F>(&mut self, getter: F) -> Computed<T>
    where
        T: Clone + PartialEq + 'static,
        F: Fn(&mut Runtime, Option<&T>) -> T + 'static,
    {
        let getter: Getter = Rc::new(move |rt: &mut Runtime, previous: Option<&Value>| {
            let previous = previous.and_then(|value| value.as_any().downcast_ref::<T>());
            wrap(getter(rt, previous))
        });
        let id = self.graph.create_computed_node(getter);
        trace!(?id, "computed created");
        Computed::from_id(id)
    }

    /// Create an effect and run it once to collect its dependencies.
    ///
    /// An effect created while another computation is running is owned by
    /// it: the owner's next run replaces it, and disposing the owner
    /// disposes it too.
    pub fn effect<F>(&mut self, run: F) -> Effect
    where
        F: Fn(&mut Runtime) + 'static,
    {
        let run: EffectFn = Rc::new(run);
        let id = self.graph.create_effect_node(run);
        if let Some(owner) = self.context.active_sub() {
            if self.graph.contains_node(owner) {
                let version = self.context.version();
                self.link(id, owner, version);
            }
        }
        self.run_effect(id);
        Effect::from_id(id)
    }

    /// Run every queued effect whose inputs actually changed.
    ///
    /// Effects queued while flushing run in the same flush. Returns the
    /// number of effects that ran. A flush already in progress further up
    /// the stack picks up new work itself, so a nested call returns `Ok(0)`.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::FlushLimitExceeded`] when more than
    /// `max_flush_runs` effects run in one flush. The remaining queue is
    /// dropped and those effects go back to plain watching, so the next
    /// write that reaches them queues them again.
    pub fn flush(&mut self) -> Result<usize> {
        if self.flushing {
            return Ok(0);
        }
        self.flushing = true;
        let result = self.drain_queue();
        self.flushing = false;
        result
    }

    fn drain_queue(&mut self) -> Result<usize> {
        let limit = self.config.max_flush_runs;
        let mut runs = 0;

        while let Some(id) = self.queue.pop_front() {
            let Some(node) = self.graph.node_mut(id) else {
                continue;
            };
            node.flags.insert(Flags::WATCHING);
            let flags = node.flags;

            if !(flags.contains(Flags::DIRTY)
                || (flags.contains(Flags::PENDING) && self.check_pending(id)))
            {
                continue;
            }

            if runs == limit {
                let dropped = self.queue.len() + 1;
                self.queue.push_front(id);
                self.abandon_queue();
                warn!(limit, dropped, "effect flush limit exceeded");
                return Err(ReactiveError::FlushLimitExceeded { limit });
            }
            self.run_effect(id);
            runs += 1;
        }

        if runs > 0 {
            debug!(runs, "flushed effects");
        }
        Ok(runs)
    }

    /// Drop the queued effects without running them. Their stale marks are
    /// cleared, so the next write that reaches them queues them again.
    fn abandon_queue(&mut self) {
        for id in self.queue.drain(..) {
            if let Some(node) = self.graph.node_mut(id) {
                node.flags = Flags::WATCHING;
            }
        }
    }

    pub(crate) fn signal_data(&self, id: NodeId) -> Result<&SignalNode<Value>> {
        self.graph
            .node(id)
            .ok_or(ReactiveError::Disposed(id))?
            .payload
            .as_signal()
            .ok_or(ReactiveError::TypeMismatch { node: id, expected: "signal" })
    }

    fn signal_data_mut(&mut self, id: NodeId) -> Result<&mut SignalNode<Value>> {
        self.graph
            .node_mut(id)
            .ok_or(ReactiveError::Disposed(id))?
            .payload
            .as_signal_mut()
            .ok_or(ReactiveError::TypeMismatch { node: id, expected: "signal" })
    }

    pub(crate) fn computed_data(&self, id: NodeId) -> Result<&ComputedNode<Value, Getter>> {
        self.graph
            .node(id)
            .ok_or(ReactiveError::Disposed(id))?
            .payload
            .as_computed()
            .ok_or(ReactiveError::TypeMismatch { node: id, expected: "computed" })
    }

    fn computed_data_mut(&mut self, id: NodeId) -> Result<&mut ComputedNode<Value, Getter>> {
        self.graph
            .node_mut(id)
            .ok_or(ReactiveError::Disposed(id))?
            .payload
            .as_computed_mut()
            .ok_or(ReactiveError::TypeMismatch { node: id, expected: "computed" })
    }

    /// Read a signal, committing a staged write first.
    pub(crate) fn read_signal(&mut self, id: NodeId) -> Result<Value> {
        self.signal_data(id)?;

        if self.graph[id].flags.contains(Flags::DIRTY) && self.update_signal(id) {
            if let Some(subs) = self.graph[id].subs {
                self.shallow_propagate(subs);
            }
        }
        self.track(id);
        Ok(Rc::clone(&self.signal_data(id)?.current_value))
    }

    /// Stage a write and flush the effects it invalidates.
    pub(crate) fn write_signal(&mut self, id: NodeId, value: Value) -> Result<()> {
        let signal = self.signal_data_mut(id)?;
        if same(&signal.pending_value, &value) {
            return Ok(());
        }
        signal.pending_value = value;

        let node = &mut self.graph[id];
        node.flags = Flags::MUTABLE | Flags::DIRTY;
        trace!(?id, "signal written");

        if let Some(subs) = node.subs {
            self.propagate(subs);
            self.flush()?;
        }
        Ok(())
    }

    /// Read a computed, bringing it up to date first.
    pub(crate) fn read_computed(&mut self, id: NodeId) -> Result<Value> {
        self.computed_data(id)?;

        let flags = self.graph[id].flags;
        let stale = flags.is_empty()
            || flags.contains(Flags::DIRTY)
            || (flags.contains(Flags::PENDING) && self.check_pending(id));
        if stale && self.update_computed(id) {
            if let Some(subs) = self.graph[id].subs {
                self.shallow_propagate(subs);
            }
        }
        self.track(id);

        self.computed_data(id)?
            .value
            .clone()
            .ok_or(ReactiveError::CircularDependency(id))
    }

    /// Dispose an effect, detaching it from its owner if it has one.
    pub(crate) fn dispose_effect(&mut self, id: NodeId) -> Result<()> {
        let node = self.graph.node(id).ok_or(ReactiveError::Disposed(id))?;
        if node.payload.as_effect().is_none() {
            return Err(ReactiveError::TypeMismatch { node: id, expected: "effect" });
        }

        // Dropping the last owner link fires `unwatched`, which releases it.
        while let Some(link) = self.graph.node(id).and_then(|node| node.subs) {
            self.unlink(link);
        }
        if self.graph.contains_node(id) {
            self.release_effect(id);
        }
        debug!(?id, "effect disposed");
        Ok(())
    }

    /// Drop an effect's dependencies (and owned effects) and remove it.
    fn release_effect(&mut self, id: NodeId) {
        self.unlink_all_deps(id);
        self.queue.retain(|&queued| queued != id);
        self.graph.remove_node(id);
    }

    /// Resolve a `PENDING` node: true if it must recompute, otherwise the
    /// flag is cleared.
    fn check_pending(&mut self, id: NodeId) -> bool {
        let dirty = match self.graph[id].deps {
            Some(first) => self.check_dirty(first, id),
            None => false,
        };
        if !dirty {
            if let Some(node) = self.graph.node_mut(id) {
                node.flags.remove(Flags::PENDING);
            }
        }
        dirty
    }

    /// Commit a staged signal write. True if the visible value changed.
    fn update_signal(&mut self, id: NodeId) -> bool {
        self.graph[id].flags = Flags::MUTABLE;
        let Ok(signal) = self.signal_data_mut(id) else {
            return false;
        };
        let changed = !same(&signal.current_value, &signal.pending_value);
        signal.current_value = Rc::clone(&signal.pending_value);
        self.stats.commits += 1;
        changed
    }

    /// Re-run a computed's getter. True if the cached value changed.
    fn update_computed(&mut self, id: NodeId) -> bool {
        let Ok(computed) = self.computed_data(id) else {
            return false;
        };
        let getter = Rc::clone(&computed.getter);
        let previous = computed.value.clone();

        let outer = self.start_tracking(id, Flags::MUTABLE);
        let value = getter(self, previous.as_ref());
        self.end_tracking(id, outer);
        self.stats.recomputes += 1;
        trace!(?id, "computed updated");

        let changed = previous.map_or(true, |previous| !same(&previous, &value));
        if let Ok(computed) = self.computed_data_mut(id) {
            computed.value = Some(value);
        }
        changed
    }

    fn run_effect(&mut self, id: NodeId) {
        let Some(run) = self
            .graph
            .node(id)
            .and_then(|node| node.payload.as_effect())
            .map(|effect| Rc::clone(&effect.run))
        else {
            return;
        };

        let outer = self.start_tracking(id, Flags::WATCHING);
        run(self);
        self.end_tracking(id, outer);
        self.stats.effect_runs += 1;
    }

    fn unlink_all_deps(&mut self, id: NodeId) {
        let mut cursor = self.graph[id].deps;
        while let Some(link) = cursor {
            cursor = self.unlink(link);
        }
    }
}

impl Host for Runtime {
    type Payload = RuntimeNode;

    fn graph(&self) -> &Graph<RuntimeNode> {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut Graph<RuntimeNode> {
        &mut self.graph
    }

    fn update(&mut self, node: NodeId) -> bool {
        let Some(entry) = self.graph.node(node) else {
            return false;
        };
        match entry.payload {
            NodeKind::Signal(_) => self.update_signal(node),
            NodeKind::Computed(_) => self.update_computed(node),
            NodeKind::Effect(_) => false,
        }
    }

    fn notify(&mut self, node: NodeId) {
        self.graph[node].flags.remove(Flags::WATCHING);
        self.queue.push_back(node);
        self.stats.notifies += 1;
        trace!(?node, queued = self.queue.len(), "effect queued");
    }

    fn unwatched(&mut self, node: NodeId) {
        let Some(entry) = self.graph.node(node) else {
            return;
        };
        let has_deps = entry.deps.is_some();

        match entry.payload {
            // An unobserved computed lets go of its inputs and recomputes
            // from scratch on the next read.
            NodeKind::Computed(_) if has_deps => {
                self.unlink_all_deps(node);
                self.graph[node].flags = Flags::MUTABLE | Flags::DIRTY;
                debug!(?node, "computed unwatched");
            }
            // Only owned effects have subscribers; losing the owner ends them.
            NodeKind::Effect(_) => {
                self.release_effect(node);
                debug!(?node, "owned effect released");
            }
            NodeKind::Computed(_) | NodeKind::Signal(_) => {}
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("nodes", &self.graph.node_count())
            .field("links", &self.graph.link_count())
            .field("queued", &self.queue.len())
            .field("flushing", &self.flushing)
            .field("stats", &self.stats)
            .finish()
    }
}
