//! Computed Implementation
//!
//! A Computed is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Computeds Work
//!
//! 1. On first access, the computed runs its getter and caches the result.
//!    From then on it counts as a mutable node that others can depend on.
//!
//! 2. When an upstream signal is written, the computed is marked pending.
//!
//! 3. On the next access, it asks its dependencies whether any of them
//!    really changed, recomputing stale computeds further up first.
//!
//! 4. If an input changed, recompute. Otherwise, clear the pending mark and
//!    return the cache.
//!
//! A computed nobody reads is never recomputed. When its last subscriber
//! goes away it also drops its own dependencies and starts over on the next
//! read.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::Result;
use crate::graph::{Flags, NodeId};
use crate::system::Host;

use super::value::cast;
use super::Runtime;

/// Freshness of a computed, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Never evaluated.
    Unevaluated,

    /// The cached value is up to date.
    Clean,

    /// A dependency might have changed. Need to check.
    Pending,

    /// The computed definitely needs to recompute.
    Dirty,
}

impl NodeState {
    pub(crate) fn from_flags(flags: Flags) -> Self {
        if flags.contains(Flags::DIRTY) {
            NodeState::Dirty
        } else if flags.contains(Flags::PENDING) {
            NodeState::Pending
        } else if flags.contains(Flags::MUTABLE) {
            NodeState::Clean
        } else {
            NodeState::Unevaluated
        }
    }
}

/// A cached derived value of type `T`.
///
/// The getter receives the previous value, which lets it reuse work from
/// the last run. `PartialEq` on `T` decides whether a recomputation changed
/// anything: an equal result stops invalidation from spreading further.
pub struct Computed<T> {
    id: NodeId,
    marker: PhantomData<fn() -> T>,
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + 'static,
{
    pub(crate) fn from_id(id: NodeId) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the value, recomputing first if needed.
    ///
    /// # Panics
    ///
    /// If the node is gone, holds a different type, or is read during its
    /// own first evaluation. See [`try_get`](Self::try_get).
    pub fn get(&self, rt: &mut Runtime) -> T {
        self.try_get(rt).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_get(&self, rt: &mut Runtime) -> Result<T> {
        let value = rt.read_computed(self.id)?;
        cast(self.id, &value)
    }

    /// Get the value without subscribing to it.
    pub fn get_untracked(&self, rt: &mut Runtime) -> T {
        rt.untracked(|rt| self.get(rt))
    }

    /// Freshness of the cache. Does not recompute.
    pub fn state(&self, rt: &Runtime) -> Result<NodeState> {
        rt.computed_data(self.id)?;
        Ok(NodeState::from_flags(rt.graph()[self.id].flags))
    }

    pub fn subscriber_count(&self, rt: &Runtime) -> usize {
        rt.graph().subs(self.id).count()
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Computed<T> {}

impl<T> PartialEq for Computed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Computed<T> {}

impl<T> Hash for Computed<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Computed").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ReactiveError;

    #[test]
    fn computed_caches_value() {
        let mut rt = Runtime::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);

        let c = rt.computed(move |_, _| {
            counter.set(counter.get() + 1);
            42
        });

        assert_eq!(c.get(&mut rt), 42);
        assert_eq!(c.get(&mut rt), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn computed_is_lazy() {
        let mut rt = Runtime::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);

        let c = rt.computed(move |_, _| {
            counter.set(counter.get() + 1);
            0
        });

        assert_eq!(calls.get(), 0);
        assert_eq!(c.state(&rt).unwrap(), NodeState::Unevaluated);
        assert_eq!(rt.graph()[c.id()].flags, Flags::NONE);
    }

    #[test]
    fn first_read_makes_it_mutable() {
        let mut rt = Runtime::new();
        let c = rt.computed(|_, _| "ready");

        c.get(&mut rt);

        assert_eq!(rt.graph()[c.id()].flags, Flags::MUTABLE);
        assert_eq!(c.state(&rt).unwrap(), NodeState::Clean);
    }

    #[test]
    fn write_marks_pending_then_read_recomputes() {
        let mut rt = Runtime::new();
        let s = rt.signal(2);
        let square = rt.computed(move |rt, _| {
            let n = s.get(rt);
            n * n
        });
        assert_eq!(square.get(&mut rt), 4);

        s.set(&mut rt, 3).unwrap();
        assert_eq!(square.state(&rt).unwrap(), NodeState::Pending);

        assert_eq!(square.get(&mut rt), 9);
        assert_eq!(square.state(&rt).unwrap(), NodeState::Clean);
    }

    #[test]
    fn getter_sees_previous_value() {
        let mut rt = Runtime::new();
        let s = rt.signal(1);
        let total = rt.computed(move |rt, previous: Option<&i32>| {
            previous.copied().unwrap_or(0) + s.get(rt)
        });

        assert_eq!(total.get(&mut rt), 1);
        s.set(&mut rt, 10).unwrap();
        assert_eq!(total.get(&mut rt), 11);
    }

    #[test]
    fn reading_itself_on_first_run_is_circular() {
        let mut rt = Runtime::new();
        let slot: Rc<Cell<Option<Computed<i32>>>> = Rc::new(Cell::new(None));
        let inner = Rc::clone(&slot);
        let circular = Rc::new(Cell::new(false));
        let flag = Rc::clone(&circular);

        let c = rt.computed(move |rt, _| match inner.get() {
            Some(me) => match me.try_get(rt) {
                Err(ReactiveError::CircularDependency(_)) => {
                    flag.set(true);
                    -1
                }
                other => other.map_or(0, |v| v + 1),
            },
            None => 0,
        });
        slot.set(Some(c));

        assert_eq!(c.get(&mut rt), -1);
        assert!(circular.get());
        assert_eq!(rt.graph().deps(c.id()).count(), 0);
    }
}
