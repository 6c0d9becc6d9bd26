//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When a dependency is invalidated, the effect is queued. It stops
//!    watching until it has been flushed, so it is queued at most once.
//!
//! 3. At flush time the effect re-runs only if one of its inputs actually
//!    changed. Each run records its dependencies afresh, and whatever it
//!    stopped reading is unsubscribed.
//!
//! # Differences from Computed
//!
//! - Computeds return a value; effects do not.
//! - Computeds are lazy (compute on access); effects are eager (run when deps change).
//! - Nothing can depend on an effect.

use crate::error::Result;
use crate::graph::NodeId;
use crate::system::Host;

use super::Runtime;

/// A handle to a side-effecting computation.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use ripple_core::reactive::Runtime;
///
/// let mut rt = Runtime::new();
/// let count = rt.signal(0);
/// let seen = Rc::new(Cell::new(0));
///
/// let sink = Rc::clone(&seen);
/// let effect = rt.effect(move |rt| sink.set(count.get(rt)));
///
/// count.set(&mut rt, 3).unwrap();
/// assert_eq!(seen.get(), 3);
///
/// effect.dispose(&mut rt).unwrap();
/// count.set(&mut rt, 4).unwrap();
/// assert_eq!(seen.get(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    id: NodeId,
}

impl Effect {
    pub(crate) fn from_id(id: NodeId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Stop the effect for good and release its dependencies.
    ///
    /// # Errors
    ///
    /// [`Disposed`](crate::error::ReactiveError::Disposed) if it was
    /// already disposed.
    pub fn dispose(&self, rt: &mut Runtime) -> Result<()> {
        rt.dispose_effect(self.id)
    }

    pub fn is_disposed(&self, rt: &Runtime) -> bool {
        !rt.graph().contains_node(self.id)
    }

    /// Number of dependency links from its last run, owned effects included.
    pub fn dependency_count(&self, rt: &Runtime) -> usize {
        if self.is_disposed(rt) {
            return 0;
        }
        rt.graph().deps(self.id).count()
    }
}
