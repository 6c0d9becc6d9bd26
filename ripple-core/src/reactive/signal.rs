//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read inside a computed or an effect, the read is
//!    linked to that computation.
//!
//! 2. A write only stages the new value and marks the signal dirty.
//!    Subscribers are marked pending and watching effects are queued.
//!
//! 3. The staged value is committed by the next read, whether that read
//!    comes from user code or from a dirty check walking upstream. Writing
//!    a value equal to the staged one does nothing.
//!
//! # Handles
//!
//! [`Signal<T>`] is a `Copy` handle. The value itself lives in the
//! [`Runtime`], which every operation takes explicitly.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::Result;
use crate::graph::NodeId;
use crate::system::Host;

use super::value::{cast, wrap};
use super::Runtime;

/// A reactive signal holding a value of type `T`.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::Runtime;
///
/// let mut rt = Runtime::new();
/// let count = rt.signal(0);
///
/// count.set(&mut rt, 5).unwrap();
/// assert_eq!(count.get(&mut rt), 5);
///
/// count.update(&mut rt, |n| n + 1).unwrap();
/// assert_eq!(count.get(&mut rt), 6);
/// ```
pub struct Signal<T> {
    id: NodeId,
    marker: PhantomData<fn() -> T>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    pub(crate) fn from_id(id: NodeId) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    /// The graph node behind this signal.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the current value, subscribing the running computation.
    ///
    /// # Panics
    ///
    /// If the node is gone or holds a different type. See
    /// [`try_get`](Self::try_get).
    pub fn get(&self, rt: &mut Runtime) -> T {
        self.try_get(rt).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_get(&self, rt: &mut Runtime) -> Result<T> {
        let value = rt.read_signal(self.id)?;
        cast(self.id, &value)
    }

    /// Get the current value without subscribing to it.
    pub fn get_untracked(&self, rt: &mut Runtime) -> T {
        rt.untracked(|rt| self.get(rt))
    }

    /// Stage a new value and run the effects it invalidates.
    ///
    /// # Errors
    ///
    /// Fails if the signal is gone, or if the resulting effect flush hits
    /// its run limit. The write itself is kept in that case.
    pub fn set(&self, rt: &mut Runtime, value: T) -> Result<()> {
        rt.write_signal(self.id, wrap(value))
    }

    /// Replace the value with `f` applied to the current one.
    pub fn update(&self, rt: &mut Runtime, f: impl FnOnce(&T) -> T) -> Result<()> {
        let current = rt.untracked(|rt| self.try_get(rt))?;
        self.set(rt, f(&current))
    }

    /// How many computations currently depend on this signal.
    pub fn subscriber_count(&self, rt: &Runtime) -> usize {
        rt.graph().subs(self.id).count()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Signal<T> {}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Signal<T> {}

impl<T> Hash for Signal<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.id).finish()
    }
}
