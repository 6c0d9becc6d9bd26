//! Reactive Primitives
//!
//! This module implements a reference host for the engine: signals,
//! computeds, and effects on top of a [`Runtime`] that owns the graph.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a computed or effect), the signal
//! automatically registers that context as a dependent. When the signal's
//! value changes, all dependents are invalidated.
//!
//! ## Computeds
//!
//! A Computed is a derived value that caches its result. It re-evaluates only
//! when one of its dependencies changes, and only when someone asks for it.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are used to synchronize reactive state with
//! external systems.
//!
//! # Implementation Notes
//!
//! Handles are small `Copy` values; every operation takes the runtime
//! explicitly. Closures receive `&mut Runtime` and read other nodes through
//! it, which is how dependencies are discovered.

mod computed;
mod context;
mod effect;
mod runtime;
mod signal;
mod value;

pub use computed::{Computed, NodeState};
pub use context::TrackingContext;
pub use effect::Effect;
pub use runtime::{EffectFn, Getter, Runtime, RuntimeNode, RuntimeStats};
pub use signal::Signal;
pub use value::{AnyValue, Value};
