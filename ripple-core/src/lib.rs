//! Ripple Core
//!
//! This crate provides a fine-grained reactive dependency-tracking engine.
//! It implements:
//!
//! - A dependency graph with O(1) edge insertion and removal
//! - Push-pull invalidation: writes push `PENDING` downstream, reads pull
//!   validation upstream and recompute only what really changed
//! - A reference runtime with signals, computeds, and effects
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Nodes, links, flags, and the node factory
//! - `system`: The engine algorithms (`link`, `unlink`, `propagate`,
//!   `check_dirty`, `shallow_propagate`) and the [`Host`](system::Host)
//!   trait they call back into
//! - `reactive`: A host runtime with typed signal, computed, and effect handles
//! - `config`, `error`: Runtime configuration and the error type
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use ripple_core::reactive::Runtime;
//!
//! let mut rt = Runtime::new();
//!
//! // Create a signal
//! let count = rt.signal(0);
//!
//! // Create a derived value
//! let doubled = rt.computed(move |rt, _| count.get(rt) * 2);
//!
//! // Create an effect
//! let seen = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&seen);
//! rt.effect(move |rt| sink.set(doubled.get(rt)));
//!
//! // Update the signal; the effect runs before `set` returns
//! count.set(&mut rt, 5).unwrap();
//! assert_eq!(seen.get(), 10);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod system;

pub use config::RuntimeConfig;
pub use error::{ReactiveError, Result};
pub use graph::{Flags, Graph, LinkId, NodeId};
pub use reactive::{Computed, Effect, Runtime, Signal};
pub use system::{create_reactive_system, Host, ReactiveSystem};
