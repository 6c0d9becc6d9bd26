//! Type-erased node values.
//!
//! The graph stores every value behind `Rc<dyn AnyValue>`. The runtime uses
//! `PartialEq` on the concrete type to decide whether a write or a
//! recomputation actually changed anything.

use std::any::{self, Any};
use std::rc::Rc;

use crate::error::{ReactiveError, Result};
use crate::graph::NodeId;

/// A value that can be stored in a node and compared with another one.
pub trait AnyValue: Any {
    fn as_any(&self) -> &dyn Any;

    /// Equal when `other` has the same concrete type and compares equal.
    fn dyn_eq(&self, other: &dyn AnyValue) -> bool;

    fn type_name(&self) -> &'static str;
}

impl<T: PartialEq + 'static> AnyValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn AnyValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// A shared, type-erased node value.
pub type Value = Rc<dyn AnyValue>;

pub(crate) fn wrap<T: PartialEq + 'static>(value: T) -> Value {
    Rc::new(value)
}

/// Whether two stored values are interchangeable for readers.
pub(crate) fn same(a: &Value, b: &Value) -> bool {
    Rc::ptr_eq(a, b) || a.dyn_eq(&**b)
}

/// Clone the concrete `T` out of a value stored in `node`.
pub(crate) fn cast<T: Clone + 'static>(node: NodeId, value: &Value) -> Result<T> {
    value
        .as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or(ReactiveError::TypeMismatch {
            node,
            expected: any::type_name::<T>(),
        })
}
