// vim: tw=80
//! Dynamically typed arguments and return values
use std::{any, fmt, sync::Arc};

use downcast::{downcast, Any};

use crate::{Error, Result};

/// Anything that can be passed to, or returned from, a stubbed attribute.
///
/// There is a blanket implementation for every `'static` type that is
/// `Debug`, `PartialEq`, `Send` and `Sync`, so users will rarely implement
/// this trait themselves.
pub trait Argument: Any + fmt::Debug + Send + Sync {
    /// Compare with another argument of possibly different type.  Values of
    /// different types are never equal.
    fn dyn_eq(&self, other: &dyn Argument) -> bool;
}

downcast!(dyn Argument);

impl<T> Argument for T
    where T: any::Any + fmt::Debug + PartialEq + Send + Sync
{
    fn dyn_eq(&self, other: &dyn Argument) -> bool {
        other.downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

/// A shared, immutable [`Argument`].
///
/// Cloning a `Value` is cheap.  Wrapping a `Value` in another `Value` yields
/// the original.
#[derive(Clone)]
pub struct Value(Arc<dyn Argument>);

impl Value {
    pub fn new<T: Argument>(t: T) -> Self {
        if let Some(v) = (&t as &dyn any::Any).downcast_ref::<Value>() {
            return v.clone();
        }
        Value(Arc::new(t))
    }

    /// Is the wrapped value of type `T`?
    pub fn is<T: Argument>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn downcast_ref<T: Argument>(&self) -> Option<&T> {
        <dyn Argument>::downcast_ref::<T>(&*self.0).ok()
    }

    /// Clone the wrapped value out as a `T`.
    pub fn get<T: Argument + Clone>(&self) -> Result<T> {
        self.downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::Signature(format!(
                "expected a value of type {}, found {:?}",
                any::type_name::<T>(), self)))
    }

    /// Borrow the wrapped value as a string slice, if it is a `String` or a
    /// `&'static str`.
    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| self.downcast_ref::<&'static str>().copied())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}
