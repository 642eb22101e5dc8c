// vim: tw=80
use std::{any, collections::BTreeMap, fmt};

use crate::{Argument, Error, Result, Value};

/// The arguments of a single invocation of a stubbed attribute.
///
/// A `Call` is immutable once built.  Use [`call!`](crate::call) to build
/// one inline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Call {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl Call {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a call from already-collected positional and keyword arguments.
    pub fn like<A, K, S>(args: A, kwargs: K) -> Self
        where A: IntoIterator<Item=Value>,
              K: IntoIterator<Item=(S, Value)>,
              S: Into<String>
    {
        Call {
            args: args.into_iter().collect(),
            kwargs: kwargs.into_iter().map(|(k, v)| (k.into(), v)).collect()
        }
    }

    /// Append a positional argument.
    pub fn arg<T: Argument>(mut self, t: T) -> Self {
        self.args.push(Value::new(t));
        self
    }

    /// Add a keyword argument.
    pub fn kwarg<T: Argument>(mut self, name: &str, t: T) -> Self {
        self.kwargs.insert(name.to_owned(), Value::new(t));
        self
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.kwargs
    }

    /// Borrow positional argument `i` as a `T`.
    pub fn positional<T: Argument>(&self, i: usize) -> Result<&T> {
        let v = self.args.get(i)
            .ok_or_else(|| Error::Signature(format!(
                "no positional argument {} in {}", i, self)))?;
        v.downcast_ref::<T>()
            .ok_or_else(|| Error::Signature(format!(
                "positional argument {} is {:?}, not a {}",
                i, v, any::type_name::<T>())))
    }

    /// Borrow keyword argument `name` as a `T`.
    pub fn keyword<T: Argument>(&self, name: &str) -> Result<&T> {
        let v = self.kwargs.get(name)
            .ok_or_else(|| Error::Signature(format!(
                "no keyword argument {} in {}", name, self)))?;
        v.downcast_ref::<T>()
            .ok_or_else(|| Error::Signature(format!(
                "keyword argument {} is {:?}, not a {}",
                name, v, any::type_name::<T>())))
    }

    /// Apply this call's arguments to `f`, propagating whatever it returns.
    pub fn play<F, R>(&self, f: F) -> R
        where F: FnOnce(&Call) -> R
    {
        f(self)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        let mut first = true;
        for v in self.args.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{:?}", v)?;
        }
        for (k, v) in self.kwargs.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={:?}", k, v)?;
        }
        f.write_str(")")
    }
}

/// Build a [`Call`].  Keyword arguments follow a `;`.
///
/// # Examples
/// ```
/// # use mocktest::*;
/// let c = call![1, "two"; three = 3.0];
/// assert_eq!("(1, \"two\", three=3.0)", c.to_string());
/// assert_eq!(1, *c.positional::<i32>(0).unwrap());
/// ```
#[macro_export]
macro_rules! call {
    ($($arg:expr),* ; $($key:ident = $val:expr),* $(,)?) => {
        $crate::Call::new()
            $(.arg($arg))*
            $(.kwarg(stringify!($key), $val))*
    };
    ($($arg:expr),* $(,)?) => {
        $crate::Call::new()
            $(.arg($arg))*
    };
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn display_empty() {
        assert_eq!("()", Call::new().to_string());
    }

    #[test]
    fn display_keywords_only() {
        let c = Call::new().kwarg("b", 2u8).kwarg("a", "x");
        assert_eq!("(a=\"x\", b=2)", c.to_string());
    }

    #[test]
    fn like() {
        let c = Call::like(vec![Value::new(1)], vec![("k", Value::new(2))]);
        assert_eq!(c, call![1; k = 2]);
    }

    #[test]
    fn positional_out_of_range() {
        let e = call![1].positional::<i32>(1).unwrap_err();
        assert!(e.is_signature());
    }

    #[test]
    fn positional_wrong_type() {
        let e = call!["x"].positional::<i32>(0).unwrap_err();
        assert!(e.is_signature());
    }

    #[test]
    fn keyword() {
        let c = call![; verbose = true];
        assert!(*c.keyword::<bool>("verbose").unwrap());
        assert!(c.keyword::<bool>("quiet").unwrap_err().is_signature());
    }

    #[test]
    fn play_propagates_errors() {
        let c = call![3, 4];
        let sum = c.play(|c| -> Result<i32> {
            Ok(c.positional::<i32>(0)? + c.positional::<i32>(1)?)
        });
        assert_eq!(7, sum.unwrap());
        let r = c.play(|c| c.positional::<i32>(2).copied());
        assert!(r.unwrap_err().is_signature());
    }
}
