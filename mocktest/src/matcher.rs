// vim: tw=80
//! Argument matchers
//!
//! Anywhere an exact argument value is expected, a [`Matcher`] may be used
//! instead.  Most matchers are built from the [`predicates`] crate with
//! [`matching`] or [`matching_str`].
//!
//! # Examples
//! ```
//! # use mocktest::*;
//! use mocktest::predicate;
//!
//! let spec = args![matching::<i32, _>(predicate::gt(3)), 7];
//! assert!(spec.matches(&call![4, 7]));
//! assert!(!spec.matches(&call![2, 7]));
//! assert!(!spec.matches(&call![4, 8]));
//! ```
use std::{collections::BTreeMap, fmt, marker::PhantomData};

use predicates::Predicate;
use predicates_tree::CaseTreeExt;

use crate::{Argument, Call, Value};

/// Something that can stand in for an expected argument value.
pub trait Matcher: fmt::Display + Send + Sync {
    fn matches(&self, actual: &Value) -> bool;

    /// Describe why `actual` was rejected, if there is more to say than the
    /// matcher's own description.
    fn explain(&self, _actual: &Value) -> Option<String> {
        None
    }
}

/// Adapts a [`Predicate`] over a concrete type into a [`Matcher`].
struct PredicateMatcher<T, P> {
    pred: P,
    _t: PhantomData<fn(&T)>
}

impl<T, P> fmt::Display for PredicateMatcher<T, P>
    where P: Predicate<T>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.pred, f)
    }
}

impl<T, P> Matcher for PredicateMatcher<T, P>
    where T: Argument, P: Predicate<T> + Send + Sync
{
    fn matches(&self, actual: &Value) -> bool {
        actual.downcast_ref::<T>()
            .map_or(false, |v| self.pred.eval(v))
    }

    fn explain(&self, actual: &Value) -> Option<String> {
        match actual.downcast_ref::<T>() {
            Some(v) => self.pred.find_case(false, v)
                .map(|c| c.tree().to_string()),
            None => Some(format!("{:?} is not a {}", actual,
                                 std::any::type_name::<T>()))
        }
    }
}

/// Adapts a [`Predicate`] over `str` into a [`Matcher`] that accepts both
/// `String` and `&'static str` values.
struct StrMatcher<P> {
    pred: P
}

impl<P: Predicate<str>> fmt::Display for StrMatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.pred, f)
    }
}

impl<P> Matcher for StrMatcher<P>
    where P: Predicate<str> + Send + Sync
{
    fn matches(&self, actual: &Value) -> bool {
        actual.as_str().map_or(false, |s| self.pred.eval(s))
    }

    fn explain(&self, actual: &Value) -> Option<String> {
        match actual.as_str() {
            Some(s) => self.pred.find_case(false, s)
                .map(|c| c.tree().to_string()),
            None => Some(format!("{:?} is not a string", actual))
        }
    }
}

/// One expected argument: either a value compared with `==`, or a
/// [`Matcher`].
pub enum Expected {
    Equal(Value),
    Matching(Box<dyn Matcher>),
}

impl Expected {
    /// Use a custom [`Matcher`] implementation.
    pub fn matcher<M: Matcher + 'static>(m: M) -> Self {
        Expected::Matching(Box::new(m))
    }

    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Expected::Equal(v) => actual == v,
            Expected::Matching(m) => m.matches(actual),
        }
    }

    fn explain(&self, actual: &Value) -> String {
        match self {
            Expected::Equal(v) => format!("{:?} != {:?}", actual, v),
            Expected::Matching(m) => m.explain(actual)
                .unwrap_or_else(|| format!("{:?} does not satisfy {}",
                                           actual, m))
        }
    }
}

impl<T: Argument> From<T> for Expected {
    fn from(t: T) -> Self {
        Expected::Equal(Value::new(t))
    }
}

impl fmt::Debug for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expected::Equal(v) => fmt::Debug::fmt(v, f),
            Expected::Matching(m) => fmt::Display::fmt(m, f),
        }
    }
}

/// Match arguments of type `T` with a [`Predicate`].  Arguments of any other
/// type never match.
pub fn matching<T, P>(pred: P) -> Expected
    where T: Argument, P: Predicate<T> + Send + Sync + 'static
{
    Expected::matcher(PredicateMatcher{pred, _t: PhantomData})
}

/// Match string arguments, owned or `'static`, with a [`Predicate`].
///
/// # Examples
/// ```
/// # use mocktest::*;
/// use mocktest::predicate;
///
/// let spec = args![matching_str(predicate::str::starts_with("f"))];
/// assert!(spec.matches(&call!["fdfds"]));
/// assert!(spec.matches(&call![String::from("foo")]));
/// assert!(!spec.matches(&call!["x"]));
/// ```
pub fn matching_str<P>(pred: P) -> Expected
    where P: Predicate<str> + Send + Sync + 'static
{
    Expected::matcher(StrMatcher{pred})
}

/// The exact argument list expected by
/// [`MockAct::with`](crate::MockAct::with).  Build it with
/// [`args!`](crate::args).
#[derive(Debug, Default)]
pub struct ArgSpec {
    args: Vec<Expected>,
    kwargs: BTreeMap<String, Expected>,
}

impl ArgSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg<E: Into<Expected>>(mut self, e: E) -> Self {
        self.args.push(e.into());
        self
    }

    pub fn kwarg<E: Into<Expected>>(mut self, name: &str, e: E) -> Self {
        self.kwargs.insert(name.to_owned(), e.into());
        self
    }

    /// Does `call` have the same shape as this spec, with every argument
    /// equal to or matched by its expectation?
    pub fn matches(&self, call: &Call) -> bool {
        call.args().len() == self.args.len()
            && self.kwargs.keys().eq(call.kwargs().keys())
            && self.args.iter().zip(call.args())
                .all(|(e, a)| e.matches(a))
            && self.kwargs.iter().zip(call.kwargs().values())
                .all(|((_, e), a)| e.matches(a))
    }

    /// List every reason why `call` does not match.
    pub(crate) fn explain(&self, call: &Call) -> Vec<String> {
        if call.args().len() != self.args.len() {
            return vec![format!("expected {} positional arguments, got {}",
                                self.args.len(), call.args().len())];
        }
        if !self.kwargs.keys().eq(call.kwargs().keys()) {
            return vec![format!("expected keyword arguments {:?}, got {:?}",
                                self.kwargs.keys().collect::<Vec<_>>(),
                                call.kwargs().keys().collect::<Vec<_>>())];
        }
        let positional = self.args.iter().zip(call.args())
            .enumerate()
            .filter(|(_, (e, a))| !e.matches(a))
            .map(|(i, (e, a))| format!("argument {}: {}", i, e.explain(a)));
        let keyword = self.kwargs.iter().zip(call.kwargs().values())
            .filter(|((_, e), a)| !e.matches(a))
            .map(|((k, e), a)| format!("argument {}: {}", k, e.explain(a)));
        positional.chain(keyword).collect()
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        let mut first = true;
        for e in self.args.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{:?}", e)?;
        }
        for (k, e) in self.kwargs.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={:?}", k, e)?;
        }
        f.write_str(")")
    }
}

/// Build an [`ArgSpec`].  Plain values are compared with `==`; matchers
/// built with [`matching`](crate::matching) are evaluated.  Keyword
/// arguments follow a `;`.
///
/// # Examples
/// ```
/// # use mocktest::*;
/// let spec = args![1, "two"; three = 3.0];
/// assert!(spec.matches(&call![1, "two"; three = 3.0]));
/// assert!(!spec.matches(&call![1, "two"]));
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* ; $($key:ident = $val:expr),* $(,)?) => {
        $crate::ArgSpec::new()
            $(.arg($arg))*
            $(.kwarg(stringify!($key), $val))*
    };
    ($($arg:expr),* $(,)?) => {
        $crate::ArgSpec::new()
            $(.arg($arg))*
    };
}
