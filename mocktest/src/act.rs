// vim: tw=80
use std::{
    error::Error as StdError,
    fmt,
    sync::{Arc, Mutex},
};

use fragile::Fragile;

use crate::{
    lock, Argument, ArgSpec, Call, Error, Facet, Result, Value,
};

/// How many calls an act must receive before it is satisfied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Times {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    /// Inclusive at both ends
    Between(usize, usize),
}

impl Times {
    pub fn is_satisfied_by(&self, count: usize) -> bool {
        match *self {
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count <= n,
            Times::Between(lo, hi) => lo <= count && count <= hi,
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Times::Exactly(n) => write!(f, "exactly {}", n),
            Times::AtLeast(n) => write!(f, "at least {}", n),
            Times::AtMost(n) => write!(f, "at most {}", n),
            Times::Between(lo, hi) => write!(f, "between {} and {}", lo, hi),
        }
    }
}

type FilterFn = dyn Fn(&Call) -> Result<bool> + Send + Sync;
type ActionFn = dyn Fn(&Call) -> Result<Option<Value>> + Send + Sync;

/// Decides which calls an act applies to
struct Filter {
    check: Arc<FilterFn>,
    /// Only set for exact-match filters
    spec: Option<Arc<ArgSpec>>,
    description: String,
}

#[derive(Default)]
struct ActState {
    filter: Option<Filter>,
    times: Option<Times>,
    // Shared so user code can run without holding the state lock
    action: Option<Arc<ActionFn>>,
}

/// One expectation, or behavior, of a stubbed attribute.
///
/// An act has three facets, each of them optional:
/// * An argument filter, set with [`with`](#method.with) or
///   [`withf`](#method.withf).  Only matching calls are handled by, and
///   counted against, this act.
/// * A call count, set with [`times`](#method.times) or one of its
///   shortcuts.  It is checked when the transaction exits.
/// * An action, set with [`and_return`](#method.and_return),
///   [`and_call`](#method.and_call) or [`and_raise`](#method.and_raise).
///   Without one, matching calls return `None`.
///
/// The filter and the action may each be set only once.  The call count may
/// be changed freely, so `expect` can be narrowed with
/// [`once`](#method.once).
///
/// `MockAct` is a cheap handle; clones refer to the same act.
#[derive(Clone)]
pub struct MockAct {
    name: Arc<str>,
    state: Arc<Mutex<ActState>>,
}

impl MockAct {
    pub(crate) fn new(name: &str) -> Self {
        MockAct {
            name: Arc::from(name),
            state: Arc::default()
        }
    }

    /// Name of the stubbed attribute
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Does this act accept `call`?
    ///
    /// A filter that fails with [`Error::Signature`] doesn't match.  Any
    /// other error is propagated.
    pub fn matches(&self, call: &Call) -> Result<bool> {
        let check = match &lock(&self.state).filter {
            None => return Ok(true),
            Some(filter) => filter.check.clone()
        };
        match check(call) {
            Err(Error::Signature(_)) => Ok(false),
            r => r
        }
    }

    /// Is the call count satisfied by the matching members of `calls`?
    pub fn satisfied_by(&self, calls: &[Call]) -> Result<bool> {
        let times = match lock(&self.state).times {
            None => return Ok(true),
            Some(times) => times
        };
        let mut count = 0;
        for call in calls {
            if self.matches(call)? {
                count += 1;
            }
        }
        Ok(times.is_satisfied_by(count))
    }

    /// Run the action, if any, with the arguments of `call`.
    pub fn act_upon(&self, call: &Call) -> Result<Option<Value>> {
        let action = lock(&self.state).action.clone();
        match action {
            None => Ok(None),
            Some(action) => call.play(|c| action(c))
        }
    }

    /// Set the required call count.
    pub fn times(self, times: Times) -> Self {
        lock(&self.state).times = Some(times);
        self
    }

    pub fn exactly(self, n: usize) -> Self {
        self.times(Times::Exactly(n))
    }

    pub fn at_least(self, n: usize) -> Self {
        self.times(Times::AtLeast(n))
    }

    pub fn at_most(self, n: usize) -> Self {
        self.times(Times::AtMost(n))
    }

    /// Require between `lo` and `hi` calls, inclusive.
    pub fn between(self, lo: usize, hi: usize) -> Self {
        self.times(Times::Between(lo, hi))
    }

    /// Require that no matching call is made.  Shortcut for
    /// [`exactly(0)`](#method.exactly).
    pub fn never(self) -> Self {
        self.exactly(0)
    }

    pub fn once(self) -> Self {
        self.exactly(1)
    }

    pub fn twice(self) -> Self {
        self.exactly(2)
    }

    pub fn thrice(self) -> Self {
        self.exactly(3)
    }

    fn set_filter(&self, filter: Filter) -> Result<()> {
        let mut state = lock(&self.state);
        if state.filter.is_some() {
            return Err(Error::AlreadySet{facet: Facet::ArgumentCondition});
        }
        state.filter = Some(filter);
        Ok(())
    }

    /// Restrict this act to calls whose arguments equal `spec`.
    ///
    /// The call must have the same number of positional arguments and the
    /// same keyword names as `spec`.  Matchers in `spec` are evaluated
    /// instead of being compared.
    ///
    /// # Examples
    /// ```
    /// # use mocktest::*;
    /// let txn = MockTransaction::new();
    /// let scope = txn.begin().unwrap();
    /// let obj = Object::named("calculator");
    /// scope.when(&obj).acquire("add").unwrap()
    ///     .with(args![1, 2]).unwrap()
    ///     .and_return(3).unwrap();
    /// let sum = obj.call("add", call![1, 2]).unwrap().unwrap();
    /// assert_eq!(3, sum.get::<i32>().unwrap());
    /// assert!(obj.call("add", call![2, 2]).is_err());
    /// scope.finish().unwrap();
    /// ```
    pub fn with(self, spec: ArgSpec) -> Result<Self> {
        let spec = Arc::new(spec);
        let s = spec.clone();
        self.set_filter(Filter {
            check: Arc::new(move |call| Ok(s.matches(call))),
            description: format!("with arguments equal to: {}", spec),
            spec: Some(spec),
        })?;
        Ok(self)
    }

    /// Restrict this act to calls for which `f` returns `true`.
    ///
    /// A `Signature` error from `f`, such as the one returned by
    /// [`Call::positional`] for a missing argument, means "no match".
    pub fn withf<F>(self, f: F) -> Result<Self>
        where F: Fn(&Call) -> Result<bool> + Send + Sync + 'static
    {
        self.set_filter(Filter {
            check: Arc::new(f),
            spec: None,
            description: "where arguments satisfy the supplied function"
                .to_owned()
        })?;
        Ok(self)
    }

    fn set_action(&self, action: Arc<ActionFn>) -> Result<()> {
        let mut state = lock(&self.state);
        if state.action.is_some() {
            return Err(Error::AlreadySet{facet: Facet::Action});
        }
        state.action = Some(action);
        Ok(())
    }

    /// Return a clone of `t` from every matching call.
    pub fn and_return<T: Argument>(self, t: T) -> Result<Self> {
        let v = Value::new(t);
        self.set_action(Arc::new(move |_| Ok(Some(v.clone()))))?;
        Ok(self)
    }

    /// Alias for [`and_return`](#method.and_return)
    pub fn then_return<T: Argument>(self, t: T) -> Result<Self> {
        self.and_return(t)
    }

    /// Alias for [`and_return`](#method.and_return)
    pub fn returning<T: Argument>(self, t: T) -> Result<Self> {
        self.and_return(t)
    }

    /// Delegate every matching call to `f`.  Its result is returned to the
    /// caller, errors included.
    ///
    /// No lock is held while `f` runs, so it may call the stub again.  Keep
    /// any mutable state behind a `Mutex` of your own.
    ///
    /// # Examples
    /// ```
    /// # use mocktest::*;
    /// let obj = Object::named("math");
    /// let txn = MockTransaction::new();
    /// let scope = txn.begin().unwrap();
    /// let o = obj.clone();
    /// scope.when(&obj).acquire("fact").unwrap()
    ///     .and_call(move |c| {
    ///         let n = *c.positional::<u64>(0)?;
    ///         if n <= 1 {
    ///             return Ok(1);
    ///         }
    ///         let r = o.call("fact", call![n - 1])?
    ///             .map_or(Ok(0), |v| v.get::<u64>())?;
    ///         Ok(n * r)
    ///     }).unwrap();
    /// let r = obj.call("fact", call![5u64]).unwrap().unwrap();
    /// assert_eq!(120, r.get::<u64>().unwrap());
    /// # scope.finish().unwrap();
    /// ```
    pub fn and_call<F, T>(self, f: F) -> Result<Self>
        where F: Fn(&Call) -> Result<T> + Send + Sync + 'static,
              T: Argument
    {
        self.set_action(Arc::new(move |c| f(c).map(|t| Some(Value::new(t)))))?;
        Ok(self)
    }

    /// Alias for [`and_call`](#method.and_call)
    pub fn then_call<F, T>(self, f: F) -> Result<Self>
        where F: Fn(&Call) -> Result<T> + Send + Sync + 'static,
              T: Argument
    {
        self.and_call(f)
    }

    /// Alias for [`and_call`](#method.and_call)
    pub fn calling<F, T>(self, f: F) -> Result<Self>
        where F: Fn(&Call) -> Result<T> + Send + Sync + 'static,
              T: Argument
    {
        self.and_call(f)
    }

    /// Single-threaded version of [`and_call`](#method.and_call).  Can be
    /// used when the closure isn't `Send`.
    ///
    /// It is a runtime error to call the stub from a different thread than
    /// the one that originally called this method.
    pub fn and_call_st<F, T>(self, f: F) -> Result<Self>
        where F: Fn(&Call) -> Result<T> + 'static,
              T: Argument
    {
        let fragile = Fragile::new(f);
        self.set_action(Arc::new(move |c| {
            (fragile.get())(c).map(|t| Some(Value::new(t)))
        }))?;
        Ok(self)
    }

    /// Fail every matching call with `e`.
    pub fn and_raise<E>(self, e: E) -> Result<Self>
        where E: StdError + Send + Sync + 'static
    {
        let e: Arc<dyn StdError + Send + Sync> = Arc::new(e);
        self.set_action(Arc::new(move |_| Err(Error::Raised(e.clone()))))?;
        Ok(self)
    }

    /// Describe what this act expects.
    pub fn describe(&self) -> String {
        let state = lock(&self.state);
        let times = match state.times {
            None => "any number of".to_owned(),
            Some(t) => t.to_string()
        };
        match &state.filter {
            None => format!("{} calls", times),
            Some(filter) => format!("{} calls {}", times, filter.description)
        }
    }

    /// Describe the calls actually received.
    pub fn describe_reality(&self, calls: &[Call]) -> String {
        let mut desc = format!("{} calls", calls.len());
        if !calls.is_empty() {
            desc.push_str(" with arguments:");
            for (i, call) in calls.iter().enumerate() {
                desc.push_str(&format!("\n  {}:   {}", i + 1, call));
            }
        }
        desc
    }

    /// A report of this act's expectations, and optionally of the calls it
    /// received, for failure messages.
    pub fn summary(&self, matched: Option<bool>, calls: Option<&[Call]>)
        -> String
    {
        let status = match matched {
            None => "has not yet checked",
            Some(true) => "matched",
            Some(false) => "did not match",
        };
        let reality = match calls {
            None => String::new(),
            Some(calls) => format!("received {}",
                                   self.describe_reality(calls))
        };
        format!("Mock \"{}\" {} expectations:\n expected {}\n {}",
                self.name, status, self.describe(), reality)
    }

    /// Explain why this act rejects `call`.  Empty if it doesn't.
    pub(crate) fn explain(&self, call: &Call) -> Vec<String> {
        let state = lock(&self.state);
        match &state.filter {
            Some(Filter{spec: Some(spec), ..}) => spec.explain(call),
            _ => Vec::new()
        }
    }
}

impl fmt::Debug for MockAct {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.summary(None, None))
    }
}
