// vim: tw=80
//! Transactional stubs and expectations for unit tests.
//!
//! Mocktest replaces named attributes of target objects with stubs for the
//! duration of a test, records every call they receive, and checks the
//! expected call counts when the test's [`MockTransaction`] exits.  Whatever
//! happens, the original attributes are restored.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Call counts`](#call-counts)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Return values`](#return-values)
//! * [`Overlapping acts`](#overlapping-acts)
//! * [`Replacing values`](#replacing-values)
//! * [`Targets`](#targets)
//!
//! ## Getting started
//!
//! The code under test calls methods of an [`Object`].  The test opens a
//! transaction, stubs the methods it cares about, and lets the transaction's
//! [`Scope`] verify and restore everything when it goes out of scope.
//! ```
//! use mocktest::*;
//!
//! fn greeting(directory: &Object, id: u32) -> Result<String> {
//!     let name = directory.call("lookup", call![id])?
//!         .ok_or_else(|| Error::Signature("lookup returned nothing".into()))?;
//!     Ok(format!("Hello, {}!", name.get::<String>()?))
//! }
//!
//! let directory = Object::named("directory");
//! let txn = MockTransaction::new();
//! let scope = txn.begin().unwrap();
//! scope.expect(&directory).acquire("lookup").unwrap()
//!     .with(args![7u32]).unwrap()
//!     .and_return(String::from("Alice")).unwrap();
//! assert_eq!("Hello, Alice!", greeting(&directory, 7).unwrap());
//! scope.finish().unwrap();
//! ```
//!
//! ## Call counts
//!
//! Each act may have a required call count.  Acts created with
//! [`when`](MockTransaction::when) have none, those created with
//! [`stub`](MockTransaction::stub) require
//! [`at_least(0)`](MockAct::at_least), and those created with
//! [`expect`](MockTransaction::expect) require
//! [`at_least(1)`](MockAct::at_least).  Any of them can be changed with
//! [`exactly`](MockAct::exactly), [`at_most`](MockAct::at_most),
//! [`between`](MockAct::between), [`never`](MockAct::never),
//! [`once`](MockAct::once), [`twice`](MockAct::twice) or
//! [`thrice`](MockAct::thrice).  Only calls matching the act's arguments
//! count.
//! ```should_panic(expected = "expected exactly 1 calls")
//! # use mocktest::*;
//! let obj = Object::named("obj");
//! let txn = MockTransaction::new();
//! let scope = txn.begin().unwrap();
//! scope.expect(&obj).acquire("bar").unwrap().once();
//! obj.call("bar", call![]).unwrap();
//! obj.call("bar", call![]).unwrap();
//! drop(scope);    // panics
//! ```
//!
//! ## Matching arguments
//!
//! [`with`](MockAct::with) restricts an act to calls with equal arguments.
//! Any expected argument may be replaced by a [`Matcher`], usually built
//! from a [`predicate`] with [`matching`] or [`matching_str`].
//! [`withf`](MockAct::withf) accepts an arbitrary function instead.
//! ```
//! # use mocktest::*;
//! let log = Object::named("log");
//! let txn = MockTransaction::new();
//! let scope = txn.begin().unwrap();
//! scope.expect(&log).acquire("write").unwrap()
//!     .with(args![matching_str(predicate::str::contains("error"))]).unwrap()
//!     .twice();
//! log.call("write", call!["disk error"]).unwrap();
//! log.call("write", call![String::from("network error")]).unwrap();
//! scope.finish().unwrap();
//! ```
//!
//! ## Return values
//!
//! A matching call returns whatever the act's action produces:
//! a constant ([`and_return`](MockAct::and_return)), the result of a
//! closure ([`and_call`](MockAct::and_call)) or an error
//! ([`and_raise`](MockAct::and_raise)).  Acts without an action return
//! `None`.
//! ```
//! # use mocktest::*;
//! let obj = Object::named("obj");
//! let txn = MockTransaction::new();
//! let scope = txn.begin().unwrap();
//! scope.when(&obj).acquire("square").unwrap()
//!     .and_call(|c| Ok(c.positional::<i64>(0)?.pow(2))).unwrap();
//! let r = obj.call("square", call![9i64]).unwrap().unwrap();
//! assert_eq!(81, r.get::<i64>().unwrap());
//! # scope.finish().unwrap();
//! ```
//!
//! ## Overlapping acts
//!
//! The most recently added act that matches a call handles it.  So add
//! general acts first, and specific ones later.
//! ```
//! # use mocktest::*;
//! let obj = Object::named("obj");
//! let txn = MockTransaction::new();
//! let scope = txn.begin().unwrap();
//! scope.when(&obj).acquire("f").unwrap().and_return(0).unwrap();
//! scope.when(&obj).acquire("f").unwrap()
//!     .with(args![1]).unwrap()
//!     .and_return(100).unwrap();
//! let f = |x: i32| obj.call("f", call![x]).unwrap().unwrap();
//! assert_eq!(Value::new(100), f(1));
//! assert_eq!(Value::new(0), f(2));
//! # scope.finish().unwrap();
//! ```
//!
//! ## Replacing values
//!
//! Plain attributes, even nested ones, can be swapped with
//! [`replace`](MockTransaction::replace).  They are restored like stubs,
//! but nothing is verified.
//!
//! ## Targets
//!
//! Anything implementing [`Target`] can be stubbed.  [`Object`] is the
//! implementation provided; [`Object::recursive`] builds objects whose
//! missing attributes spring into existence as further recursive objects.

mod act;
mod call;
mod error;
mod matcher;
mod stubbed;
mod target;
mod transaction;
mod value;
mod wrapper;

use std::sync::{Mutex, MutexGuard};

pub use act::{MockAct, Times};
pub use call::Call;
pub use error::{Error, Facet, Result};
pub use matcher::{matching, matching_str, ArgSpec, Expected, Matcher};
pub use predicates::prelude::{predicate, Predicate, PredicateBooleanExt};
pub use stubbed::StubbedMethod;
pub use target::{Attr, Object, Target};
pub use transaction::{MockTransaction, Scope};
pub use value::{Argument, Value};
pub use wrapper::{GetWrapper, ReplaceWrapper};

/// Lock a mutex, ignoring poison.  A test that panicked while holding a lock
/// must not break the teardown that follows it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
