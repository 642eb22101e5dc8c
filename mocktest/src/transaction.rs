// vim: tw=80
use std::{
    any::Any,
    fmt,
    ops::Deref,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex},
    thread,
};

use crate::{lock, Attr, Error, Result, StubbedMethod, Target};

type Teardown = Box<dyn FnOnce() -> Result<()> + Send>;

/// The first thing to go wrong while tearing down
enum Failure {
    Error(Error),
    Panic(Box<dyn Any + Send>),
}

/// Tracks every mocking mutation made during one test, so that it can be
/// verified and undone.
///
/// Teardown actions run in last-in-first-out order when the transaction
/// exits.  A stub's verification is registered after the restoration of the
/// attribute it replaced, so it runs first.
///
/// Only one transaction may be active per handle at a time.  Separate
/// handles are independent of each other.
///
/// # Examples
/// ```
/// # use mocktest::*;
/// let obj = Object::named("service")
///     .define("ping", Attr::method(|_| Ok("pong")));
/// let txn = MockTransaction::new();
/// {
///     let scope = txn.begin().unwrap();
///     scope.when(&obj).acquire("ping").unwrap()
///         .and_return("mocked").unwrap();
///     let r = obj.call("ping", call![]).unwrap().unwrap();
///     assert_eq!(Some("mocked"), r.as_str());
/// }
/// // Dropping the scope restored the original method
/// let r = obj.call("ping", call![]).unwrap().unwrap();
/// assert_eq!(Some("pong"), r.as_str());
/// ```
#[derive(Default)]
pub struct MockTransaction {
    teardowns: Mutex<Option<Vec<Teardown>>>,
}

impl MockTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.teardowns).is_some()
    }

    /// Start tracking mutations.
    ///
    /// Fails without side effects if the transaction is already active.
    pub fn enter(&self) -> Result<()> {
        let mut teardowns = lock(&self.teardowns);
        if teardowns.is_some() {
            return Err(Error::AlreadyActive);
        }
        *teardowns = Some(Vec::new());
        tracing::debug!("mock transaction entered");
        Ok(())
    }

    /// Enter the transaction, returning a guard that exits it when dropped.
    pub fn begin(&self) -> Result<Scope<'_>> {
        self.enter()?;
        Ok(Scope{txn: self, finished: false})
    }

    /// Register an action to run when the transaction exits.
    pub fn add_teardown<F>(&self, f: F) -> Result<()>
        where F: FnOnce() -> Result<()> + Send + 'static
    {
        match lock(&self.teardowns).as_mut() {
            None => Err(Error::Inactive),
            Some(teardowns) => {
                teardowns.push(Box::new(f));
                Ok(())
            }
        }
    }

    /// Run every teardown action, newest first, and deactivate the
    /// transaction.
    ///
    /// Every action runs even if an earlier one fails.  The first failure
    /// is returned, or resumed if it was a panic.  The transaction is
    /// inactive afterwards no matter what.
    pub fn exit(&self) -> Result<()> {
        match self.run_teardowns()? {
            None => Ok(()),
            Some(Failure::Error(e)) => Err(e),
            Some(Failure::Panic(payload)) => panic::resume_unwind(payload),
        }
    }

    fn run_teardowns(&self) -> Result<Option<Failure>> {
        let teardowns = lock(&self.teardowns).take()
            .ok_or(Error::Inactive)?;
        tracing::debug!(teardowns = teardowns.len(),
            "mock transaction exiting");
        let mut failure = None;
        for teardown in teardowns.into_iter().rev() {
            let this = match panic::catch_unwind(AssertUnwindSafe(teardown)) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => Failure::Error(e),
                Err(payload) => Failure::Panic(payload),
            };
            if failure.is_none() {
                failure = Some(this);
            }
        }
        Ok(failure)
    }

    /// Install a [`StubbedMethod`] as attribute `name` of `target`, or return
    /// the one already installed there.
    ///
    /// The original attribute is restored when the transaction exits.  If
    /// there was none, the stub is deleted instead.
    pub fn stub_method<T>(&self, target: &T, name: &str)
        -> Result<Arc<StubbedMethod>>
        where T: Target + Clone + 'static
    {
        if !self.is_active() {
            return Err(Error::Inactive);
        }
        let original = target.existing_attr(name);
        if let Some(Attr::Stub(stub)) = &original {
            return Ok(stub.clone());
        }
        self.add_restore(target, name, original)?;
        let stub = StubbedMethod::new(name, self)?;
        tracing::debug!(object = %target.describe(), attribute = name,
            "installing stub");
        target.set_attr(name, Attr::Stub(stub.clone()));
        Ok(stub)
    }

    /// Replace attribute `name` of `target` with `attr` until the transaction
    /// exits.
    pub fn replace_attr<T>(&self, target: &T, name: &str, attr: Attr)
        -> Result<()>
        where T: Target + Clone + 'static
    {
        if !self.is_active() {
            return Err(Error::Inactive);
        }
        self.add_restore(target, name, target.existing_attr(name))?;
        tracing::debug!(object = %target.describe(), attribute = name,
            "replacing attribute");
        target.set_attr(name, attr);
        Ok(())
    }

    fn add_restore<T>(&self, target: &T, name: &str, original: Option<Attr>)
        -> Result<()>
        where T: Target + Clone + 'static
    {
        let target = target.clone();
        let name = name.to_owned();
        self.add_teardown(move || {
            tracing::debug!(object = %target.describe(), attribute = %name,
                "restoring attribute");
            match original {
                Some(attr) => target.set_attr(&name, attr),
                None => {
                    target.del_attr(&name);
                }
            }
            Ok(())
        })
    }
}

impl fmt::Debug for MockTransaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pending = lock(&self.teardowns).as_ref().map(Vec::len);
        f.debug_struct("MockTransaction")
            .field("pending_teardowns", &pending)
            .finish()
    }
}

/// An entered [`MockTransaction`].  Dereferences to the transaction.
///
/// Dropping the scope exits the transaction.  If a teardown action fails,
/// the drop panics, failing the test, unless the thread is already
/// panicking.  In that case the original panic propagates unchanged.  Use
/// [`finish`](#method.finish) to get the failure as an `Err` instead.
pub struct Scope<'txn> {
    txn: &'txn MockTransaction,
    finished: bool,
}

impl<'txn> Scope<'txn> {
    /// Exit the transaction now.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.txn.exit()
    }
}

impl<'txn> Deref for Scope<'txn> {
    type Target = MockTransaction;

    fn deref(&self) -> &MockTransaction {
        self.txn
    }
}

impl<'txn> Drop for Scope<'txn> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if thread::panicking() {
            // Never panic while panicking
            if let Ok(Some(Failure::Error(e))) = self.txn.run_teardowns() {
                tracing::debug!("ignoring teardown failure: {}", e);
            }
        } else if let Err(e) = self.txn.exit() {
            panic!("{}", e);
        }
    }
}
