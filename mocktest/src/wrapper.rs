// vim: tw=80
//! Single-use builders for stubs and replacements
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    Attr, Error, MockAct, MockTransaction, Object, Result, Target,
};

/// Which call count a freshly acquired act starts with
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Kind {
    /// No call count at all
    When,
    /// `at_least(0)`
    Stub,
    /// `at_least(1)`
    Expect,
}

/// Mark a wrapper as used, failing if it already was.
fn use_once(used: &AtomicBool) -> Result<()> {
    if used.swap(true, Ordering::Relaxed) {
        Err(Error::WrapperReused)
    } else {
        Ok(())
    }
}

/// Returned by [`MockTransaction::when`], [`MockTransaction::stub`] and
/// [`MockTransaction::expect`].  Selects the attribute to stub.
///
/// A wrapper can only be used once.
#[derive(Debug)]
pub struct GetWrapper<'txn, T> {
    txn: &'txn MockTransaction,
    target: T,
    kind: Kind,
    used: AtomicBool,
}

impl<'txn, T> GetWrapper<'txn, T>
    where T: Target + Clone + 'static
{
    /// Stub attribute `name` and add a new act to it.
    ///
    /// A failed attempt does not use up the wrapper.
    pub fn acquire(&self, name: &str) -> Result<MockAct> {
        if !self.txn.is_active() {
            return Err(Error::Inactive);
        }
        use_once(&self.used)?;
        let act = self.txn.stub_method(&self.target, name)?.new_act(name);
        Ok(match self.kind {
            Kind::When => act,
            Kind::Stub => act.at_least(0),
            Kind::Expect => act.at_least(1),
        })
    }
}

/// Returned by [`MockTransaction::replace`].  Replaces one attribute,
/// possibly nested.
///
/// A wrapper can only be used once.
#[derive(Debug)]
pub struct ReplaceWrapper<'txn, T> {
    txn: &'txn MockTransaction,
    target: T,
    used: AtomicBool,
}

impl<'txn, T> ReplaceWrapper<'txn, T>
    where T: Target + Clone + 'static
{
    /// Replace the attribute at `path` with `attr`.
    ///
    /// Every element of `path` but the last must name a nested
    /// [`Object`](crate::Object).  Only the last attribute is replaced, and
    /// restored when the transaction exits.  A path that can't be resolved
    /// does not use up the wrapper.
    ///
    /// # Examples
    /// ```
    /// # use mocktest::*;
    /// let db = Object::named("db").define("port", Attr::value(5432));
    /// let app = Object::named("app").define("db", db.clone());
    /// let txn = MockTransaction::new();
    /// let scope = txn.begin().unwrap();
    /// scope.replace(&app).set(&["db", "port"], Attr::value(0)).unwrap();
    /// assert_eq!(Value::new(0), db.value("port").unwrap());
    /// scope.finish().unwrap();
    /// assert_eq!(Value::new(5432), db.value("port").unwrap());
    /// ```
    pub fn set<A: Into<Attr>>(&self, path: &[&str], attr: A) -> Result<()> {
        if !self.txn.is_active() {
            return Err(Error::Inactive);
        }
        let (last, parents) = path.split_last()
            .ok_or_else(|| Error::Signature(
                "replace needs a non-empty attribute path".to_owned()))?;
        match parents {
            [] => {
                use_once(&self.used)?;
                self.txn.replace_attr(&self.target, last, attr.into())
            }
            [first, rest @ ..] => {
                let mut parent = self.child(&self.target, first)?;
                for name in rest {
                    parent = self.child(&parent, name)?;
                }
                use_once(&self.used)?;
                self.txn.replace_attr(&parent, last, attr.into())
            }
        }
    }

    fn child<P: Target>(&self, parent: &P, name: &str)
        -> Result<Object>
    {
        match parent.get_attr(name) {
            Some(Attr::Object(o)) => Ok(o),
            Some(_) => Err(Error::NotAnObject {
                target: parent.describe(),
                name: name.to_owned()
            }),
            None => Err(Error::MissingAttribute {
                target: parent.describe(),
                name: name.to_owned()
            })
        }
    }
}

impl MockTransaction {
    fn wrap<T>(&self, target: &T, kind: Kind) -> GetWrapper<'_, T>
        where T: Target + Clone + 'static
    {
        GetWrapper {
            txn: self,
            target: target.clone(),
            kind,
            used: AtomicBool::new(false)
        }
    }

    /// Stub an attribute of `target` with no required call count.
    ///
    /// # Examples
    /// ```
    /// # use mocktest::*;
    /// let obj = Object::named("obj");
    /// let txn = MockTransaction::new();
    /// let scope = txn.begin().unwrap();
    /// let w = scope.when(&obj);
    /// w.acquire("foo").unwrap().and_return(5).unwrap();
    /// // Each wrapper names a single attribute
    /// assert!(w.acquire("bar").is_err());
    /// // Never calling obj.foo() is fine
    /// scope.finish().unwrap();
    /// ```
    pub fn when<T>(&self, target: &T) -> GetWrapper<'_, T>
        where T: Target + Clone + 'static
    {
        self.wrap(target, Kind::When)
    }

    /// Stub an attribute of `target` that may be called any number of
    /// times, including none.
    pub fn stub<T>(&self, target: &T) -> GetWrapper<'_, T>
        where T: Target + Clone + 'static
    {
        self.wrap(target, Kind::Stub)
    }

    /// Stub an attribute of `target` that must be called at least once.
    pub fn expect<T>(&self, target: &T) -> GetWrapper<'_, T>
        where T: Target + Clone + 'static
    {
        self.wrap(target, Kind::Expect)
    }

    /// Replace a plain, possibly nested, attribute of `target`.
    pub fn replace<T>(&self, target: &T) -> ReplaceWrapper<'_, T>
        where T: Target + Clone + 'static
    {
        ReplaceWrapper {
            txn: self,
            target: target.clone(),
            used: AtomicBool::new(false)
        }
    }
}
