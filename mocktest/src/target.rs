// vim: tw=80
//! Objects whose attributes can be swapped out
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use crate::{lock, Argument, Call, Error, Result, StubbedMethod, Value};

type MethodFn = dyn Fn(&Call) -> Result<Option<Value>> + Send + Sync;

/// The contents of one named attribute slot.
#[derive(Clone)]
pub enum Attr {
    /// A plain value
    Value(Value),
    /// A callable implementation
    Method(Arc<MethodFn>),
    /// A nested object
    Object(Object),
    /// A stub installed by a [`MockTransaction`](crate::MockTransaction)
    Stub(Arc<StubbedMethod>),
}

impl Attr {
    pub fn value<T: Argument>(t: T) -> Self {
        Attr::Value(Value::new(t))
    }

    /// Wrap a closure as a method.  Its result is returned to the caller.
    pub fn method<F, T>(f: F) -> Self
        where F: Fn(&Call) -> Result<T> + Send + Sync + 'static,
              T: Argument
    {
        Attr::Method(Arc::new(move |c| f(c).map(|t| Some(Value::new(t)))))
    }

    /// Do both attributes hold the very same thing?  Values compare with
    /// `==`, everything else by identity.
    pub fn is_same(&self, other: &Attr) -> bool {
        match (self, other) {
            (Attr::Value(a), Attr::Value(b)) => a == b,
            (Attr::Method(a), Attr::Method(b)) => Arc::ptr_eq(a, b),
            (Attr::Object(a), Attr::Object(b)) => a.is_same(b),
            (Attr::Stub(a), Attr::Stub(b)) => Arc::ptr_eq(a, b),
            _ => false
        }
    }
}

impl From<Value> for Attr {
    fn from(v: Value) -> Self {
        Attr::Value(v)
    }
}

impl From<Object> for Attr {
    fn from(o: Object) -> Self {
        Attr::Object(o)
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Attr::Value(v) => write!(f, "Value({:?})", v),
            Attr::Method(_) => f.write_str("Method"),
            Attr::Object(o) => write!(f, "Object({:?})", o),
            Attr::Stub(s) => write!(f, "Stub({:?})", s.name()),
        }
    }
}

/// Anything with named attribute slots that a
/// [`MockTransaction`](crate::MockTransaction) may replace.
///
/// Implementations must share state between clones, because the
/// transaction keeps a clone around to restore the original attributes.
pub trait Target: Send + Sync {
    fn get_attr(&self, name: &str) -> Option<Attr>;

    /// Like [`get_attr`](Target::get_attr), but never creates anything.
    /// Used to snapshot an attribute before it is replaced.
    fn existing_attr(&self, name: &str) -> Option<Attr> {
        self.get_attr(name)
    }

    fn set_attr(&self, name: &str, attr: Attr);

    /// Remove an attribute, returning its former contents.
    fn del_attr(&self, name: &str) -> Option<Attr>;

    /// A short human-readable name, for diagnostics.
    fn describe(&self) -> String;
}

struct ObjectInner {
    name: String,
    recursive: bool,
    attrs: Mutex<HashMap<String, Attr>>,
}

/// A named bag of attributes: the usual [`Target`].
///
/// `Object` is a handle; clones refer to the same attributes.
///
/// # Examples
/// ```
/// # use mocktest::*;
/// let obj = Object::named("clock")
///     .define("now", Attr::method(|_| Ok(1_700_000_000u64)));
/// let t = obj.call("now", call![]).unwrap().unwrap();
/// assert_eq!(1_700_000_000, t.get::<u64>().unwrap());
/// assert_eq!("<#Object: clock>", format!("{:?}", obj));
/// ```
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    pub fn new() -> Self {
        Self::named("unnamed object")
    }

    pub fn named(name: &str) -> Self {
        Self::build(name, false)
    }

    /// An object that creates a nested recursive object whenever a missing
    /// attribute is looked up.  Useful for deep attribute chains that a test
    /// doesn't care about.
    pub fn recursive(name: &str) -> Self {
        Self::build(name, true)
    }

    fn build(name: &str, recursive: bool) -> Self {
        let inner = ObjectInner {
            name: name.to_owned(),
            recursive,
            attrs: Mutex::default()
        };
        Object{inner: Arc::new(inner)}
    }

    /// Builder-style [`set_attr`](Target::set_attr)
    pub fn define<A: Into<Attr>>(self, name: &str, attr: A) -> Self {
        self.set_attr(name, attr.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Do both handles refer to the same object?
    pub fn is_same(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        lock(&self.inner.attrs).contains_key(name)
    }

    /// Fetch a plain-value attribute.
    pub fn value(&self, name: &str) -> Result<Value> {
        match self.get_attr(name) {
            Some(Attr::Value(v)) => Ok(v),
            Some(_) => Err(Error::Signature(format!(
                "attribute \"{}\" of {:?} is not a plain value", name, self))),
            None => Err(self.missing(name))
        }
    }

    /// Invoke a method or stub attribute.
    pub fn call(&self, name: &str, call: Call) -> Result<Option<Value>> {
        match self.get_attr(name) {
            Some(Attr::Method(f)) => f(&call),
            Some(Attr::Stub(stub)) => stub.invoke(call),
            Some(_) => Err(Error::NotCallable {
                target: self.describe(),
                name: name.to_owned()
            }),
            None => Err(self.missing(name))
        }
    }

    fn missing(&self, name: &str) -> Error {
        Error::MissingAttribute {
            target: self.describe(),
            name: name.to_owned()
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for Object {
    fn get_attr(&self, name: &str) -> Option<Attr> {
        let mut attrs = lock(&self.inner.attrs);
        if let Some(attr) = attrs.get(name) {
            return Some(attr.clone());
        }
        if !self.inner.recursive {
            return None;
        }
        let child = Attr::Object(Object::recursive(name));
        attrs.insert(name.to_owned(), child.clone());
        Some(child)
    }

    fn existing_attr(&self, name: &str) -> Option<Attr> {
        lock(&self.inner.attrs).get(name).cloned()
    }

    fn set_attr(&self, name: &str, attr: Attr) {
        lock(&self.inner.attrs).insert(name.to_owned(), attr);
    }

    fn del_attr(&self, name: &str) -> Option<Attr> {
        lock(&self.inner.attrs).remove(name)
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<#Object: {}>", self.inner.name)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}
