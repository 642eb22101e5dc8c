// vim: tw=80
//! Entering, exiting and tearing down mock transactions
#![deny(warnings)]

use std::{
    panic,
    sync::{Arc, Mutex},
};

use mocktest::*;
use static_assertions::assert_impl_all;

assert_impl_all!(MockTransaction: Send, Sync);
assert_impl_all!(Object: Send, Sync, Clone);
assert_impl_all!(MockAct: Send, Sync, Clone);
assert_impl_all!(StubbedMethod: Send, Sync);
assert_impl_all!(Value: Send, Sync, Clone);

type Teardown = Box<dyn FnOnce() -> Result<()> + Send>;

/// Returns a log, and a factory of teardowns that append to it.
fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Teardown) {
    let order = Arc::new(Mutex::new(Vec::new()));
    let o = order.clone();
    let push = move |i: u32| {
        let o = o.clone();
        Box::new(move || {
            o.lock().unwrap().push(i);
            Ok(())
        }) as Teardown
    };
    (order, push)
}

mod lifecycle {
    use super::*;

    #[test]
    fn enter_twice() {
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        txn.add_teardown(|| Ok(())).unwrap();
        assert!(matches!(txn.enter().unwrap_err(), Error::AlreadyActive));
        // The active transaction was left alone
        assert_eq!("MockTransaction { pending_teardowns: Some(1) }",
                   format!("{:?}", txn));
        txn.exit().unwrap();
    }

    #[test]
    fn exit_inactive() {
        let txn = MockTransaction::new();
        assert!(matches!(txn.exit().unwrap_err(), Error::Inactive));
    }

    #[test]
    fn teardown_while_inactive() {
        let txn = MockTransaction::new();
        let e = txn.add_teardown(|| Ok(())).unwrap_err();
        assert!(matches!(e, Error::Inactive));
    }

    #[test]
    fn stub_while_inactive() {
        let txn = MockTransaction::new();
        let obj = Object::named("obj");
        let e = txn.when(&obj).acquire("foo").unwrap_err();
        assert!(matches!(e, Error::Inactive));
        assert!(!obj.has_attr("foo"));
    }

    #[test]
    fn handles_are_independent() {
        let a = MockTransaction::new();
        let b = MockTransaction::new();
        let _sa = a.begin().unwrap();
        let _sb = b.begin().unwrap();
        assert!(a.is_active());
        assert!(b.is_active());
    }

    #[test]
    fn reusable_after_exit() {
        let txn = MockTransaction::new();
        txn.begin().unwrap().finish().unwrap();
        assert!(!txn.is_active());
        txn.begin().unwrap().finish().unwrap();
    }
}

mod teardown {
    use super::*;

    #[test]
    fn lifo() {
        let (order, push) = recorder();
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        for i in 0..3 {
            txn.add_teardown(push(i)).unwrap();
        }
        txn.exit().unwrap();
        assert_eq!(vec![2, 1, 0], *order.lock().unwrap());
    }

    #[test]
    fn all_run_after_an_error() {
        let (order, push) = recorder();
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        txn.add_teardown(push(0)).unwrap();
        txn.add_teardown(|| Err(Error::Verification("second".into())))
            .unwrap();
        txn.add_teardown(|| Err(Error::Verification("third".into())))
            .unwrap();
        txn.add_teardown(push(3)).unwrap();
        let e = txn.exit().unwrap_err();
        // The first failure to happen is the one reported
        assert_eq!("third", e.to_string());
        assert_eq!(vec![3, 0], *order.lock().unwrap());
        assert!(!txn.is_active());
    }

    #[test]
    fn all_run_after_a_panic() {
        let (order, push) = recorder();
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        txn.add_teardown(push(0)).unwrap();
        txn.add_teardown(|| panic!("kaboom")).unwrap();
        txn.add_teardown(push(2)).unwrap();
        let r = panic::catch_unwind(panic::AssertUnwindSafe(|| txn.exit()));
        let payload = r.unwrap_err();
        assert_eq!(Some(&"kaboom"), payload.downcast_ref::<&str>());
        assert_eq!(vec![2, 0], *order.lock().unwrap());
        assert!(!txn.is_active());
    }

    #[test]
    fn verify_before_restore() {
        let obj = Object::named("obj").define("foo", Attr::value(1));
        let seen = Arc::new(Mutex::new(None));
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        txn.expect(&obj).acquire("foo").unwrap();
        let s = seen.clone();
        let o = obj.clone();
        // Registered last, so it runs first, while the stub is installed
        txn.add_teardown(move || {
            *s.lock().unwrap() = o.get_attr("foo");
            Ok(())
        }).unwrap();
        assert!(txn.exit().unwrap_err().is_verification());
        assert!(matches!(*seen.lock().unwrap(), Some(Attr::Stub(_))));
        assert_eq!(Value::new(1), obj.value("foo").unwrap());
    }
}

mod scope {
    use super::*;

    #[test]
    fn drop_restores() {
        let obj = Object::named("obj").define("x", Attr::value("orig"));
        let txn = MockTransaction::new();
        {
            let scope = txn.begin().unwrap();
            scope.replace(&obj).set(&["x"], Attr::value("new")).unwrap();
            assert_eq!(Value::new("new"), obj.value("x").unwrap());
        }
        assert_eq!(Value::new("orig"), obj.value("x").unwrap());
        assert!(!txn.is_active());
    }

    #[test]
    #[should_panic(expected = "Mock \"foo\" did not match expectations")]
    fn drop_panics_on_failure() {
        let obj = Object::named("obj");
        let txn = MockTransaction::new();
        let scope = txn.begin().unwrap();
        scope.expect(&obj).acquire("foo").unwrap();
    }

    #[test]
    fn finish_returns_failure() {
        let obj = Object::named("obj");
        let txn = MockTransaction::new();
        let scope = txn.begin().unwrap();
        scope.expect(&obj).acquire("foo").unwrap();
        assert!(scope.finish().unwrap_err().is_verification());
        assert!(!obj.has_attr("foo"));
    }

    /// A test that fails on its own must report its own failure, not the
    /// unsatisfied expectations.
    #[test]
    fn no_double_panic() {
        let obj = Object::named("obj").define("foo", Attr::value(1));
        let txn = MockTransaction::new();
        let r = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let scope = txn.begin().unwrap();
            scope.expect(&obj).acquire("foo").unwrap();
            panic!("the test's own failure");
        }));
        let payload = r.unwrap_err();
        assert_eq!(Some(&"the test's own failure"),
                   payload.downcast_ref::<&str>());
        assert!(!txn.is_active());
        assert_eq!(Value::new(1), obj.value("foo").unwrap());
    }
}
