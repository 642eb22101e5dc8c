// vim: tw=80
//! Matching arguments with predicates and custom matchers
#![deny(warnings)]

use std::fmt;

use mocktest::*;
use pretty_assertions::assert_eq;

/// Matches any even integer
struct Even;

impl fmt::Display for Even {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("<even>")
    }
}

impl Matcher for Even {
    fn matches(&self, actual: &Value) -> bool {
        actual.downcast_ref::<i64>().map_or(false, |i| i % 2 == 0)
    }
}

#[test]
fn string_predicate() {
    let obj = Object::named("obj");
    let txn = MockTransaction::new();
    let scope = txn.begin().unwrap();
    scope.expect(&obj).acquire("foo").unwrap()
        .with(args![matching_str(predicate::str::starts_with("f"))]).unwrap()
        .and_return(true).unwrap();
    let r = obj.call("foo", call!["fdfds"]).unwrap().unwrap();
    assert_eq!(Value::new(true), r);
    assert!(obj.call("foo", call!["bar"]).is_err());
    scope.finish().unwrap();
}

#[test]
fn contains() {
    let spec = args![matching_str(predicate::str::contains("ell"))];
    assert!(spec.matches(&call!["hello"]));
    assert!(spec.matches(&call![String::from("yellow")]));
    assert!(!spec.matches(&call!["help"]));
    assert!(!spec.matches(&call![b"hello".to_vec()]));
}

#[test]
fn typed_predicate() {
    let spec = args![matching::<u8, _>(predicate::in_iter([1u8, 2, 3]))];
    assert!(spec.matches(&call![2u8]));
    assert!(!spec.matches(&call![4u8]));
    assert!(!spec.matches(&call![2i32]));
}

#[test]
fn combined_predicates() {
    let in_range = predicate::ge(10u16).and(predicate::lt(20u16));
    let spec = args![matching::<u16, _>(in_range); retries = 3u8];
    assert!(spec.matches(&call![15u16; retries = 3u8]));
    assert!(!spec.matches(&call![20u16; retries = 3u8]));
    assert!(!spec.matches(&call![15u16; retries = 4u8]));
}

#[test]
fn custom_matcher() {
    let obj = Object::named("obj");
    let txn = MockTransaction::new();
    let scope = txn.begin().unwrap();
    scope.expect(&obj).acquire("half").unwrap()
        .with(args![Expected::matcher(Even)]).unwrap()
        .and_call(|c| Ok(c.positional::<i64>(0)? / 2)).unwrap()
        .once();
    assert_eq!(Value::new(21i64),
               obj.call("half", call![42i64]).unwrap().unwrap());
    let e = obj.call("half", call![7i64]).unwrap_err();
    assert!(e.to_string().ends_with("argument 0: 7 does not satisfy <even>"),
            "{}", e);
    scope.finish().unwrap();
}

/// A matching and a plain value can be mixed in a single spec.
#[test]
fn mixed() {
    let spec = args![1, matching::<i32, _>(predicate::gt(3)); name = "x"];
    assert_eq!("(1, var > 3, name=\"x\")", spec.to_string());
    assert!(spec.matches(&call![1, 4; name = "x"]));
    assert!(!spec.matches(&call![2, 4; name = "x"]));
    assert!(!spec.matches(&call![1, 3; name = "x"]));
}

#[test]
fn predicate_mismatch_explained() {
    let obj = Object::named("obj");
    let txn = MockTransaction::new();
    let scope = txn.begin().unwrap();
    scope.when(&obj).acquire("foo").unwrap()
        .with(args![matching::<i32, _>(predicate::gt(3))]).unwrap();
    let e = obj.call("foo", call![2]).unwrap_err().to_string();
    assert!(e.contains("argument 0: var > 3"), "{}", e);
    let e = obj.call("foo", call!["2"]).unwrap_err().to_string();
    assert!(e.contains("argument 0: \"2\" is not a i32"), "{}", e);
    scope.finish().unwrap();
}
