// vim: tw=80
use std::{fmt, sync::{Arc, Mutex}};

use crate::{
    lock, Call, Error, MockAct, MockTransaction, Result, Value,
};

/// The replacement installed in place of a stubbed attribute.
///
/// Every invocation is recorded.  The acts are tried from the most recently
/// added to the oldest, and the first one that matches handles the call, so
/// a later, more specific act overrides an earlier, more general one.
pub struct StubbedMethod {
    name: String,
    acts: Mutex<Vec<MockAct>>,
    calls: Mutex<Vec<Call>>,
}

impl StubbedMethod {
    /// Create a new stub and register its verification with `txn`.
    pub fn new(name: &str, txn: &MockTransaction) -> Result<Arc<Self>> {
        let stub = Arc::new(StubbedMethod {
            name: name.to_owned(),
            acts: Mutex::default(),
            calls: Mutex::default()
        });
        let s = stub.clone();
        txn.add_teardown(move || s.verify())?;
        Ok(stub)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a new act.  It takes precedence over all existing acts.
    pub fn new_act(&self, name: &str) -> MockAct {
        let act = MockAct::new(name);
        lock(&self.acts).push(act.clone());
        act
    }

    /// All acts, oldest first
    pub fn acts(&self) -> Vec<MockAct> {
        lock(&self.acts).clone()
    }

    /// Every call received so far, matched or not
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Simulate calling the stubbed attribute.
    pub fn invoke(&self, call: Call) -> Result<Option<Value>> {
        tracing::trace!(stub = %self.name, %call, "stub called");
        lock(&self.calls).push(call.clone());
        let acts = self.acts();
        for act in acts.iter().rev() {
            if act.matches(&call)? {
                return act.act_upon(&call);
            }
        }
        Err(Error::Unmatched {
            name: self.name.clone(),
            details: explain(&acts, &call),
            call,
        })
    }

    /// Check every act's call count, in the order they were declared.
    /// Reports only the first unsatisfied act.
    pub fn verify(&self) -> Result<()> {
        let calls = self.calls();
        for act in self.acts().iter() {
            if !act.satisfied_by(&calls)? {
                let summary = act.summary(Some(false),
                                          Some(calls.as_slice()));
                tracing::debug!(stub = %self.name, "{}", summary);
                return Err(Error::Verification(summary));
            }
        }
        Ok(())
    }
}

/// List each act's expectation, and why it rejected `call`.
fn explain(acts: &[MockAct], call: &Call) -> String {
    let mut details = String::new();
    for (i, act) in acts.iter().enumerate() {
        details.push_str(&format!("\n  {}: expected {}", i + 1,
                                  act.describe()));
        for reason in act.explain(call) {
            for line in reason.lines() {
                details.push_str("\n       ");
                details.push_str(line);
            }
        }
    }
    details
}

impl fmt::Debug for StubbedMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StubbedMethod")
            .field("name", &self.name)
            .field("acts", &lock(&self.acts).len())
            .field("calls", &lock(&self.calls).len())
            .finish()
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{args, call};

    fn stub(txn: &MockTransaction) -> Arc<StubbedMethod> {
        StubbedMethod::new("foo", txn).unwrap()
    }

    #[test]
    fn needs_an_active_transaction() {
        let txn = MockTransaction::new();
        let e = StubbedMethod::new("foo", &txn).unwrap_err();
        assert!(matches!(e, Error::Inactive));
    }

    #[test]
    fn records_unmatched_calls() {
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        let s = stub(&txn);
        s.new_act("foo").with(args![1]).unwrap();
        assert!(s.invoke(call![2]).is_err());
        assert_eq!(vec![call![2]], s.calls());
        txn.exit().unwrap();
    }

    #[test]
    fn unmatched_message() {
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        let s = stub(&txn);
        s.new_act("foo").with(args![1, 2]).unwrap();
        let e = s.invoke(call![9, 9]).unwrap_err();
        assert_eq!(
            "Mock \"foo\": no matching actions found for arguments: (9, 9)\n  \
             1: expected any number of calls with arguments equal to: \
             (1, 2)\n       \
             argument 0: 9 != 1\n       \
             argument 1: 9 != 2",
            e.to_string());
        txn.exit().unwrap();
    }

    #[test]
    fn no_acts_never_match() {
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        let s = stub(&txn);
        let e = s.invoke(call![]).unwrap_err();
        assert!(matches!(e, Error::Unmatched{..}));
        txn.exit().unwrap();
    }

    #[test]
    fn verify_stops_at_first_failure() {
        let txn = MockTransaction::new();
        txn.enter().unwrap();
        let s = stub(&txn);
        s.new_act("foo").with(args![1]).unwrap().once();
        s.new_act("foo").with(args![2]).unwrap().once();
        let e = s.verify().unwrap_err();
        assert!(e.to_string().contains("(1)"));
        assert!(!e.to_string().contains("(2)"));
        s.invoke(call![1]).unwrap();
        s.invoke(call![2]).unwrap();
        s.verify().unwrap();
        txn.exit().unwrap();
    }
}
