// vim: tw=80
use std::{error::Error as StdError, fmt, sync::Arc};

use thiserror::Error;

use crate::Call;

/// The configurable parts of a [`MockAct`](crate::MockAct) that may only be
/// set once.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Facet {
    /// The argument filter, set by `with` or `withf`
    ArgumentCondition,
    /// The return value or side effect, set by `and_return` and friends
    Action,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Facet::ArgumentCondition => f.write_str("argument condition"),
            Facet::Action => f.write_str("action"),
        }
    }
}

/// Everything that can go wrong while mocking.
#[derive(Debug, Error)]
pub enum Error {
    /// A [`MockAct`](crate::MockAct) facet was configured twice.
    #[error("{facet} has already been set")]
    AlreadySet { facet: Facet },

    /// A single-use builder was used a second time.
    #[error("already used!")]
    WrapperReused,

    /// A stub was called with arguments that no act accepts.
    #[error("Mock \"{name}\": no matching actions found for arguments: \
             {call}{details}")]
    Unmatched {
        name: String,
        call: Call,
        details: String,
    },

    /// An act's call count was not satisfied at teardown.
    #[error("{0}")]
    Verification(String),

    /// `enter` was called on a transaction that is already active.
    #[error("mock transaction is already active")]
    AlreadyActive,

    /// The transaction must be active for this operation.
    #[error("mock transaction is not active")]
    Inactive,

    #[error("{target} has no attribute \"{name}\"")]
    MissingAttribute { target: String, name: String },

    #[error("attribute \"{name}\" of {target} is not callable")]
    NotCallable { target: String, name: String },

    /// A path element passed to `replace` did not name a nested object.
    #[error("attribute \"{name}\" of {target} is not an object")]
    NotAnObject { target: String, name: String },

    /// Arguments had the wrong arity or type for the code inspecting them.
    #[error("argument mismatch: {0}")]
    Signature(String),

    /// An error configured with
    /// [`MockAct::and_raise`](crate::MockAct::and_raise).
    #[error("{0}")]
    Raised(Arc<dyn StdError + Send + Sync>),
}

impl Error {
    /// Does this error describe a mismatched argument list?
    pub fn is_signature(&self) -> bool {
        matches!(self, Error::Signature(_))
    }

    /// Is this a failed call-count check?
    pub fn is_verification(&self) -> bool {
        matches!(self, Error::Verification(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
