//! Error types for the Ember runtime
//!
//! Every failure in the integer subsystem is a programming-error-class
//! condition: it aborts the current operation and surfaces to the caller.
//! Nothing is swallowed or coerced into a default value.

use derive_more::{Display, Error};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Input to a constructor or coercion was not one of the accepted
    /// shapes, or was out of range for the target kind.
    #[display("bad {kind} initializer: {found}")]
    BadInitializer { kind: &'static str, found: String },

    #[display("division by zero")]
    DivisionByZero,

    /// The one signed division whose result is not representable.
    #[display("i64 minimum divided by -1")]
    IntegerOverflow,

    #[display("{name} arity mismatch: expected {expected}, got {got}")]
    WrongArity {
        name: &'static str,
        expected: String,
        got: usize,
    },

    #[display("cannot marshal {found}")]
    BadMarshal { found: String },

    #[display("unknown marshal tag 0x{tag:02x}")]
    UnknownMarshalTag { tag: u8 },

    #[display("marshal buffer length {got}, expected {expected}")]
    MarshalLength { expected: usize, got: usize },
}

impl RuntimeError {
    pub(crate) fn bad_initializer(kind: &'static str, found: impl std::fmt::Display) -> Self {
        RuntimeError::BadInitializer {
            kind,
            found: found.to_string(),
        }
    }
}

/// Require exactly `want` arguments.
pub(crate) fn check_fixarity(name: &'static str, want: usize, got: usize) -> RuntimeResult<()> {
    if got == want {
        Ok(())
    } else {
        Err(RuntimeError::WrongArity {
            name,
            expected: format!("exactly {want}"),
            got,
        })
    }
}

/// Require at least `min` arguments (variadic operators).
pub(crate) fn check_arity_at_least(
    name: &'static str,
    min: usize,
    got: usize,
) -> RuntimeResult<()> {
    if got >= min {
        Ok(())
    } else {
        Err(RuntimeError::WrongArity {
            name,
            expected: format!("at least {min}"),
            got,
        })
    }
}
