//! Predicates and the outcome of a single trial.

use std::any::Any;
use std::fmt;

use crate::value::Value;

/// Classification of one trial
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "outcome", content = "message", rename_all = "lowercase"))]
pub enum Outcome {
    Pass,
    Fail,
    /// The arguments did not meet the predicate's precondition
    Skip,
    /// The predicate broke down; carries the error or panic message
    Error(String),
}

impl Outcome {
    /// Classify a failure message by its trailing tag
    ///
    /// Messages ending in `pass`, `fail` or `skip` select that outcome, which lets a
    /// predicate signal its verdict through an error or a panic. Anything else is an
    /// [`Outcome::Error`] carrying the message.
    pub fn from_payload(payload: &str) -> Self {
        if payload.ends_with("pass") {
            Outcome::Pass
        } else if payload.ends_with("fail") {
            Outcome::Fail
        } else if payload.ends_with("skip") {
            Outcome::Skip
        } else {
            Outcome::Error(payload.to_string())
        }
    }

    /// Classify the payload of a caught panic
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(message) = payload.downcast_ref::<&str>() {
            Self::from_payload(message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self::from_payload(message)
        } else {
            Outcome::Error("predicate panicked with a non-string payload".to_string())
        }
    }

    /// `Pass` when `condition` holds, `Skip` otherwise
    pub fn pass_or_skip(condition: bool) -> Self {
        if condition { Outcome::Pass } else { Outcome::Skip }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Skip => "skip",
            Outcome::Error(_) => "error",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Error(message) => write!(f, "error: {}", message),
            other => f.write_str(other.label()),
        }
    }
}

impl From<bool> for Outcome {
    fn from(passed: bool) -> Self {
        if passed { Outcome::Pass } else { Outcome::Fail }
    }
}

/// Anything a predicate may return
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Outcome {
        Outcome::from(self)
    }
}

impl<E: fmt::Display> IntoOutcome for Result<bool, E> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(passed) => passed.into_outcome(),
            Err(error) => Outcome::from_payload(&error.to_string()),
        }
    }
}

impl<E: fmt::Display> IntoOutcome for Result<Outcome, E> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(outcome) => outcome,
            Err(error) => Outcome::from_payload(&error.to_string()),
        }
    }
}

impl<E: fmt::Display> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(()) => Outcome::Pass,
            Err(error) => Outcome::from_payload(&error.to_string()),
        }
    }
}

/// A property checked against generated arguments
///
/// Implemented for every closure `FnMut(&[Value]) -> R` where `R: IntoOutcome`.
pub trait Predicate {
    fn check(&mut self, arguments: &[Value]) -> Outcome;
}

impl<F, R> Predicate for F
where
    F: FnMut(&[Value]) -> R,
    R: IntoOutcome,
{
    fn check(&mut self, arguments: &[Value]) -> Outcome {
        self(arguments).into_outcome()
    }
}
