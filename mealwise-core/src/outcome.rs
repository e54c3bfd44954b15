//! Explicit recoverable-failure results.
//!
//! Operations that must never fail the caller (lookups, similarity search,
//! persistence) return an [`Outcome`]: the value is always usable, and a
//! degraded outcome additionally carries the error that forced the fallback.

use crate::MealwiseError;

/// A value that may have been produced by a fallback path.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation completed normally.
    Complete(T),
    /// The operation failed and `value` is the fallback.
    Degraded { value: T, cause: MealwiseError },
}

impl<T> Outcome<T> {
    /// Wrap a fallback value together with the failure that produced it.
    pub fn degraded(value: T, cause: impl Into<MealwiseError>) -> Self {
        Self::Degraded {
            value,
            cause: cause.into(),
        }
    }

    /// Borrow the value regardless of how it was produced.
    pub fn value(&self) -> &T {
        match self {
            Self::Complete(value) => value,
            Self::Degraded { value, .. } => value,
        }
    }

    /// Consume the outcome and return the value.
    pub fn into_value(self) -> T {
        match self {
            Self::Complete(value) => value,
            Self::Degraded { value, .. } => value,
        }
    }

    /// The failure behind a degraded outcome.
    pub fn cause(&self) -> Option<&MealwiseError> {
        match self {
            Self::Complete(_) => None,
            Self::Degraded { cause, .. } => Some(cause),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Map the inner value, keeping the failure (if any).
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Complete(value) => Outcome::Complete(f(value)),
            Self::Degraded { value, cause } => Outcome::Degraded {
                value: f(value),
                cause,
            },
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Degrade to the type's default value (usually empty).
    pub fn empty(cause: impl Into<MealwiseError>) -> Self {
        Self::degraded(T::default(), cause)
    }
}
