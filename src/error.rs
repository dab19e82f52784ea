//! Structured error type carried by every failed effect
//!
//! This module provides the [`Error`] type, the single failure payload used
//! throughout the crate. Every failed [`Fin`](crate::Fin), and therefore every
//! failed effect run, carries exactly one `Error`.
//!
//! The interesting variants are the *marker* errors the library itself
//! produces:
//!
//! - [`Error::Cancelled`] - cooperative cancellation was observed.
//! - [`Error::PredicateFailed`] - a `filter` predicate rejected the value.
//!   This is deliberately distinct from `Cancelled`; conflating the two would
//!   make a filtered-out value indistinguishable from a cancelled computation.
//! - [`Error::Panicked`] - a panic inside a wrapped computation, captured at
//!   the thunk boundary so it never escapes a `run` call as an unwind.
//! - [`Error::Many`] - an aggregate, used when a bracket's use-block and its
//!   resource disposal both fail. Disposal failures are surfaced, not
//!   swallowed.
//!
//! # Examples
//!
//! ```
//! use eddy::Error;
//!
//! let err = Error::new("connection refused");
//! assert_eq!(err.to_string(), "connection refused");
//! assert!(!err.is_cancelled());
//!
//! let err = Error::Cancelled;
//! assert!(err.is_cancelled());
//! ```

use std::fmt;

/// The failure payload carried by [`Fin::Fail`](crate::Fin::Fail)
///
/// `Error` is intentionally non-generic: effects in this crate have a fixed
/// error channel, which is what lets the cancellation and filter markers be
/// recognized structurally by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// The computation observed cooperative cancellation.
    Cancelled,
    /// A `filter` predicate rejected the success value.
    PredicateFailed,
    /// A panic was captured at the thunk boundary.
    ///
    /// The payload is the panic message (or a placeholder when the payload
    /// was not a string).
    Panicked(String),
    /// An application-defined failure.
    Failure(String),
    /// Several failures reported together.
    ///
    /// Produced by `bracket` when both the use-block and the disposal fail,
    /// in that order.
    Many(Vec<Error>),
}

impl Error {
    /// Create an application-defined failure
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::Error;
    ///
    /// let err = Error::new("file not found");
    /// assert_eq!(err, Error::Failure("file not found".to_string()));
    /// ```
    pub fn new(message: impl Into<String>) -> Self {
        Error::Failure(message.into())
    }

    /// Create a captured-panic failure
    pub fn panicked(message: impl Into<String>) -> Self {
        Error::Panicked(message.into())
    }

    /// Combine several errors into one
    ///
    /// A single-element vector collapses to that element.
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::Error;
    ///
    /// let one = Error::many(vec![Error::new("a")]);
    /// assert_eq!(one, Error::new("a"));
    ///
    /// let both = Error::many(vec![Error::new("a"), Error::new("b")]);
    /// assert!(matches!(both, Error::Many(_)));
    /// ```
    pub fn many(mut errors: Vec<Error>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Error::Many(errors)
        }
    }

    /// True if this error is the cancellation marker
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// True if this error is the rejected-predicate marker
    pub fn is_predicate_failed(&self) -> bool {
        matches!(self, Error::PredicateFailed)
    }

    /// True if this error is a captured panic
    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panicked(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Cancelled => write!(f, "operation cancelled"),
            Error::PredicateFailed => write!(f, "predicate not satisfied"),
            Error::Panicked(msg) => write!(f, "panicked: {}", msg),
            Error::Failure(msg) => write!(f, "{}", msg),
            Error::Many(errors) => {
                write!(f, "multiple failures:")?;
                for err in errors {
                    write!(f, " [{}]", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Failure(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Failure(message.to_string())
    }
}

/// Extract a readable message from a panic payload
///
/// Used by the thunk evaluation paths when converting a captured unwind into
/// [`Error::Panicked`].
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_markers() {
        assert_eq!(Error::Cancelled.to_string(), "operation cancelled");
        assert_eq!(
            Error::PredicateFailed.to_string(),
            "predicate not satisfied"
        );
        assert_eq!(Error::panicked("boom").to_string(), "panicked: boom");
    }

    #[test]
    fn test_display_many() {
        let err = Error::Many(vec![Error::new("a"), Error::Cancelled]);
        assert_eq!(err.to_string(), "multiple failures: [a] [operation cancelled]");
    }

    #[test]
    fn test_many_collapses_singleton() {
        assert_eq!(Error::many(vec![Error::new("only")]), Error::new("only"));
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let cancelled = Error::Cancelled;
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_predicate_failed());
        assert!(!cancelled.is_panic());

        let rejected = Error::PredicateFailed;
        assert!(rejected.is_predicate_failed());
        assert!(!rejected.is_cancelled());
    }

    #[test]
    fn test_from_str() {
        let err: Error = "oops".into();
        assert_eq!(err, Error::Failure("oops".to_string()));
    }

    #[test]
    fn test_panic_message_variants() {
        let msg = panic_message(Box::new("static str"));
        assert_eq!(msg, "static str");

        let msg = panic_message(Box::new("owned".to_string()));
        assert_eq!(msg, "owned");

        let msg = panic_message(Box::new(42_i32));
        assert_eq!(msg, "non-string panic payload");
    }
}
