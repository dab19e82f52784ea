//! Fin - the finished-computation result type
//!
//! This module provides [`Fin<A>`], the success-or-failure value produced by
//! running any effect in this crate. It is `Result<A, Error>` with a fixed
//! error channel and the small combinator surface the effect types build on.
//!
//! # Examples
//!
//! ```
//! use eddy::{Error, Fin};
//!
//! let fin = Fin::succ(21).map(|x| x * 2);
//! assert_eq!(fin, Fin::Succ(42));
//!
//! let fin: Fin<i32> = Fin::fail(Error::new("nope"));
//! assert!(fin.is_fail());
//! ```

use crate::Error;

/// The outcome of a finished computation: success with a value, or failure
/// with an [`Error`]
///
/// Exactly one of the two variants holds. `Fin` values are pure data; they
/// are constructed at the end of a thunk evaluation and either returned to
/// the caller or retained in the thunk's memo cell.
///
/// # Examples
///
/// ```
/// use eddy::{Error, Fin};
///
/// let ok = Fin::succ("hello");
/// assert!(ok.is_succ());
///
/// let bad: Fin<&str> = Fin::fail(Error::Cancelled);
/// assert!(bad.is_fail());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fin<A> {
    /// The computation succeeded with a value.
    Succ(A),
    /// The computation failed with an error.
    Fail(Error),
}

impl<A> Fin<A> {
    /// Construct a success
    pub fn succ(value: A) -> Self {
        Fin::Succ(value)
    }

    /// Construct a failure
    pub fn fail(error: impl Into<Error>) -> Self {
        Fin::Fail(error.into())
    }

    /// True if this is a success
    pub fn is_succ(&self) -> bool {
        matches!(self, Fin::Succ(_))
    }

    /// True if this is a failure
    pub fn is_fail(&self) -> bool {
        matches!(self, Fin::Fail(_))
    }

    /// Transform the success value, passing failures through unchanged
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Error, Fin};
    ///
    /// assert_eq!(Fin::succ(2).map(|x| x + 1), Fin::Succ(3));
    ///
    /// let fail: Fin<i32> = Fin::fail(Error::new("e"));
    /// assert_eq!(fail.map(|x| x + 1), Fin::fail(Error::new("e")));
    /// ```
    pub fn map<B, F>(self, f: F) -> Fin<B>
    where
        F: FnOnce(A) -> B,
    {
        match self {
            Fin::Succ(value) => Fin::Succ(f(value)),
            Fin::Fail(error) => Fin::Fail(error),
        }
    }

    /// Transform the error, passing successes through unchanged
    pub fn map_err<F>(self, f: F) -> Fin<A>
    where
        F: FnOnce(Error) -> Error,
    {
        match self {
            Fin::Succ(value) => Fin::Succ(value),
            Fin::Fail(error) => Fin::Fail(f(error)),
        }
    }

    /// Transform both channels at once
    pub fn bi_map<B, FS, FF>(self, succ: FS, fail: FF) -> Fin<B>
    where
        FS: FnOnce(A) -> B,
        FF: FnOnce(Error) -> Error,
    {
        match self {
            Fin::Succ(value) => Fin::Succ(succ(value)),
            Fin::Fail(error) => Fin::Fail(fail(error)),
        }
    }

    /// Chain a `Fin`-producing function, short-circuiting on failure
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Error, Fin};
    ///
    /// let fin = Fin::succ(2).and_then(|x| Fin::succ(x * 10));
    /// assert_eq!(fin, Fin::Succ(20));
    ///
    /// // The function is never invoked for a failure
    /// let fail: Fin<i32> = Fin::fail(Error::new("e"));
    /// let fin = fail.and_then(|_| -> Fin<i32> { unreachable!() });
    /// assert!(fin.is_fail());
    /// ```
    pub fn and_then<B, F>(self, f: F) -> Fin<B>
    where
        F: FnOnce(A) -> Fin<B>,
    {
        match self {
            Fin::Succ(value) => f(value),
            Fin::Fail(error) => Fin::Fail(error),
        }
    }

    /// Reinterpret a failed `Fin<A>` as a `Fin<B>` carrying the same error
    ///
    /// This is a *precondition-checked* operation: callers must have checked
    /// [`is_fail`](Fin::is_fail) first. Calling `cast` on a success is an API
    /// misuse, not a data-dependent failure.
    ///
    /// # Panics
    ///
    /// Panics if called on a [`Fin::Succ`].
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Error, Fin};
    ///
    /// let fail: Fin<i32> = Fin::fail(Error::new("e"));
    /// let recast: Fin<String> = fail.cast();
    /// assert_eq!(recast, Fin::fail(Error::new("e")));
    /// ```
    pub fn cast<B>(self) -> Fin<B> {
        match self {
            Fin::Fail(error) => Fin::Fail(error),
            Fin::Succ(_) => panic!("Fin::cast called on a success value"),
        }
    }

    /// Borrow the error, if any
    pub fn error(&self) -> Option<&Error> {
        match self {
            Fin::Succ(_) => None,
            Fin::Fail(error) => Some(error),
        }
    }

    /// Convert into a plain `Result`
    pub fn into_result(self) -> Result<A, Error> {
        match self {
            Fin::Succ(value) => Ok(value),
            Fin::Fail(error) => Err(error),
        }
    }
}

impl<A> Fin<Fin<A>> {
    /// Collapse a nested `Fin`, propagating whichever layer failed first
    pub fn flatten(self) -> Fin<A> {
        match self {
            Fin::Succ(inner) => inner,
            Fin::Fail(error) => Fin::Fail(error),
        }
    }
}

impl<A> From<Result<A, Error>> for Fin<A> {
    fn from(result: Result<A, Error>) -> Self {
        match result {
            Ok(value) => Fin::Succ(value),
            Err(error) => Fin::Fail(error),
        }
    }
}

impl<A> From<Fin<A>> for Result<A, Error> {
    fn from(fin: Fin<A>) -> Self {
        fin.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_variant() {
        let ok = Fin::succ(1);
        assert!(ok.is_succ());
        assert!(!ok.is_fail());

        let bad: Fin<i32> = Fin::fail(Error::new("e"));
        assert!(bad.is_fail());
        assert!(!bad.is_succ());
    }

    #[test]
    fn test_map_short_circuits() {
        let bad: Fin<i32> = Fin::fail(Error::Cancelled);
        assert_eq!(bad.map(|x| x + 1), Fin::Fail(Error::Cancelled));
    }

    #[test]
    fn test_and_then_never_invokes_f_on_failure() {
        let mut invoked = false;
        let bad: Fin<i32> = Fin::fail(Error::new("e"));
        let result = bad.and_then(|x| {
            invoked = true;
            Fin::succ(x)
        });
        assert!(!invoked);
        assert_eq!(result, Fin::fail(Error::new("e")));
    }

    #[test]
    fn test_bi_map() {
        let fin = Fin::succ(1).bi_map(|x| x + 1, |e| e);
        assert_eq!(fin, Fin::Succ(2));

        let fin: Fin<i32> =
            Fin::fail(Error::new("a")).bi_map(|x: i32| x, |_| Error::new("b"));
        assert_eq!(fin, Fin::fail(Error::new("b")));
    }

    #[test]
    fn test_cast_carries_error() {
        let bad: Fin<i32> = Fin::fail(Error::PredicateFailed);
        let recast: Fin<Vec<u8>> = bad.cast();
        assert_eq!(recast, Fin::Fail(Error::PredicateFailed));
    }

    #[test]
    #[should_panic(expected = "Fin::cast called on a success value")]
    fn test_cast_panics_on_success() {
        let _ignored: Fin<String> = Fin::succ(1).cast();
    }

    #[test]
    fn test_flatten() {
        let nested = Fin::succ(Fin::succ(5));
        assert_eq!(nested.flatten(), Fin::Succ(5));

        let outer_fail: Fin<Fin<i32>> = Fin::fail(Error::new("outer"));
        assert_eq!(outer_fail.flatten(), Fin::fail(Error::new("outer")));

        let inner_fail: Fin<Fin<i32>> = Fin::succ(Fin::fail(Error::new("inner")));
        assert_eq!(inner_fail.flatten(), Fin::fail(Error::new("inner")));
    }

    #[test]
    fn test_result_round_trip() {
        let fin: Fin<i32> = Ok(3).into();
        assert_eq!(fin, Fin::Succ(3));
        assert_eq!(fin.into_result(), Ok(3));
    }
}
