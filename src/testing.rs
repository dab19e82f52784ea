//! Helpers for testing effect-based code
//!
//! [`EvalProbe`] builds effects that count their own evaluations, which is
//! how most laziness and memoization properties are asserted. The
//! [`assert_succ!`](crate::assert_succ) and
//! [`assert_fail!`](crate::assert_fail) macros unwrap outcomes with a
//! useful message on mismatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{Aff, Eff, Error};

/// A shared evaluation counter with effect constructors that bump it
///
/// # Examples
///
/// ```
/// use eddy::testing::EvalProbe;
/// use eddy::Fin;
///
/// let probe = EvalProbe::new();
/// let effect = probe.eff(42);
/// assert_eq!(probe.count(), 0); // lazy
/// assert_eq!(effect.run_standalone(), Fin::Succ(42));
/// assert_eq!(effect.run_standalone(), Fin::Succ(42));
/// assert_eq!(probe.count(), 1); // memoized
/// ```
#[derive(Debug, Clone, Default)]
pub struct EvalProbe {
    count: Arc<AtomicUsize>,
}

impl EvalProbe {
    /// A probe that has seen no evaluations
    pub fn new() -> Self {
        EvalProbe::default()
    }

    /// How many probe-built effects have evaluated so far
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// A synchronous effect that counts, then succeeds with `value`
    pub fn eff<A>(&self, value: A) -> Eff<A>
    where
        A: Clone + Send + Sync + 'static,
    {
        let count = Arc::clone(&self.count);
        Eff::effect(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            value.clone()
        })
    }

    /// A synchronous effect that counts, then fails with `error`
    pub fn eff_fail<A>(&self, error: Error) -> Eff<A>
    where
        A: Clone + Send + 'static,
    {
        let count = Arc::clone(&self.count);
        Eff::effect_maybe(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            crate::Fin::Fail(error.clone())
        })
    }

    /// An asynchronous effect that counts, then succeeds with `value`
    pub fn aff<A>(&self, value: A) -> Aff<A>
    where
        A: Clone + Send + Sync + 'static,
    {
        let count = Arc::clone(&self.count);
        Aff::effect(move |_| {
            let count = Arc::clone(&count);
            let value = value.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                value
            }
        })
    }

    /// An asynchronous effect that counts, then fails with `error`
    pub fn aff_fail<A>(&self, error: Error) -> Aff<A>
    where
        A: Clone + Send + 'static,
    {
        let count = Arc::clone(&self.count);
        let error = Arc::new(error);
        Aff::effect_maybe(move |_| {
            let count = Arc::clone(&count);
            let error = Arc::clone(&error);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                crate::Fin::Fail((*error).clone())
            }
        })
    }
}

/// Assert that a [`Fin`](crate::Fin) is a success, optionally with an exact
/// value
#[macro_export]
macro_rules! assert_succ {
    ($fin:expr) => {
        match &$fin {
            $crate::Fin::Succ(_) => {}
            $crate::Fin::Fail(error) => panic!("expected success, got failure: {}", error),
        }
    };
    ($fin:expr, $value:expr) => {
        match &$fin {
            $crate::Fin::Succ(actual) => assert_eq!(*actual, $value),
            $crate::Fin::Fail(error) => panic!("expected success, got failure: {}", error),
        }
    };
}

/// Assert that a [`Fin`](crate::Fin) is a failure, optionally with an exact
/// error
#[macro_export]
macro_rules! assert_fail {
    ($fin:expr) => {
        match &$fin {
            $crate::Fin::Fail(_) => {}
            $crate::Fin::Succ(_) => panic!("expected failure, got success"),
        }
    };
    ($fin:expr, $error:expr) => {
        match &$fin {
            $crate::Fin::Fail(actual) => assert_eq!(*actual, $error),
            $crate::Fin::Succ(_) => panic!("expected failure, got success"),
        }
    };
}
