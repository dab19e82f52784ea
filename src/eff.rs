//! Synchronous effect values
//!
//! This module provides [`Eff`], a lazy, memoized description of a
//! synchronous computation that may fail. Nothing executes until
//! [`run`](Eff::run) is called with an environment; the first run caches the
//! outcome and later runs replay it until [`clear`](Eff::clear) opens a new
//! epoch.
//!
//! The environment-free form is just `Eff<A>` with the default `()`
//! environment, which additionally offers [`run_standalone`](Eff::run_standalone).
//!
//! # Examples
//!
//! ## Laziness and memoization
//!
//! ```
//! use eddy::{Eff, Fin};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let runs = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&runs);
//! let effect = Eff::effect(move |_: &()| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     21
//! })
//! .map(|x| x * 2);
//!
//! // Describing the computation ran nothing.
//! assert_eq!(runs.load(Ordering::SeqCst), 0);
//!
//! assert_eq!(effect.run_standalone(), Fin::Succ(42));
//! assert_eq!(effect.run_standalone(), Fin::Succ(42));
//! assert_eq!(runs.load(Ordering::SeqCst), 1);
//!
//! effect.clear();
//! assert_eq!(effect.run_standalone(), Fin::Succ(42));
//! assert_eq!(runs.load(Ordering::SeqCst), 2);
//! ```
//!
//! ## Composing with an environment
//!
//! ```
//! use eddy::{Eff, Fin};
//!
//! struct Env {
//!     base: i32,
//! }
//!
//! let effect = Eff::effect(|env: &Env| env.base).and_then(|x| Eff::success(x + 1));
//! assert_eq!(effect.run(&Env { base: 41 }), Fin::Succ(42));
//! ```

use std::fmt;
use std::ops::BitOr;

use crate::thunk::{Thunk, ThunkAsync};
use crate::{Aff, Error, Fin};

/// A lazy, memoized, synchronous effect value
///
/// `Eff<A, Env>` wraps a [`Thunk`] and inherits its contract: run once per
/// epoch, cache the outcome, reset explicitly. Clones share the cache.
/// Combinators build *new* effects with their own cache, evaluating their
/// sources through the memoized path.
pub struct Eff<A, Env = ()> {
    thunk: Thunk<A, Env>,
}

impl<A, Env> Clone for Eff<A, Env> {
    fn clone(&self) -> Self {
        Eff {
            thunk: self.thunk.clone(),
        }
    }
}

impl<A, Env> Eff<A, Env>
where
    A: Clone + Send + 'static,
    Env: 'static,
{
    /// Wrap an existing thunk
    pub fn from_thunk(thunk: Thunk<A, Env>) -> Self {
        Eff { thunk }
    }

    /// Lift a computation that always produces a value (or panics)
    ///
    /// Panics are captured at the thunk boundary and surface as
    /// [`Error::Panicked`].
    pub fn effect<F>(f: F) -> Self
    where
        F: Fn(&Env) -> A + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| Fin::Succ(f(env))))
    }

    /// Lift a computation that already reports success or failure
    ///
    /// This is the most general lift; [`effect`](Eff::effect),
    /// [`success`](Eff::success) and [`fail`](Eff::fail) are conveniences
    /// over it.
    pub fn effect_maybe<F>(f: F) -> Self
    where
        F: Fn(&Env) -> Fin<A> + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(f))
    }

    /// Lift a known value
    pub fn success(value: A) -> Self
    where
        A: Sync,
    {
        Eff::from_thunk(Thunk::of(Fin::Succ(value)))
    }

    /// Lift a known failure
    pub fn fail(error: Error) -> Self {
        Eff::from_thunk(Thunk::new(move |_| Fin::Fail(error.clone())))
    }

    /// Run the effect with the given environment
    ///
    /// Returns the cached outcome when one exists for the current epoch;
    /// otherwise evaluates, caches, and returns. Never panics on user-code
    /// failure. Concurrent runs of a shared effect evaluate at most once
    /// (see [`Thunk::value`]).
    pub fn run(&self, env: &Env) -> Fin<A> {
        self.thunk.value(env)
    }

    /// Discard the cached outcome so the next run evaluates afresh
    pub fn clear(&self) {
        self.thunk.clear();
    }

    /// Transform the success value
    pub fn map<B, F>(self, f: F) -> Eff<B, Env>
    where
        B: Clone + Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Eff::from_thunk(self.thunk.map(f))
    }

    /// Transform the error
    pub fn map_err<F>(self, f: F) -> Eff<A, Env>
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        Eff::from_thunk(self.thunk.bi_map(|a| a, f))
    }

    /// Transform both channels at once
    pub fn bi_map<B, FS, FF>(self, succ: FS, fail: FF) -> Eff<B, Env>
    where
        B: Clone + Send + 'static,
        FS: Fn(A) -> B + Send + Sync + 'static,
        FF: Fn(Error) -> Error + Send + Sync + 'static,
    {
        Eff::from_thunk(self.thunk.bi_map(succ, fail))
    }

    /// Chain effects: on success, run the effect produced by `f`
    ///
    /// Failures short-circuit; `f` is never invoked for a failed source.
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Eff, Error, Fin};
    ///
    /// let effect = Eff::<i32>::success(5).and_then(|x| Eff::success(x * 2));
    /// assert_eq!(effect.run_standalone(), Fin::Succ(10));
    ///
    /// let effect = Eff::<i32>::fail(Error::new("e"))
    ///     .and_then(|x| Eff::success(x * 2));
    /// assert_eq!(effect.run_standalone(), Fin::fail(Error::new("e")));
    /// ```
    pub fn and_then<B, F>(self, f: F) -> Eff<B, Env>
    where
        B: Clone + Send + 'static,
        F: Fn(A) -> Eff<B, Env> + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| match self.run(env) {
            Fin::Succ(value) => f(value).run(env),
            Fin::Fail(error) => Fin::Fail(error),
        }))
    }

    /// Chain both channels: one continuation per outcome
    pub fn bi_and_then<B, FS, FF>(self, succ: FS, fail: FF) -> Eff<B, Env>
    where
        B: Clone + Send + 'static,
        FS: Fn(A) -> Eff<B, Env> + Send + Sync + 'static,
        FF: Fn(Error) -> Eff<B, Env> + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| match self.run(env) {
            Fin::Succ(value) => succ(value).run(env),
            Fin::Fail(error) => fail(error).run(env),
        }))
    }

    /// Recover from failure with a fallback effect
    ///
    /// `f` is only invoked when the source fails.
    pub fn or_else<F>(self, f: F) -> Eff<A, Env>
    where
        F: Fn(Error) -> Eff<A, Env> + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| match self.run(env) {
            Fin::Succ(value) => Fin::Succ(value),
            Fin::Fail(error) => f(error).run(env),
        }))
    }

    /// Keep the value only if the predicate holds
    ///
    /// A rejected value fails with [`Error::PredicateFailed`] - a distinct
    /// marker, not the cancellation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Eff, Error, Fin};
    ///
    /// let effect = Eff::<i32>::success(42).filter(|x| *x > 0);
    /// assert_eq!(effect.run_standalone(), Fin::Succ(42));
    ///
    /// let effect = Eff::<i32>::success(-1).filter(|x| *x > 0);
    /// assert_eq!(effect.run_standalone(), Fin::Fail(Error::PredicateFailed));
    /// ```
    pub fn filter<P>(self, predicate: P) -> Eff<A, Env>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| match self.run(env) {
            Fin::Succ(value) if predicate(&value) => Fin::Succ(value),
            Fin::Succ(_) => Fin::Fail(Error::PredicateFailed),
            Fin::Fail(error) => Fin::Fail(error),
        }))
    }

    /// Pair with another effect, evaluated sequentially left-to-right
    ///
    /// The first failure encountered is the result; the right side does not
    /// run when the left fails.
    pub fn zip<B>(self, other: Eff<B, Env>) -> Eff<(A, B), Env>
    where
        B: Clone + Send + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| match self.run(env) {
            Fin::Succ(a) => match other.run(env) {
                Fin::Succ(b) => Fin::Succ((a, b)),
                Fin::Fail(error) => Fin::Fail(error),
            },
            Fin::Fail(error) => Fin::Fail(error),
        }))
    }

    /// Lift into the asynchronous effect family
    ///
    /// Lossless: the memo cell is shared, so an already-cached outcome is
    /// never re-executed and `clear` stays coherent across both views.
    pub fn to_async(self) -> Aff<A, Env>
    where
        Env: Sync,
    {
        Aff::from_thunk(ThunkAsync::from_sync(self.thunk))
    }
}

impl<A> Eff<A, ()>
where
    A: Clone + Send + 'static,
{
    /// Run an environment-free effect
    pub fn run_standalone(&self) -> Fin<A> {
        self.run(&())
    }

    /// Re-type against a concrete environment, ignoring it
    ///
    /// Lossless: shares the memo cell with the source.
    pub fn with_env<Env: 'static>(self) -> Eff<A, Env> {
        Eff::from_thunk(self.thunk.with_env())
    }
}

impl<A, Env> Eff<Eff<A, Env>, Env>
where
    A: Clone + Send + 'static,
    Env: 'static,
{
    /// Collapse a nested effect
    ///
    /// The outer effect runs first; only on outer success does the inner
    /// effect run. Whichever fails first is the result.
    pub fn flatten(self) -> Eff<A, Env> {
        Eff::from_thunk(Thunk::new(move |env| match self.run(env) {
            Fin::Succ(inner) => inner.run(env),
            Fin::Fail(error) => Fin::Fail(error),
        }))
    }
}

/// Alternative: `left | right` runs `right` only if `left` failed
///
/// # Examples
///
/// ```
/// use eddy::{Eff, Error, Fin};
///
/// let effect = Eff::<i32>::fail(Error::new("e")) | Eff::success(7);
/// assert_eq!(effect.run_standalone(), Fin::Succ(7));
///
/// let effect = Eff::<i32>::success(1) | Eff::success(2);
/// assert_eq!(effect.run_standalone(), Fin::Succ(1));
/// ```
impl<A, Env> BitOr for Eff<A, Env>
where
    A: Clone + Send + 'static,
    Env: 'static,
{
    type Output = Eff<A, Env>;

    fn bitor(self, rhs: Eff<A, Env>) -> Eff<A, Env> {
        self.or_else(move |_| rhs.clone())
    }
}

impl<A, Env> From<Eff<A, Env>> for Aff<A, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    fn from(eff: Eff<A, Env>) -> Self {
        eff.to_async()
    }
}

impl<A, Env> fmt::Debug for Eff<A, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eff").field("thunk", &self.thunk).finish()
    }
}
