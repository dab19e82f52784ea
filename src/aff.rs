//! Asynchronous effect values
//!
//! This module provides [`Aff`], the asynchronous counterpart of
//! [`Eff`](crate::Eff). The contract is identical - lazy, memoized per
//! epoch, explicitly resettable - but the wrapped computation is a future
//! and may suspend at its own await points. Independent effects can run
//! concurrently via [`zip`](Aff::zip), the bounded-parallel combinators in
//! [`parallel`](crate::parallel), or fire-and-forget via [`fork`](Aff::fork).
//!
//! # Examples
//!
//! ```
//! use eddy::{Aff, Fin};
//!
//! # tokio_test::block_on(async {
//! let effect = Aff::effect(|_: &()| async { 21 }).map(|x| x * 2);
//! assert_eq!(effect.run_standalone().await, Fin::Succ(42));
//! // Memoized: the same outcome without re-running.
//! assert_eq!(effect.run_standalone().await, Fin::Succ(42));
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::ops::BitOr;
use std::sync::Arc;

use crate::thunk::ThunkAsync;
use crate::{Error, Fin};

/// A lazy, memoized, asynchronous effect value
///
/// `Aff<A, Env>` wraps a [`ThunkAsync`] and inherits its contract: the
/// wrapped future-producing function runs at most once per epoch, even when
/// a shared effect is run concurrently from several tasks; contenders await
/// the winner and observe its cached outcome.
///
/// The future produced by a user constructor must be `'static` - clone what
/// it needs from the environment before the first await. Combinators built
/// by this crate borrow the environment internally instead.
pub struct Aff<A, Env = ()> {
    thunk: ThunkAsync<A, Env>,
}

impl<A, Env> Clone for Aff<A, Env> {
    fn clone(&self) -> Self {
        Aff {
            thunk: self.thunk.clone(),
        }
    }
}

impl<A, Env> Aff<A, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Wrap an existing asynchronous thunk
    pub fn from_thunk(thunk: ThunkAsync<A, Env>) -> Self {
        Aff { thunk }
    }

    /// Lift an async computation that always produces a value (or panics)
    ///
    /// Panics inside the future are captured at the thunk boundary and
    /// surface as [`Error::Panicked`].
    pub fn effect<F, Fut>(f: F) -> Self
    where
        F: Fn(&Env) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = A> + Send + 'static,
    {
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let fut = f(env);
            Box::pin(async move { Fin::Succ(fut.await) })
        }))
    }

    /// Lift an async computation that already reports success or failure
    pub fn effect_maybe<F, Fut>(f: F) -> Self
    where
        F: Fn(&Env) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Fin<A>> + Send + 'static,
    {
        Aff::from_thunk(ThunkAsync::new(move |env| Box::pin(f(env))))
    }

    /// Lift a known value
    pub fn success(value: A) -> Self
    where
        A: Sync,
    {
        Aff::from_thunk(ThunkAsync::new(move |_| {
            let fin = Fin::Succ(value.clone());
            Box::pin(async move { fin })
        }))
    }

    /// Lift a known failure
    pub fn fail(error: Error) -> Self {
        Aff::from_thunk(ThunkAsync::new(move |_| {
            let fin = Fin::Fail(error.clone());
            Box::pin(async move { fin })
        }))
    }

    /// Run the effect with the given environment
    ///
    /// Returns the cached outcome when one exists for the current epoch;
    /// otherwise evaluates (suspending wherever the wrapped future does),
    /// caches, and returns. Never panics on user-code failure.
    pub async fn run(&self, env: &Env) -> Fin<A> {
        self.thunk.value(env).await
    }

    /// Discard the cached outcome so the next run evaluates afresh
    pub fn clear(&self) {
        self.thunk.clear();
    }

    /// Transform the success value
    pub fn map<B, F>(self, f: F) -> Aff<B, Env>
    where
        B: Clone + Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Aff::from_thunk(self.thunk.map(f))
    }

    /// Transform the error
    pub fn map_err<F>(self, f: F) -> Aff<A, Env>
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        Aff::from_thunk(self.thunk.bi_map(|a| a, f))
    }

    /// Transform both channels at once
    pub fn bi_map<B, FS, FF>(self, succ: FS, fail: FF) -> Aff<B, Env>
    where
        B: Clone + Send + 'static,
        FS: Fn(A) -> B + Send + Sync + 'static,
        FF: Fn(Error) -> Error + Send + Sync + 'static,
    {
        Aff::from_thunk(self.thunk.bi_map(succ, fail))
    }

    /// Chain effects: on success, run the effect produced by `f`
    ///
    /// Strictly sequential - the continuation starts only after the source
    /// completes. Failures short-circuit; `f` is never invoked for them.
    pub fn and_then<B, F>(self, f: F) -> Aff<B, Env>
    where
        B: Clone + Send + 'static,
        F: Fn(A) -> Aff<B, Env> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let f = Arc::clone(&f);
            Box::pin(async move {
                match src.run(env).await {
                    Fin::Succ(value) => f(value).run(env).await,
                    Fin::Fail(error) => Fin::Fail(error),
                }
            })
        }))
    }

    /// Chain both channels: one continuation per outcome
    pub fn bi_and_then<B, FS, FF>(self, succ: FS, fail: FF) -> Aff<B, Env>
    where
        B: Clone + Send + 'static,
        FS: Fn(A) -> Aff<B, Env> + Send + Sync + 'static,
        FF: Fn(Error) -> Aff<B, Env> + Send + Sync + 'static,
    {
        let succ = Arc::new(succ);
        let fail = Arc::new(fail);
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let succ = Arc::clone(&succ);
            let fail = Arc::clone(&fail);
            Box::pin(async move {
                match src.run(env).await {
                    Fin::Succ(value) => succ(value).run(env).await,
                    Fin::Fail(error) => fail(error).run(env).await,
                }
            })
        }))
    }

    /// Recover from failure with a fallback effect
    pub fn or_else<F>(self, f: F) -> Aff<A, Env>
    where
        F: Fn(Error) -> Aff<A, Env> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let f = Arc::clone(&f);
            Box::pin(async move {
                match src.run(env).await {
                    Fin::Succ(value) => Fin::Succ(value),
                    Fin::Fail(error) => f(error).run(env).await,
                }
            })
        }))
    }

    /// Keep the value only if the predicate holds
    ///
    /// A rejected value fails with [`Error::PredicateFailed`].
    pub fn filter<P>(self, predicate: P) -> Aff<A, Env>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let predicate = Arc::clone(&predicate);
            Box::pin(async move {
                match src.run(env).await {
                    Fin::Succ(value) if predicate(&value) => Fin::Succ(value),
                    Fin::Succ(_) => Fin::Fail(Error::PredicateFailed),
                    Fin::Fail(error) => Fin::Fail(error),
                }
            })
        }))
    }

    /// Pair with another effect, running both concurrently
    ///
    /// Both sides are always awaited, even when one fails, so a failure on
    /// either side is observable; when both fail, the left failure is the
    /// result.
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Aff, Fin};
    ///
    /// # tokio_test::block_on(async {
    /// let effect = Aff::<i32>::success(1).zip(Aff::success("a"));
    /// assert_eq!(effect.run_standalone().await, Fin::Succ((1, "a")));
    /// # });
    /// ```
    pub fn zip<B>(self, other: Aff<B, Env>) -> Aff<(A, B), Env>
    where
        B: Clone + Send + 'static,
    {
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let left = self.clone();
            let right = other.clone();
            Box::pin(async move {
                let (l, r) = futures::join!(left.run(env), right.run(env));
                match (l, r) {
                    (Fin::Succ(a), Fin::Succ(b)) => Fin::Succ((a, b)),
                    (Fin::Fail(error), _) => Fin::Fail(error),
                    (_, Fin::Fail(error)) => Fin::Fail(error),
                }
            })
        }))
    }

    /// Schedule this effect on the worker pool, fire-and-forget
    ///
    /// Running the returned effect spawns the computation and immediately
    /// succeeds with `()`, regardless of the forked computation's eventual
    /// outcome. Failing to even schedule it (no runtime handle available)
    /// is surfaced synchronously as the fork's own failure.
    ///
    /// The environment is cloned into the spawned task; the forked
    /// computation observes cancellation only cooperatively, through
    /// whatever token the environment carries.
    pub fn fork(self) -> Aff<(), Env>
    where
        Env: Clone + Send,
    {
        Aff::from_thunk(ThunkAsync::new(move |env: &Env| {
            let child = self.clone();
            let env = env.clone();
            Box::pin(async move {
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            let _ = child.run(&env).await;
                        });
                        Fin::Succ(())
                    }
                    Err(err) => Fin::Fail(Error::new(format!(
                        "fork: failed to schedule: {}",
                        err
                    ))),
                }
            })
        }))
    }
}

impl<A> Aff<A, ()>
where
    A: Clone + Send + 'static,
{
    /// Run an environment-free effect
    pub async fn run_standalone(&self) -> Fin<A> {
        self.run(&()).await
    }

    /// Re-type against a concrete environment, ignoring it
    ///
    /// Lossless: shares the memo cell with the source.
    pub fn with_env<Env: Sync + 'static>(self) -> Aff<A, Env> {
        Aff::from_thunk(self.thunk.with_env())
    }
}

impl<A, Env> Aff<Aff<A, Env>, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Collapse a nested effect
    ///
    /// The outer effect runs first; only on outer success does the inner
    /// effect run. Whichever fails first is the result.
    pub fn flatten(self) -> Aff<A, Env> {
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let outer = self.clone();
            Box::pin(async move {
                match outer.run(env).await {
                    Fin::Succ(inner) => inner.run(env).await,
                    Fin::Fail(error) => Fin::Fail(error),
                }
            })
        }))
    }
}

/// Alternative: `left | right` runs `right` only if `left` failed
impl<A, Env> BitOr for Aff<A, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    type Output = Aff<A, Env>;

    fn bitor(self, rhs: Aff<A, Env>) -> Aff<A, Env> {
        self.or_else(move |_| rhs.clone())
    }
}

impl<A, Env> fmt::Debug for Aff<A, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aff").field("thunk", &self.thunk).finish()
    }
}
