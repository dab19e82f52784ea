//! Bounded-parallel combinators for asynchronous effects
//!
//! These run at most `limit` per-item effects concurrently on the current
//! runtime via an ordered buffered stream. Every started effect runs to
//! completion even when another item fails; the reported failure is the
//! first one in the *original item order*, not completion order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::thunk::ThunkAsync;
use crate::{Aff, Fin};

/// Concurrency bound used by the `*_par` combinators when the caller does
/// not pass one explicitly.
pub const DEFAULT_PARALLEL_LIMIT: usize = 8;

impl<I, Env> Aff<I, Env>
where
    I: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Run a per-item effect over each element with bounded concurrency
    ///
    /// Equivalent to
    /// [`for_each_par_limit`](Aff::for_each_par_limit) with
    /// [`DEFAULT_PARALLEL_LIMIT`].
    pub fn for_each_par<T, F>(self, per: F) -> Aff<(), Env>
    where
        I: IntoIterator<Item = T>,
        <I as IntoIterator>::IntoIter: Send,
        T: Send + 'static,
        F: Fn(T) -> Aff<(), Env> + Send + Sync + 'static,
    {
        self.for_each_par_limit(DEFAULT_PARALLEL_LIMIT, per)
    }

    /// Run a per-item effect over each element, at most `limit` at a time
    ///
    /// All per-item effects are attempted regardless of individual
    /// failures; if any failed, the failure belonging to the earliest item
    /// is returned. A `limit` of zero is treated as one.
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Aff, Fin};
    ///
    /// # tokio_test::block_on(async {
    /// let effect = Aff::effect(|_: &()| async { vec![1, 2, 3, 4] })
    ///     .for_each_par_limit(2, |x| {
    ///         Aff::effect(move |_| async move {
    ///             let _ = x;
    ///         })
    ///     });
    /// assert_eq!(effect.run_standalone().await, Fin::Succ(()));
    /// # });
    /// ```
    pub fn for_each_par_limit<T, F>(self, limit: usize, per: F) -> Aff<(), Env>
    where
        I: IntoIterator<Item = T>,
        <I as IntoIterator>::IntoIter: Send,
        T: Send + 'static,
        F: Fn(T) -> Aff<(), Env> + Send + Sync + 'static,
    {
        let per = Arc::new(per);
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let per = Arc::clone(&per);
            Box::pin(async move {
                let items = match src.run(env).await {
                    Fin::Succ(items) => items,
                    Fin::Fail(error) => return Fin::Fail(error),
                };
                let results: Vec<Fin<()>> = stream::iter(items.into_iter().map(|item| per(item)))
                    .map(|effect| async move { effect.run(env).await })
                    .buffered(limit.max(1))
                    .collect()
                    .await;
                for fin in results {
                    if fin.is_fail() {
                        return fin;
                    }
                }
                Fin::Succ(())
            })
        }))
    }
}

/// Evaluate a batch of effects with bounded concurrency, collecting the
/// values in input order
///
/// Uses [`DEFAULT_PARALLEL_LIMIT`]; see
/// [`sequence_par_limit`] for an explicit bound.
pub fn sequence_par<A, Env>(effects: Vec<Aff<A, Env>>) -> Aff<Vec<A>, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    sequence_par_limit(effects, DEFAULT_PARALLEL_LIMIT)
}

/// Evaluate a batch of effects, at most `limit` at a time
///
/// Every effect runs to completion. On total success the values come back
/// in the order the effects were given; otherwise the failure of the
/// earliest-positioned failing effect is returned.
///
/// # Examples
///
/// ```
/// use eddy::{parallel::sequence_par_limit, Aff, Fin};
///
/// # tokio_test::block_on(async {
/// let effects = (0..4)
///     .map(|i| Aff::effect(move |_: &()| async move { i * 10 }))
///     .collect();
/// let batch = sequence_par_limit(effects, 2);
/// assert_eq!(batch.run_standalone().await, Fin::Succ(vec![0, 10, 20, 30]));
/// # });
/// ```
pub fn sequence_par_limit<A, Env>(effects: Vec<Aff<A, Env>>, limit: usize) -> Aff<Vec<A>, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    Aff::from_thunk(ThunkAsync::new(move |env| {
        let effects = effects.clone();
        Box::pin(async move {
            let results: Vec<Fin<A>> = stream::iter(effects)
                .map(|effect| async move { effect.run(env).await })
                .buffered(limit.max(1))
                .collect()
                .await;
            let mut values = Vec::with_capacity(results.len());
            for fin in results {
                match fin {
                    Fin::Succ(value) => values.push(value),
                    Fin::Fail(error) => return Fin::Fail(error),
                }
            }
            Fin::Succ(values)
        })
    }))
}
