//! Synchronous memoizing thunk

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::cell::{Claim, MemoCell};
use crate::error::panic_message;
use crate::{Error, Fin};

type EvalFn<A, Env> = Arc<dyn Fn(&Env) -> Fin<A> + Send + Sync>;

/// A possibly-deferred, memoizing computation `&Env -> Fin<A>`
///
/// The wrapped function is set at construction and never mutated; the cached
/// outcome lives in a shared [`MemoCell`] and is filled exactly once per
/// epoch. Clones share the cell, so a cached outcome is visible through
/// every clone and [`clear`](Thunk::clear) resets them all.
///
/// # Evaluation contract
///
/// - [`value`](Thunk::value) returns the cached `Fin` when one exists for
///   the current epoch; otherwise it runs the wrapped function exactly once,
///   capturing any panic as [`Error::Panicked`], caches the outcome, and
///   returns it.
/// - Concurrent `value` calls before the first completes block until the
///   winner finishes, then observe its cached outcome (single-evaluation
///   guarantee).
/// - [`clear`](Thunk::clear) discards the cache and starts a new epoch; an
///   evaluation in flight at that moment completes but its outcome is
///   discarded.
///
/// # Examples
///
/// ```
/// use eddy::thunk::Thunk;
/// use eddy::Fin;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let runs = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&runs);
/// let thunk = Thunk::new(move |_: &()| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Fin::succ(42)
/// });
///
/// assert_eq!(thunk.value(&()), Fin::Succ(42));
/// assert_eq!(thunk.value(&()), Fin::Succ(42));
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
///
/// thunk.clear();
/// assert_eq!(thunk.value(&()), Fin::Succ(42));
/// assert_eq!(runs.load(Ordering::SeqCst), 2);
/// ```
pub struct Thunk<A, Env = ()> {
    eval: EvalFn<A, Env>,
    cell: Arc<MemoCell<A>>,
}

impl<A, Env> Clone for Thunk<A, Env> {
    fn clone(&self) -> Self {
        Thunk {
            eval: Arc::clone(&self.eval),
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A, Env> Thunk<A, Env>
where
    A: Clone + Send + 'static,
    Env: 'static,
{
    /// Wrap a re-runnable computation without evaluating it
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Env) -> Fin<A> + Send + Sync + 'static,
    {
        Thunk {
            eval: Arc::new(f),
            cell: Arc::new(MemoCell::new()),
        }
    }

    /// Wrap a known outcome
    ///
    /// The outcome is replayed on every evaluation, in every epoch; `clear`
    /// has no observable consequence beyond the epoch change.
    pub fn of(fin: Fin<A>) -> Self
    where
        A: Sync,
    {
        Thunk::new(move |_| fin.clone())
    }

    /// Evaluate, returning the cached outcome when one exists
    ///
    /// See the type-level docs for the full evaluation contract.
    pub fn value(&self, env: &Env) -> Fin<A> {
        match self.cell.claim_sync() {
            Claim::Cached(fin) => fin,
            Claim::Won(guard) => {
                let fin = match catch_unwind(AssertUnwindSafe(|| (self.eval)(env))) {
                    Ok(fin) => fin,
                    Err(payload) => Fin::Fail(Error::panicked(panic_message(payload))),
                };
                guard.complete(&fin);
                fin
            }
        }
    }

    /// Discard the cached outcome and start a new epoch
    ///
    /// Previously returned `Fin` values are unaffected.
    pub fn clear(&self) {
        self.cell.clear();
    }

    /// Derive a thunk that applies `f` to this thunk's success value
    ///
    /// The source thunk is not evaluated at construction time; failures pass
    /// through unchanged.
    pub fn map<B, F>(self, f: F) -> Thunk<B, Env>
    where
        B: Clone + Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Thunk::new(move |env| self.value(env).map(|a| f(a)))
    }

    /// Derive a thunk transforming both channels
    pub fn bi_map<B, FS, FF>(self, succ: FS, fail: FF) -> Thunk<B, Env>
    where
        B: Clone + Send + 'static,
        FS: Fn(A) -> B + Send + Sync + 'static,
        FF: Fn(Error) -> Error + Send + Sync + 'static,
    {
        Thunk::new(move |env| self.value(env).bi_map(|a| succ(a), |e| fail(e)))
    }

    pub(crate) fn into_parts(self) -> (EvalFn<A, Env>, Arc<MemoCell<A>>) {
        (self.eval, self.cell)
    }
}

impl<A> Thunk<A, ()>
where
    A: Clone + Send + 'static,
{
    /// Re-type an environment-free thunk against a concrete environment
    ///
    /// The environment is ignored. The memo cell is shared with the source,
    /// so a cached outcome survives the conversion and `clear` through
    /// either view resets both.
    pub fn with_env<Env>(self) -> Thunk<A, Env> {
        let eval = self.eval;
        Thunk {
            eval: Arc::new(move |_: &Env| (eval)(&())),
            cell: self.cell,
        }
    }
}

impl<A, Env> Thunk<Thunk<A, Env>, Env>
where
    A: Clone + Send + 'static,
    Env: 'static,
{
    /// Collapse a thunk whose success value is itself a thunk
    ///
    /// Evaluation runs the outer thunk; only on outer success is the inner
    /// thunk run. Whichever layer fails first is the result.
    pub fn flatten(self) -> Thunk<A, Env> {
        Thunk::new(move |env| match self.value(env) {
            Fin::Succ(inner) => inner.value(env),
            Fin::Fail(error) => Fin::Fail(error),
        })
    }
}

impl<A, Env> fmt::Debug for Thunk<A, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("eval", &"<function>")
            .field("cell", &self.cell)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(runs: Arc<AtomicUsize>, value: i32) -> Thunk<i32> {
        Thunk::new(move |_| {
            runs.fetch_add(1, Ordering::SeqCst);
            Fin::succ(value)
        })
    }

    #[test]
    fn test_memoizes_until_cleared() {
        let runs = Arc::new(AtomicUsize::new(0));
        let thunk = counted(Arc::clone(&runs), 5);

        assert_eq!(thunk.value(&()), Fin::Succ(5));
        assert_eq!(thunk.value(&()), Fin::Succ(5));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        thunk.clear();
        assert_eq!(thunk.value(&()), Fin::Succ(5));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clones_share_the_cache() {
        let runs = Arc::new(AtomicUsize::new(0));
        let thunk = counted(Arc::clone(&runs), 1);
        let twin = thunk.clone();

        thunk.value(&());
        twin.value(&());
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        twin.clear();
        thunk.value(&());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_construction_is_lazy() {
        let runs = Arc::new(AtomicUsize::new(0));
        let thunk = counted(Arc::clone(&runs), 1);
        let mapped = thunk.map(|x| x * 2);
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        assert_eq!(mapped.value(&()), Fin::Succ(2));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_map_passes_failures_through() {
        let thunk: Thunk<i32> = Thunk::new(|_| Fin::fail(Error::new("e")));
        let mapped = thunk.map(|x| x + 1);
        assert_eq!(mapped.value(&()), Fin::fail(Error::new("e")));
    }

    #[test]
    fn test_panic_becomes_failure() {
        let thunk: Thunk<i32> = Thunk::new(|_| panic!("kaboom"));
        match thunk.value(&()) {
            Fin::Fail(Error::Panicked(msg)) => assert_eq!(msg, "kaboom"),
            other => panic!("expected captured panic, got {:?}", other),
        }
        // The capture itself is cached like any other outcome.
        assert!(thunk.value(&()).is_fail());
    }

    #[test]
    fn test_flatten_runs_inner_only_on_outer_success() {
        let inner_runs = Arc::new(AtomicUsize::new(0));
        let inner = counted(Arc::clone(&inner_runs), 10);
        let outer = Thunk::new(move |_| Fin::succ(inner.clone()));
        assert_eq!(outer.flatten().value(&()), Fin::Succ(10));
        assert_eq!(inner_runs.load(Ordering::SeqCst), 1);

        let inner_runs = Arc::new(AtomicUsize::new(0));
        let inner = counted(Arc::clone(&inner_runs), 10);
        let outer: Thunk<Thunk<i32>> = Thunk::new(move |_| {
            let _inner = inner.clone();
            Fin::fail(Error::new("outer"))
        });
        assert_eq!(outer.flatten().value(&()), Fin::fail(Error::new("outer")));
        assert_eq!(inner_runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_env_shares_cache_and_clear() {
        let runs = Arc::new(AtomicUsize::new(0));
        let plain = counted(Arc::clone(&runs), 3);
        plain.value(&());

        struct Env;
        let typed: Thunk<i32, Env> = plain.clone().with_env();
        // Already cached: the conversion must not re-execute.
        assert_eq!(typed.value(&Env), Fin::Succ(3));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Clearing the typed view clears the shared cell.
        typed.clear();
        assert_eq!(plain.value(&()), Fin::Succ(3));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_map_over_typed_env() {
        struct Env {
            base: i32,
        }
        let thunk = Thunk::new(|env: &Env| Fin::succ(env.base)).map(|x| x + 1);
        assert_eq!(thunk.value(&Env { base: 41 }), Fin::Succ(42));
    }

    #[test]
    fn test_of_replays_across_epochs() {
        let thunk = Thunk::of(Fin::succ("v"));
        assert_eq!(thunk.value(&()), Fin::Succ("v"));
        thunk.clear();
        assert_eq!(thunk.value(&()), Fin::Succ("v"));
    }
}
