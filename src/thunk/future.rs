//! Asynchronous memoizing thunk

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::cell::{Claim, MemoCell};
use super::Thunk;
use crate::error::panic_message;
use crate::{Error, Fin};

type AsyncEvalFn<A, Env> =
    Arc<dyn for<'a> Fn(&'a Env) -> BoxFuture<'a, Fin<A>> + Send + Sync>;

/// The asynchronous counterpart of [`Thunk`]
///
/// Identical caching contract: the wrapped future-producing function runs at
/// most once per epoch, the outcome is cached, and [`clear`](ThunkAsync::clear)
/// starts a fresh epoch. Evaluation may suspend at any await point inside
/// the wrapped function; no thread is blocked while suspended.
///
/// Concurrent [`value`](ThunkAsync::value) calls on a shared thunk are safe:
/// contending tasks await the winner's completion and then observe its
/// cached outcome. If the winning task's future is dropped mid-evaluation,
/// the claim is released and another caller takes over.
///
/// # Examples
///
/// ```
/// use eddy::thunk::ThunkAsync;
/// use eddy::Fin;
///
/// # tokio_test::block_on(async {
/// let thunk: ThunkAsync<i32> =
///     ThunkAsync::new(|_: &()| Box::pin(async { Fin::succ(42) }));
/// assert_eq!(thunk.value(&()).await, Fin::Succ(42));
/// # });
/// ```
pub struct ThunkAsync<A, Env = ()> {
    eval: AsyncEvalFn<A, Env>,
    cell: Arc<MemoCell<A>>,
}

impl<A, Env> Clone for ThunkAsync<A, Env> {
    fn clone(&self) -> Self {
        ThunkAsync {
            eval: Arc::clone(&self.eval),
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A, Env> ThunkAsync<A, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Wrap a re-runnable future-producing computation without evaluating it
    ///
    /// The function is called once per epoch; the future it returns may
    /// borrow the environment for the duration of the evaluation.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a Env) -> BoxFuture<'a, Fin<A>> + Send + Sync + 'static,
    {
        ThunkAsync {
            eval: Arc::new(f),
            cell: Arc::new(MemoCell::new()),
        }
    }

    /// Lift a synchronous thunk, sharing its memo cell
    ///
    /// An outcome already cached by the synchronous view is returned as-is
    /// (the computation is never re-executed by the lift), and `clear`
    /// through either view resets both.
    pub fn from_sync(thunk: Thunk<A, Env>) -> Self {
        let (eval, cell) = thunk.into_parts();
        ThunkAsync {
            eval: Arc::new(move |env| {
                let eval = Arc::clone(&eval);
                Box::pin(async move { (eval)(env) })
            }),
            cell,
        }
    }

    /// Evaluate, returning the cached outcome when one exists
    ///
    /// Panics inside the wrapped future are captured and converted into
    /// [`Error::Panicked`]; they never unwind through this call.
    pub async fn value(&self, env: &Env) -> Fin<A> {
        match self.cell.claim_async().await {
            Claim::Cached(fin) => fin,
            Claim::Won(guard) => {
                let fin = match AssertUnwindSafe((self.eval)(env)).catch_unwind().await {
                    Ok(fin) => fin,
                    Err(payload) => Fin::Fail(Error::panicked(panic_message(payload))),
                };
                guard.complete(&fin);
                fin
            }
        }
    }

    /// Discard the cached outcome and start a new epoch
    pub fn clear(&self) {
        self.cell.clear();
    }

    /// Derive a thunk that applies `f` to this thunk's success value
    pub fn map<B, F>(self, f: F) -> ThunkAsync<B, Env>
    where
        B: Clone + Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ThunkAsync::new(move |env| {
            let src = self.clone();
            let f = Arc::clone(&f);
            Box::pin(async move { src.value(env).await.map(|a| f(a)) })
        })
    }

    /// Derive a thunk transforming both channels
    pub fn bi_map<B, FS, FF>(self, succ: FS, fail: FF) -> ThunkAsync<B, Env>
    where
        B: Clone + Send + 'static,
        FS: Fn(A) -> B + Send + Sync + 'static,
        FF: Fn(Error) -> Error + Send + Sync + 'static,
    {
        let succ = Arc::new(succ);
        let fail = Arc::new(fail);
        ThunkAsync::new(move |env| {
            let src = self.clone();
            let succ = Arc::clone(&succ);
            let fail = Arc::clone(&fail);
            Box::pin(async move { src.value(env).await.bi_map(|a| succ(a), |e| fail(e)) })
        })
    }
}

impl<A> ThunkAsync<A, ()>
where
    A: Clone + Send + 'static,
{
    /// Re-type an environment-free thunk against a concrete environment
    ///
    /// The environment is ignored; the memo cell is shared with the source.
    pub fn with_env<Env: Sync>(self) -> ThunkAsync<A, Env> {
        let eval = self.eval;
        ThunkAsync {
            eval: Arc::new(move |_: &Env| (eval)(&())),
            cell: self.cell,
        }
    }
}

impl<A, Env> ThunkAsync<ThunkAsync<A, Env>, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Collapse a thunk whose success value is itself a thunk
    ///
    /// The outer thunk runs first; only on outer success does the inner one
    /// run. Whichever layer fails first is the result.
    pub fn flatten(self) -> ThunkAsync<A, Env> {
        ThunkAsync::new(move |env| {
            let outer = self.clone();
            Box::pin(async move {
                match outer.value(env).await {
                    Fin::Succ(inner) => inner.value(env).await,
                    Fin::Fail(error) => Fin::Fail(error),
                }
            })
        })
    }
}

impl<A, Env> fmt::Debug for ThunkAsync<A, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThunkAsync")
            .field("eval", &"<async function>")
            .field("cell", &self.cell)
            .finish()
    }
}
