//! Resource-safe acquire/use/release
//!
//! [`bracket`] guarantees the release action runs exactly once whenever the
//! acquire action succeeded, no matter how the use phase ends (success,
//! failure, or panic). Release failures are never silently dropped: a
//! release failure after a successful use becomes the result, and a release
//! failure after a failed use is aggregated with the use failure via
//! [`Error::many`].
//!
//! [`using`] and [`using_async`] are the common special case where the
//! resource knows how to release itself through the [`Dispose`] trait.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::panic_message;
use crate::thunk::{Thunk, ThunkAsync};
use crate::{Aff, Eff, Error, Fin};

/// A resource that can release itself
///
/// `dispose` consumes the resource and reports whether cleanup succeeded.
/// Implementations should be idempotent-by-construction: taking `self` by
/// value means the type system already rules out double disposal.
pub trait Dispose {
    /// Release the resource
    fn dispose(self) -> Fin<()>;
}

/// Acquire a resource, use it, and release it exactly once
///
/// If `acquire` fails, neither `use_fn` nor `release` runs and the acquire
/// failure is the result. Otherwise `release` runs exactly once after the
/// use phase, including when `use_fn` itself panics while building the
/// inner effect.
///
/// # Examples
///
/// ```
/// use eddy::{bracket, Eff, Fin};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let released = Arc::new(AtomicUsize::new(0));
/// let probe = Arc::clone(&released);
/// let effect = bracket(
///     Eff::effect(|_: &()| "handle"),
///     move |_| {
///         probe.fetch_add(1, Ordering::SeqCst);
///         Fin::succ(())
///     },
///     |handle: &&str| Eff::success(handle.len()),
/// );
/// assert_eq!(effect.run_standalone(), Fin::Succ(6));
/// assert_eq!(released.load(Ordering::SeqCst), 1);
/// ```
pub fn bracket<R, A, Env, FRel, FUse>(
    acquire: Eff<R, Env>,
    release: FRel,
    use_fn: FUse,
) -> Eff<A, Env>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + 'static,
    Env: 'static,
    FRel: Fn(R) -> Fin<()> + Send + Sync + 'static,
    FUse: Fn(&R) -> Eff<A, Env> + Send + Sync + 'static,
{
    Eff::from_thunk(Thunk::new(move |env| {
        let resource = match acquire.run(env) {
            Fin::Succ(resource) => resource,
            Fin::Fail(error) => return Fin::Fail(error),
        };
        let outcome = match catch_unwind(AssertUnwindSafe(|| use_fn(&resource))) {
            Ok(effect) => effect.run(env),
            Err(payload) => Fin::Fail(Error::panicked(panic_message(payload))),
        };
        settle(outcome, release(resource))
    }))
}

/// Asynchronous [`bracket`]
///
/// The use phase may suspend; the release action itself stays synchronous
/// and runs on the awaiting task once the use phase has finished.
pub fn bracket_async<R, A, Env, FRel, FUse>(
    acquire: Aff<R, Env>,
    release: FRel,
    use_fn: FUse,
) -> Aff<A, Env>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + 'static,
    Env: Sync + 'static,
    FRel: Fn(R) -> Fin<()> + Send + Sync + 'static,
    FUse: Fn(&R) -> Aff<A, Env> + Send + Sync + 'static,
{
    let release = Arc::new(release);
    let use_fn = Arc::new(use_fn);
    Aff::from_thunk(ThunkAsync::new(move |env| {
        let acquire = acquire.clone();
        let release = Arc::clone(&release);
        let use_fn = Arc::clone(&use_fn);
        Box::pin(async move {
            let resource = match acquire.run(env).await {
                Fin::Succ(resource) => resource,
                Fin::Fail(error) => return Fin::Fail(error),
            };
            let outcome = match catch_unwind(AssertUnwindSafe(|| use_fn(&resource))) {
                Ok(effect) => effect.run(env).await,
                Err(payload) => Fin::Fail(Error::panicked(panic_message(payload))),
            };
            settle(outcome, release(resource))
        })
    }))
}

/// [`bracket`] for resources that release themselves
pub fn using<R, A, Env, FUse>(acquire: Eff<R, Env>, use_fn: FUse) -> Eff<A, Env>
where
    R: Dispose + Clone + Send + Sync + 'static,
    A: Clone + Send + 'static,
    Env: 'static,
    FUse: Fn(&R) -> Eff<A, Env> + Send + Sync + 'static,
{
    bracket(acquire, Dispose::dispose, use_fn)
}

/// [`bracket_async`] for resources that release themselves
pub fn using_async<R, A, Env, FUse>(acquire: Aff<R, Env>, use_fn: FUse) -> Aff<A, Env>
where
    R: Dispose + Clone + Send + Sync + 'static,
    A: Clone + Send + 'static,
    Env: Sync + 'static,
    FUse: Fn(&R) -> Aff<A, Env> + Send + Sync + 'static,
{
    bracket_async(acquire, Dispose::dispose, use_fn)
}

fn settle<A>(outcome: Fin<A>, released: Fin<()>) -> Fin<A> {
    match (outcome, released) {
        (outcome, Fin::Succ(())) => outcome,
        (Fin::Succ(_), Fin::Fail(disposal)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %disposal, "resource release failed");
            Fin::Fail(disposal)
        }
        (Fin::Fail(inner), Fin::Fail(disposal)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %disposal, "resource release failed after use failure");
            Fin::Fail(Error::many(vec![inner, disposal]))
        }
    }
}
