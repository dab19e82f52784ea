//! Cooperative cancellation capability
//!
//! Cancellation in this crate is cooperative only: a [`CancelSource`] sets a
//! flag, a [`CancelToken`] is polled (or awaited) by running computations,
//! and nothing is ever preemptively unwound. The [`HasCancel`] trait is the
//! capability an environment type must provide for the environment-dependent
//! effect combinators ([`cancel`], [`check_cancelled`], [`cancel_token`]) to
//! reach the token.
//!
//! # Examples
//!
//! ```
//! use eddy::{check_cancelled, Eff, Error, Fin, HasCancel, Runtime};
//!
//! let env = Runtime::new();
//! let effect = check_cancelled::<Runtime>();
//! assert_eq!(effect.run(&env), Fin::Succ(()));
//!
//! env.cancel_source().cancel();
//! effect.clear();
//! assert_eq!(effect.run(&env), Fin::Fail(Error::Cancelled));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::{Eff, Error, Fin};

/// The trigger side of a cancellation pair
///
/// Cloning shares the underlying flag; [`cancel`](CancelSource::cancel) is
/// idempotent and permanent within the source's lifetime.
#[derive(Clone)]
pub struct CancelSource {
    flag: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
}

/// The observed side of a cancellation pair
///
/// Handed to running computations, which either poll
/// [`is_cancelled`](CancelToken::is_cancelled) or await
/// [`cancelled`](CancelToken::cancelled).
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    rx: watch::Receiver<bool>,
}

impl CancelSource {
    /// Create a fresh, uncancelled source
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        CancelSource {
            flag: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
        }
    }

    /// Request cancellation
    ///
    /// Safe to call any number of times; later calls are no-ops. Already
    /// completed computations are unaffected.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.tx.send_replace(true);
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// A token observing this source
    pub fn token(&self) -> CancelToken {
        CancelToken {
            flag: Arc::clone(&self.flag),
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        CancelSource::new()
    }
}

impl CancelToken {
    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolve when cancellation is requested
    ///
    /// If the source is dropped without ever cancelling, this pends forever.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                if self.is_cancelled() {
                    return;
                }
                std::future::pending::<()>().await;
            }
        }
    }
}

impl fmt::Debug for CancelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Capability: an environment that exposes cancellation
///
/// Any environment used with the environment-dependent effect types can opt
/// in by holding a [`CancelSource`] and returning it here; the provided
/// [`cancel_token`](HasCancel::cancel_token) derives the observed side.
pub trait HasCancel {
    /// The source capable of triggering cancellation
    fn cancel_source(&self) -> &CancelSource;

    /// A token observing the environment's source
    fn cancel_token(&self) -> CancelToken {
        self.cancel_source().token()
    }
}

/// A minimal environment carrying only the cancellation capability
///
/// Useful as-is for callers whose effects need nothing else from the
/// environment, and as the model for embedding a [`CancelSource`] in a
/// richer application environment.
///
/// # Examples
///
/// ```
/// use eddy::{HasCancel, Runtime};
///
/// let env = Runtime::new();
/// assert!(!env.cancel_token().is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    source: CancelSource,
}

impl Runtime {
    /// Create a runtime with a fresh cancellation source
    pub fn new() -> Self {
        Runtime {
            source: CancelSource::new(),
        }
    }
}

impl HasCancel for Runtime {
    fn cancel_source(&self) -> &CancelSource {
        &self.source
    }
}

/// An effect that triggers the environment's cancellation source, then
/// fails with [`Error::Cancelled`]
///
/// Anything sequenced after `cancel()` in the same chain does not run.
pub fn cancel<Env>() -> Eff<(), Env>
where
    Env: HasCancel + 'static,
{
    Eff::effect_maybe(|env: &Env| {
        env.cancel_source().cancel();
        Fin::Fail(Error::Cancelled)
    })
}

/// An effect that fails with [`Error::Cancelled`] iff cancellation has been
/// requested, and succeeds with `()` otherwise
///
/// Insert into long chains to make them responsive to cancellation.
pub fn check_cancelled<Env>() -> Eff<(), Env>
where
    Env: HasCancel + 'static,
{
    Eff::effect_maybe(|env: &Env| {
        if env.cancel_token().is_cancelled() {
            Fin::Fail(Error::Cancelled)
        } else {
            Fin::Succ(())
        }
    })
}

/// An effect that reads the cancellation token out of the environment
pub fn cancel_token<Env>() -> Eff<CancelToken, Env>
where
    Env: HasCancel + 'static,
{
    Eff::effect(|env: &Env| env.cancel_token())
}
