//! # eddy
//!
//! Lazy, memoized, cancellable effect values for Rust.
//!
//! An effect in this crate is a *description* of a computation: nothing
//! executes until you run it, the first run caches its outcome, and the
//! cache can be explicitly cleared to force re-evaluation. Effects carry a
//! typed environment for dependency injection and report outcomes through
//! [`Fin`], a success-or-failure result with a fixed [`Error`] channel.
//!
//! ## Core concepts
//!
//! - **[`Eff<A, Env>`](Eff)** - a synchronous effect. Build with
//!   [`Eff::effect`], run with [`Eff::run`], reset with [`Eff::clear`].
//! - **[`Aff<A, Env>`](Aff)** - the asynchronous counterpart. Same caching
//!   contract; evaluation may suspend, and independent effects can run
//!   concurrently ([`Aff::zip`], the [`parallel`] combinators) or
//!   fire-and-forget ([`Aff::fork`]).
//! - **Memoization with epochs** - an effect evaluates at most once per
//!   epoch, even under concurrent runs of a shared clone; `clear` opens a
//!   new epoch. The loop combinators ([`Eff::fold_while`] and friends)
//!   clear before every iteration so each pass re-evaluates.
//! - **Cooperative cancellation** - environments expose a cancellation
//!   token through [`HasCancel`]; [`cancel`], [`check_cancelled`] and
//!   [`cancel_token`] are effects over any such environment. Nothing is
//!   ever preemptively killed.
//! - **Resource safety** - [`bracket`](crate::bracket()) and [`using`]
//!   guarantee release runs exactly once, with disposal failures surfaced,
//!   never swallowed.
//!
//! ## Quick start
//!
//! ```
//! use eddy::{Eff, Fin};
//!
//! let effect = Eff::effect(|_: &()| 6 * 7)
//!     .filter(|x| *x > 0)
//!     .map(|x| x.to_string());
//!
//! assert_eq!(effect.run_standalone(), Fin::Succ("42".to_string()));
//! ```
//!
//! Async, with an environment:
//!
//! ```
//! use eddy::{check_cancelled, Aff, Fin, Runtime};
//!
//! # tokio_test::block_on(async {
//! let env = Runtime::new();
//! let effect = check_cancelled::<Runtime>()
//!     .to_async()
//!     .and_then(|_| Aff::effect(|_: &Runtime| async { "worked" }));
//! assert_eq!(effect.run(&env).await, Fin::Succ("worked"));
//! # });
//! ```
//!
//! ## Feature flags
//!
//! - `tracing` - span instrumentation for effects (`instrument`) and
//!   warnings on swallowed disposal failures
//! - `serde` - `Serialize`/`Deserialize` for [`Fin`] and [`Error`]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod aff;
pub mod bracket;
pub mod cancel;
mod control;
pub mod eff;
pub mod error;
pub mod fin;
pub mod parallel;
pub mod testing;
pub mod thunk;
#[cfg(feature = "tracing")]
mod tracing;

pub use aff::Aff;
pub use bracket::{bracket, bracket_async, using, using_async, Dispose};
pub use cancel::{
    cancel, cancel_token, check_cancelled, CancelSource, CancelToken, HasCancel, Runtime,
};
pub use eff::Eff;
pub use error::Error;
pub use fin::Fin;
pub use parallel::{sequence_par, sequence_par_limit, DEFAULT_PARALLEL_LIMIT};

/// Commonly used items, importable in one line
pub mod prelude {
    pub use crate::{
        bracket, bracket_async, cancel, cancel_token, check_cancelled, sequence_par, using,
        using_async, Aff, CancelSource, CancelToken, Dispose, Eff, Error, Fin, HasCancel, Runtime,
    };
}
