//! Memoizing deferred computations
//!
//! A thunk wraps a re-runnable function `Fn(&Env) -> Fin<A>` (or its async
//! counterpart) together with a memoization cell: the first
//! evaluation per epoch runs the function and caches the outcome, every
//! later evaluation returns the cache, and [`clear`](Thunk::clear) starts a
//! fresh epoch. Panics inside the wrapped function are captured at
//! this boundary and converted into [`Error::Panicked`](crate::Error::Panicked).
//!
//! Concurrent evaluation of a shared thunk is safe: the cell's
//! claim-and-wait protocol guarantees the function runs at most once per
//! epoch, with contending callers observing the winner's cached outcome.
//!
//! The effect wrappers [`Eff`](crate::Eff) and [`Aff`](crate::Aff) are thin
//! layers over these two types; all laziness, memoization, and panic
//! capture lives here.

pub(crate) mod cell;
mod future;
mod sync;

pub use future::ThunkAsync;
pub use sync::Thunk;
