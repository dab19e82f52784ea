//! Span instrumentation for effects (requires the `tracing` feature)
//!
//! Instrumentation wraps evaluation only: a memoized replay enters the span
//! too, but emits nothing unless the wrapped computation logs.

use ::tracing::{Instrument, Span};

use crate::thunk::{Thunk, ThunkAsync};
use crate::{Aff, Eff};

impl<A, Env> Eff<A, Env>
where
    A: Clone + Send + 'static,
    Env: 'static,
{
    /// Evaluate this effect inside the given span
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Eff, Fin};
    ///
    /// let effect = Eff::effect(|_: &()| 42)
    ///     .instrument(tracing::info_span!("compute"));
    /// assert_eq!(effect.run_standalone(), Fin::Succ(42));
    /// ```
    pub fn instrument(self, span: Span) -> Eff<A, Env> {
        Eff::from_thunk(Thunk::new(move |env| span.in_scope(|| self.run(env))))
    }
}

impl<A, Env> Aff<A, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Evaluate this effect inside the given span
    ///
    /// The span is entered across every poll of the underlying future, the
    /// way [`tracing::Instrument`] does for any instrumented future.
    pub fn instrument(self, span: Span) -> Aff<A, Env> {
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let span = span.clone();
            Box::pin(async move { src.run(env).await }.instrument(span))
        }))
    }
}
