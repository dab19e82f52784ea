//! Sequential loop combinators: `fold_while`, `try_fold_while`, `for_each`
//!
//! Each algorithm is written once per effect family. The essential
//! correctness property of the folding loops is the *fresh epoch per
//! iteration*: the looped effect's thunk is cleared before every
//! evaluation, otherwise every iteration after the first would replay the
//! same cached value.

use std::sync::Arc;

use crate::thunk::{Thunk, ThunkAsync};
use crate::{Aff, Eff, Fin};

impl<A, Env> Eff<A, Env>
where
    A: Clone + Send + 'static,
    Env: 'static,
{
    /// Repeatedly evaluate this effect while a predicate on the state holds
    ///
    /// While `predicate(&state)` is true: clear the effect (fresh epoch),
    /// evaluate it, and fold the value into the state with `step`. The
    /// first failure of the effect propagates; otherwise the final state is
    /// returned the first time the predicate is false.
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Eff, Fin};
    ///
    /// let one = Eff::effect(|_: &()| 1);
    /// let effect = one.fold_while(0, |state, x| state + x, |state| *state < 5);
    /// assert_eq!(effect.run_standalone(), Fin::Succ(5));
    /// ```
    pub fn fold_while<S, FStep, FPred>(self, init: S, step: FStep, predicate: FPred) -> Eff<S, Env>
    where
        S: Clone + Send + Sync + 'static,
        FStep: Fn(S, A) -> S + Send + Sync + 'static,
        FPred: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| {
            let mut state = init.clone();
            while predicate(&state) {
                self.clear();
                match self.run(env) {
                    Fin::Succ(value) => state = step(state, value),
                    Fin::Fail(error) => return Fin::Fail(error),
                }
            }
            Fin::Succ(state)
        }))
    }

    /// [`fold_while`](Eff::fold_while) with a fallible step and predicate
    ///
    /// The loop fails immediately when the predicate, the effect, or the
    /// step fails on any iteration.
    pub fn try_fold_while<S, FStep, FPred>(
        self,
        init: S,
        step: FStep,
        predicate: FPred,
    ) -> Eff<S, Env>
    where
        S: Clone + Send + Sync + 'static,
        FStep: Fn(S, A) -> Fin<S> + Send + Sync + 'static,
        FPred: Fn(&S) -> Fin<bool> + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| {
            let mut state = init.clone();
            loop {
                match predicate(&state) {
                    Fin::Succ(true) => {}
                    Fin::Succ(false) => return Fin::Succ(state),
                    Fin::Fail(error) => return Fin::Fail(error),
                }
                self.clear();
                let value = match self.run(env) {
                    Fin::Succ(value) => value,
                    Fin::Fail(error) => return Fin::Fail(error),
                };
                state = match step(state, value) {
                    Fin::Succ(next) => next,
                    Fin::Fail(error) => return Fin::Fail(error),
                };
            }
        }))
    }
}

impl<I, Env> Eff<I, Env>
where
    I: Clone + Send + 'static,
    Env: 'static,
{
    /// Run a per-item effect over each element, strictly in sequence
    ///
    /// Evaluates this effect to obtain the collection, then runs
    /// `per(item)` one at a time in order, returning the first failure
    /// immediately (later items do not run).
    ///
    /// # Examples
    ///
    /// ```
    /// use eddy::{Eff, Fin};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let seen = Arc::new(AtomicUsize::new(0));
    /// let probe = Arc::clone(&seen);
    /// let effect = Eff::effect(|_: &()| vec![1usize, 2, 3]).for_each(move |x| {
    ///     let probe = Arc::clone(&probe);
    ///     Eff::effect(move |_| {
    ///         probe.fetch_add(x, Ordering::SeqCst);
    ///     })
    /// });
    /// assert_eq!(effect.run_standalone(), Fin::Succ(()));
    /// assert_eq!(seen.load(Ordering::SeqCst), 6);
    /// ```
    pub fn for_each<T, F>(self, per: F) -> Eff<(), Env>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Eff<(), Env> + Send + Sync + 'static,
    {
        Eff::from_thunk(Thunk::new(move |env| match self.run(env) {
            Fin::Succ(items) => {
                for item in items {
                    if let Fin::Fail(error) = per(item).run(env) {
                        return Fin::Fail(error);
                    }
                }
                Fin::Succ(())
            }
            Fin::Fail(error) => Fin::Fail(error),
        }))
    }
}

impl<A, Env> Aff<A, Env>
where
    A: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Repeatedly evaluate this effect while a predicate on the state holds
    ///
    /// The asynchronous counterpart of [`Eff::fold_while`]: iterations are
    /// strictly sequential, and the effect gets a fresh epoch before every
    /// evaluation.
    pub fn fold_while<S, FStep, FPred>(self, init: S, step: FStep, predicate: FPred) -> Aff<S, Env>
    where
        S: Clone + Send + Sync + 'static,
        FStep: Fn(S, A) -> S + Send + Sync + 'static,
        FPred: Fn(&S) -> bool + Send + Sync + 'static,
    {
        let step = Arc::new(step);
        let predicate = Arc::new(predicate);
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let init = init.clone();
            let step = Arc::clone(&step);
            let predicate = Arc::clone(&predicate);
            Box::pin(async move {
                let mut state = init;
                while predicate(&state) {
                    src.clear();
                    match src.run(env).await {
                        Fin::Succ(value) => state = step(state, value),
                        Fin::Fail(error) => return Fin::Fail(error),
                    }
                }
                Fin::Succ(state)
            })
        }))
    }

    /// [`fold_while`](Aff::fold_while) with a fallible step and predicate
    pub fn try_fold_while<S, FStep, FPred>(
        self,
        init: S,
        step: FStep,
        predicate: FPred,
    ) -> Aff<S, Env>
    where
        S: Clone + Send + Sync + 'static,
        FStep: Fn(S, A) -> Fin<S> + Send + Sync + 'static,
        FPred: Fn(&S) -> Fin<bool> + Send + Sync + 'static,
    {
        let step = Arc::new(step);
        let predicate = Arc::new(predicate);
        Aff::from_thunk(ThunkAsync::new(move |env| {
            let src = self.clone();
            let init = init.clone();
            let step = Arc::clone(&step);
            let predicate = Arc::clone(&predicate);
            Box::pin(async move {
                let mut state = init;
                loop {
                    match predicate(&state) {
                        Fin::Succ(true) => {}
                        Fin::Succ(false) => return Fin::Succ(state),
                        Fin::Fail(error) => return Fin::Fail(error),
                    }
                    src.clear();
                    let value = match src.run(env).await {
                        Fin::Succ(value) => value,
                        Fin::Fail(error) => return Fin::Fail(error),
                    };
                    state = match step(state, value) {
                        Fin::Succ(next) => next,
                        Fin::Fail(error) => return Fin::Fail(error),
                    };
                }
            })
        }))
    }
}

impl<I, Env> Aff<I, Env>
where
    I: Clone + Send + 'static,
    Env: Sync + 'static,
{
    /// Run a per-item effect over each element, strictly in sequence
    ///
    /// The asynchronous counterpart of [`Eff::for_each`]: one item at a
    /// time, in order, short-circuiting on the first failure. For bounded
    /// concurrency see [`for_each_par`](Aff::for_each_par).
    pub fn for_each<T, F>(self, per: F) -> Aff<(), Env>
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
                match src.run(env).await {
                    Fin::Succ(items) => {
                        for item in items {
                            if let Fin::Fail(error) = per(item).run(env).await {
                                return Fin::Fail(error);
                            }
                        }
                        Fin::Succ(())
                    }
                    Fin::Fail(error) => Fin::Fail(error),
                }
            })
        }))
    }
}
