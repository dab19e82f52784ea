//! The memoization slot shared by every thunk
//!
//! [`MemoCell`] implements the claim-and-wait protocol that gives thunks
//! their run-once guarantee under contention. Callers first try to *claim*
//! the cell; exactly one claimant per epoch wins and evaluates the wrapped
//! function, while every other caller waits (blocking on a `Condvar` on the
//! sync path, awaiting a `tokio::sync::watch` notification on the async
//! path) and then observes the winner's cached outcome.
//!
//! An *epoch* is the period between a cell's creation (or reset) and its
//! next fill. `clear` bumps the epoch, so an evaluation that was in flight
//! when the cell was cleared completes harmlessly: `complete` refuses to
//! store an outcome from a stale epoch.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::Fin;

/// Cache state of a cell within the current epoch.
enum Slot<A> {
    /// Never evaluated this epoch.
    Empty,
    /// A claimant is currently evaluating.
    Running,
    /// Terminal: the cached outcome for this epoch.
    Ready(Fin<A>),
}

struct Inner<A> {
    slot: Slot<A>,
    epoch: u64,
}

/// A memoization slot with single-evaluation-under-contention semantics
///
/// Shared (via `Arc`) between a thunk and everything derived from it by the
/// lossless lifting conversions, so a cached outcome survives conversion and
/// `clear` stays coherent across all views of the same computation.
pub(crate) struct MemoCell<A> {
    inner: Mutex<Inner<A>>,
    cond: Condvar,
    // Bumped on every state change so async waiters can re-check.
    rev: watch::Sender<()>,
}

/// Outcome of attempting to claim a cell.
pub(crate) enum Claim<'a, A> {
    /// The cell already holds a terminal outcome for this epoch.
    Cached(Fin<A>),
    /// The caller won the claim and must evaluate, then `complete` the guard.
    Won(ClaimGuard<'a, A>),
}

/// Proof of a won claim
///
/// The holder is the unique evaluator for this epoch. Dropping the guard
/// without completing it (for example when the evaluating future is dropped
/// mid-flight) reverts the slot to `Empty` so the cell is never wedged in
/// the running state.
pub(crate) struct ClaimGuard<'a, A> {
    cell: &'a MemoCell<A>,
    epoch: u64,
    armed: bool,
}

impl<A> MemoCell<A> {
    pub(crate) fn new() -> Self {
        let (rev, _) = watch::channel(());
        MemoCell {
            inner: Mutex::new(Inner {
                slot: Slot::Empty,
                epoch: 0,
            }),
            cond: Condvar::new(),
            rev,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<A>> {
        // The critical sections below never run user code, so a poisoned
        // lock still holds a consistent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake_all(&self) {
        self.cond.notify_all();
        self.rev.send_replace(());
    }

    /// Reset to `Empty` and start a new epoch
    ///
    /// If an evaluation is in flight its eventual outcome belongs to the old
    /// epoch and will be discarded by `complete`. Waiters are woken so they
    /// can claim the new epoch themselves.
    pub(crate) fn clear(&self) {
        let mut guard = self.lock();
        guard.epoch = guard.epoch.wrapping_add(1);
        guard.slot = Slot::Empty;
        drop(guard);
        self.wake_all();
    }
}

impl<A: Clone> MemoCell<A> {
    /// Claim the cell for evaluation, blocking while another thread runs
    pub(crate) fn claim_sync(&self) -> Claim<'_, A> {
        let mut guard = self.lock();
        loop {
            match &guard.slot {
                Slot::Ready(fin) => return Claim::Cached(fin.clone()),
                Slot::Empty => {
                    let epoch = guard.epoch;
                    guard.slot = Slot::Running;
                    return Claim::Won(ClaimGuard {
                        cell: self,
                        epoch,
                        armed: true,
                    });
                }
                Slot::Running => {
                    guard = self
                        .cond
                        .wait(guard)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Claim the cell for evaluation, awaiting while another task runs
    pub(crate) async fn claim_async(&self) -> Claim<'_, A> {
        loop {
            let mut rx = {
                let mut guard = self.lock();
                match &guard.slot {
                    Slot::Ready(fin) => return Claim::Cached(fin.clone()),
                    Slot::Empty => {
                        let epoch = guard.epoch;
                        guard.slot = Slot::Running;
                        return Claim::Won(ClaimGuard {
                            cell: self,
                            epoch,
                            armed: true,
                        });
                    }
                    // Subscribe while still holding the lock: any state
                    // change after we release is guaranteed to wake us.
                    Slot::Running => self.rev.subscribe(),
                }
            };
            let _ = rx.changed().await;
        }
    }

    /// Store an outcome for the given epoch and wake all waiters
    ///
    /// A stale epoch means the cell was cleared while the evaluation ran;
    /// the outcome is discarded and the slot left as-is.
    fn complete(&self, epoch: u64, fin: &Fin<A>) {
        let mut guard = self.lock();
        if guard.epoch == epoch {
            guard.slot = Slot::Ready(fin.clone());
        }
        drop(guard);
        self.wake_all();
    }

    /// The cached outcome for the current epoch, if terminal
    #[cfg(test)]
    pub(crate) fn peek(&self) -> Option<Fin<A>> {
        match &self.lock().slot {
            Slot::Ready(fin) => Some(fin.clone()),
            _ => None,
        }
    }
}

impl<A: Clone> ClaimGuard<'_, A> {
    /// Record the evaluation outcome, filling the cell for this epoch
    pub(crate) fn complete(mut self, fin: &Fin<A>) {
        self.armed = false;
        self.cell.complete(self.epoch, fin);
    }
}

impl<A> Drop for ClaimGuard<'_, A> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Abandoned mid-evaluation: release the claim so another caller can
        // take over instead of waiting forever.
        let mut guard = self.cell.lock();
        if guard.epoch == self.epoch && matches!(guard.slot, Slot::Running) {
            guard.slot = Slot::Empty;
        }
        drop(guard);
        self.cell.wake_all();
    }
}

impl<A> fmt::Debug for MemoCell<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.lock();
        let state = match &guard.slot {
            Slot::Empty => "Empty",
            Slot::Running => "Running",
            Slot::Ready(fin) => {
                if fin.is_succ() {
                    "Ready(Succ)"
                } else {
                    "Ready(Fail)"
                }
            }
        };
        f.debug_struct("MemoCell")
            .field("state", &state)
            .field("epoch", &guard.epoch)
            .finish()
    }
}
