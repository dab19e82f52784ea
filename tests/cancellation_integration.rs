//! Cooperative cancellation through the environment capability

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eddy::{
    assert_fail, assert_succ, cancel, check_cancelled, Aff, CancelSource, Eff, Error, Fin,
    HasCancel, Runtime,
};

#[derive(Clone, Default)]
struct AppEnv {
    source: CancelSource,
}

impl HasCancel for AppEnv {
    fn cancel_source(&self) -> &CancelSource {
        &self.source
    }
}

#[test]
fn chain_stops_at_cancel() {
    let after_runs = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&after_runs);
    let effect = cancel::<AppEnv>().and_then(move |_| {
        probe.fetch_add(1, Ordering::SeqCst);
        Eff::success(1)
    });

    let env = AppEnv::default();
    assert_fail!(effect.run(&env), Error::Cancelled);
    assert_eq!(after_runs.load(Ordering::SeqCst), 0);
    // The environment's source was actually tripped, not just the chain.
    assert!(env.cancel_source().is_cancelled());
}

#[test]
fn check_cancelled_gates_a_working_chain() {
    let env = AppEnv::default();
    let check = check_cancelled::<AppEnv>();
    let effect = check.clone().and_then(|_| Eff::success(42));

    assert_succ!(effect.run(&env), 42);

    env.cancel_source().cancel();
    // clear is per-thunk: resetting the chain alone would replay the
    // check's cached Succ, so the gate itself must be cleared too.
    check.clear();
    effect.clear();
    assert_fail!(effect.run(&env), Error::Cancelled);
}

#[test]
fn cancelling_twice_is_harmless() {
    let env = Runtime::new();
    env.cancel_source().cancel();
    env.cancel_source().cancel();
    assert!(env.cancel_token().is_cancelled());
}

#[test]
fn completed_work_is_unaffected_by_later_cancellation() {
    let env = AppEnv::default();
    let effect = Eff::effect(|_: &AppEnv| 7);

    assert_succ!(effect.run(&env), 7);
    env.cancel_source().cancel();
    // The cached outcome stands; cancellation is not retroactive.
    assert_succ!(effect.run(&env), 7);
}

#[tokio::test]
async fn long_running_task_observes_cancellation() {
    let env = AppEnv::default();
    let effect = Aff::effect_maybe(|env: &AppEnv| {
        let token = env.cancel_token();
        async move {
            tokio::select! {
                _ = token.cancelled() => Fin::fail(Error::Cancelled),
                _ = tokio::time::sleep(Duration::from_secs(30)) => Fin::succ(()),
            }
        }
    });

    let runner = {
        let effect = effect.clone();
        let env = env.clone();
        tokio::spawn(async move { effect.run(&env).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    env.cancel_source().cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(1), runner)
        .await
        .expect("cancellation should unblock the task")
        .unwrap();
    assert_fail!(outcome, Error::Cancelled);
}

#[tokio::test]
async fn forked_child_sees_the_shared_source() {
    let env = AppEnv::default();
    let observed = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&observed);

    let child: Aff<(), AppEnv> = Aff::effect_maybe(move |env: &AppEnv| {
        let token = env.cancel_token();
        let probe = Arc::clone(&probe);
        async move {
            token.cancelled().await;
            probe.fetch_add(1, Ordering::SeqCst);
            Fin::fail(Error::Cancelled)
        }
    });

    assert_succ!(child.fork().run(&env).await, ());
    tokio::time::sleep(Duration::from_millis(10)).await;
    env.cancel_source().cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}
