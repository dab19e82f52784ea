//! Loop combinators exercised end to end, including the bounded-parallel
//! iteration paths

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eddy::testing::EvalProbe;
use eddy::{assert_fail, assert_succ, sequence_par_limit, Aff, Eff, Error, Fin};

#[test]
fn fold_while_terminates_with_expected_count() {
    let step_runs = EvalProbe::new();
    let one = step_runs.eff(1);

    let total = one.fold_while(0, |acc, x| acc + x, |acc| *acc < 5);
    assert_succ!(total.run_standalone(), 5);
    // The looped effect re-evaluated on every iteration rather than
    // replaying its first cached value.
    assert_eq!(step_runs.count(), 5);
}

#[test]
fn fold_while_result_is_itself_memoized() {
    let step_runs = EvalProbe::new();
    let total = step_runs
        .eff(1)
        .fold_while(0, |acc, x| acc + x, |acc| *acc < 3);

    assert_succ!(total.run_standalone(), 3);
    assert_succ!(total.run_standalone(), 3);
    assert_eq!(step_runs.count(), 3);

    total.clear();
    assert_succ!(total.run_standalone(), 3);
    assert_eq!(step_runs.count(), 6);
}

#[test]
fn try_fold_while_surfaces_step_failure() {
    let one = Eff::effect(|_: &()| 1);
    let total = one.try_fold_while(
        0,
        |acc, x| {
            if acc >= 2 {
                Fin::fail(Error::new("step limit"))
            } else {
                Fin::succ(acc + x)
            }
        },
        |acc| Fin::succ(*acc < 10),
    );
    assert_fail!(total.run_standalone(), Error::new("step limit"));
}

#[test]
fn for_each_visits_in_order_and_short_circuits() {
    let visited = Arc::new(Mutex::new(Vec::new()));
    let probe = Arc::clone(&visited);
    let effect = Eff::effect(|_: &()| vec!["a", "b", "c", "d"]).for_each(move |name| {
        let probe = Arc::clone(&probe);
        Eff::effect_maybe(move |_| {
            probe.lock().unwrap().push(name);
            if name == "c" {
                Fin::fail(Error::new("bad item"))
            } else {
                Fin::succ(())
            }
        })
    });

    assert_fail!(effect.run_standalone(), Error::new("bad item"));
    assert_eq!(*visited.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn async_fold_while_matches_sync_semantics() {
    let step_runs = EvalProbe::new();
    let one = step_runs.aff(1);

    let total = one.fold_while(0, |acc, x| acc + x, |acc| *acc < 5);
    assert_succ!(total.run_standalone().await, 5);
    assert_eq!(step_runs.count(), 5);
}

#[tokio::test]
async fn parallel_for_each_attempts_every_item_despite_failure() {
    // Item 3 fails under a concurrency bound of 2; the remaining items must
    // still be attempted, unlike the sequential loop.
    let attempted = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&attempted);
    let effect = Aff::effect(|_: &()| async { vec![1, 2, 3, 4, 5, 6] })
        .for_each_par_limit(2, move |x| {
            let probe = Arc::clone(&probe);
            Aff::effect_maybe(move |_| {
                let probe = Arc::clone(&probe);
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    probe.fetch_add(1, Ordering::SeqCst);
                    if x == 3 {
                        Fin::fail(Error::new("item 3 failed"))
                    } else {
                        Fin::succ(())
                    }
                }
            })
        });

    assert_fail!(effect.run_standalone().await, Error::new("item 3 failed"));
    assert_eq!(attempted.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn sequence_par_collects_in_input_order() {
    let effects: Vec<Aff<u64>> = (0..6u64)
        .map(|i| {
            Aff::effect(move |_: &()| async move {
                // Reverse the completion order relative to the input order.
                tokio::time::sleep(Duration::from_millis(60 - 10 * i)).await;
                i
            })
        })
        .collect();

    let batch = sequence_par_limit(effects, 3);
    assert_succ!(batch.run_standalone().await, vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn sequence_par_reports_earliest_failure() {
    let effects: Vec<Aff<i32>> = vec![
        Aff::effect(|_: &()| async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            1
        }),
        Aff::fail(Error::new("second")),
        Aff::fail(Error::new("third")),
    ];
    let batch = sequence_par_limit(effects, 3);
    assert_fail!(batch.run_standalone().await, Error::new("second"));
}
