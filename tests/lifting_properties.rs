//! Property tests for the algebraic surface: combinator laws and the
//! lossless sync/async lift

use proptest::prelude::*;

use eddy::testing::EvalProbe;
use eddy::{Aff, Eff, Error, Fin};

proptest! {
    #[test]
    fn map_composes(x in any::<i32>()) {
        let composed = Eff::effect(move |_: &()| x).map(|v| v.wrapping_add(1)).map(|v| v.wrapping_mul(2));
        let fused = Eff::effect(move |_: &()| x).map(|v| v.wrapping_add(1).wrapping_mul(2));
        prop_assert_eq!(composed.run_standalone(), fused.run_standalone());
    }

    #[test]
    fn and_then_of_success_is_the_function(x in any::<i32>()) {
        let chained = Eff::effect(move |_: &()| x).and_then(|v| Eff::effect(move |_| v.wrapping_mul(3)));
        let direct = Eff::effect(move |_: &()| x.wrapping_mul(3));
        prop_assert_eq!(chained.run_standalone(), direct.run_standalone());
    }

    #[test]
    fn filter_matches_plain_predicate(x in any::<i32>()) {
        let effect = Eff::effect(move |_: &()| x).filter(|v| *v % 2 == 0);
        let outcome = effect.run_standalone();
        if x % 2 == 0 {
            prop_assert_eq!(outcome, Fin::Succ(x));
        } else {
            prop_assert_eq!(outcome, Fin::Fail(Error::PredicateFailed));
        }
    }

    #[test]
    fn alternative_prefers_left_success(x in any::<i32>(), y in any::<i32>()) {
        let effect = Eff::effect(move |_: &()| x) | Eff::effect(move |_: &()| y);
        prop_assert_eq!(effect.run_standalone(), Fin::Succ(x));

        let effect = Eff::<i32>::fail(Error::new("left")) | Eff::effect(move |_: &()| y);
        prop_assert_eq!(effect.run_standalone(), Fin::Succ(y));
    }

    #[test]
    fn error_text_round_trips(msg in "[a-zA-Z0-9 ]{0,40}") {
        let error = Error::new(msg.clone());
        prop_assert_eq!(error.to_string(), msg);
    }

    #[test]
    fn sync_and_lifted_async_agree(x in any::<i32>(), fail in any::<bool>()) {
        let build = move || {
            Eff::effect_maybe(move |_: &()| {
                if fail {
                    Fin::fail(Error::new("nope"))
                } else {
                    Fin::succ(x)
                }
            })
        };

        let sync_outcome = build().run_standalone();
        let async_outcome = tokio_test::block_on(build().to_async().run_standalone());
        prop_assert_eq!(sync_outcome, async_outcome);
    }

    #[test]
    fn lift_never_reruns_a_cached_outcome(x in any::<i32>()) {
        let probe = EvalProbe::new();
        let effect = probe.eff(x);
        prop_assert_eq!(effect.run_standalone(), Fin::Succ(x));

        let lifted = effect.to_async();
        prop_assert_eq!(tokio_test::block_on(lifted.run_standalone()), Fin::Succ(x));
        prop_assert_eq!(probe.count(), 1);
    }

    #[test]
    fn zip_pairs_successes(x in any::<i32>(), y in any::<i64>()) {
        let effect = Eff::effect(move |_: &()| x).zip(Eff::effect(move |_: &()| y));
        prop_assert_eq!(effect.run_standalone(), Fin::Succ((x, y)));
    }

    #[test]
    fn async_zip_matches_sync_zip(x in any::<i32>(), y in any::<i64>()) {
        let sync_pair = Eff::effect(move |_: &()| x)
            .zip(Eff::effect(move |_: &()| y))
            .run_standalone();
        let async_pair = tokio_test::block_on(
            Aff::effect(move |_: &()| async move { x })
                .zip(Aff::effect(move |_: &()| async move { y }))
                .run_standalone(),
        );
        prop_assert_eq!(sync_pair, async_pair);
    }

    #[test]
    fn fin_result_round_trip(x in any::<i32>(), fail in any::<bool>()) {
        let fin: Fin<i32> = if fail {
            Fin::fail(Error::new("e"))
        } else {
            Fin::succ(x)
        };
        let round_tripped: Fin<i32> = fin.clone().into_result().into();
        prop_assert_eq!(round_tripped, fin);
    }
}
