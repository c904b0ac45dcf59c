//! Property tests: reveal monotonicity, threshold idempotence and liveness

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use chance_rig::capability::StaticProbe;
use chance_rig::sim::BackendKind;
use chance_rig::{
    CoinSide, EngineSettings, GameKind, MiniGameEngine, Outcome, PlayPhase, Tuning,
};

fn mount(kind: GameKind, settings: EngineSettings, seed: u64) -> (MiniGameEngine, Rc<RefCell<u32>>) {
    let mut engine =
        MiniGameEngine::new(kind, settings, Tuning::default(), &StaticProbe::capable(), seed)
            .expect("default tuning is valid");
    let completions = Rc::new(RefCell::new(0));
    let sink = completions.clone();
    engine.on_complete(move |_| *sink.borrow_mut() += 1);
    (engine, completions)
}

/// What the default tables pay for a target
fn table_reward(tuning: &Tuning, target: &Outcome) -> u32 {
    match target {
        Outcome::Dice { faces } => tuning.dice.sum_credits[usize::from(faces[0] + faces[1]) - 2],
        Outcome::Coin { side } => match side {
            CoinSide::Heads => tuning.coin.heads_credits,
            CoinSide::Tails => tuning.coin.tails_credits,
        },
        Outcome::Pachinko { slot_index } => tuning.pachinko.slot_values[*slot_index],
        Outcome::SlotReels { symbols: [a, b, c] } => {
            if a == b && b == c {
                tuning.reels.triple_payouts[*a]
            } else if a == b || b == c || a == c {
                tuning.reels.pair_credits
            } else {
                0
            }
        }
        Outcome::Wheel { segment_index } => tuning.wheel.segment_values[*segment_index],
        Outcome::Scratch { reward_amount } => *reward_amount,
    }
}

fn physics_target() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        (1u8..=6, 1u8..=6).prop_map(|(a, b)| Outcome::Dice { faces: [a, b] }),
        any::<bool>().prop_map(|heads| Outcome::Coin {
            side: if heads { CoinSide::Heads } else { CoinSide::Tails },
        }),
        (0usize..9).prop_map(|slot_index| Outcome::Pachinko { slot_index }),
        (0usize..7, 0usize..7, 0usize..7).prop_map(|(a, b, c)| Outcome::SlotReels {
            symbols: [a, b, c]
        }),
        (0usize..8).prop_map(|segment_index| Outcome::Wheel { segment_index }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_reveal_never_decreases(
        points in prop::collection::vec((-50.0f32..350.0, -50.0f32..250.0), 1..80),
        reward in 0u32..50,
    ) {
        let (mut engine, completions) = mount(GameKind::Scratch, EngineSettings::default(), 0);
        engine.start_play(Outcome::Scratch { reward_amount: reward }).unwrap();

        let mut last = 0.0f32;
        let mut was_revealed = false;
        for (x, y) in points {
            let fraction = engine.scratch_at(x, y).unwrap();
            prop_assert!(fraction >= last);
            last = fraction;

            let revealed = engine.phase() == PlayPhase::Completed;
            // Once revealed, always revealed
            prop_assert!(revealed || !was_revealed);
            if fraction >= 0.55 {
                prop_assert!(revealed);
            }
            was_revealed = revealed;
        }
        prop_assert_eq!(*completions.borrow(), u32::from(was_revealed));
    }

    #[test]
    fn prop_revealed_card_ignores_further_input(
        extra in prop::collection::vec((0.0f32..300.0, 0.0f32..200.0), 1..20),
    ) {
        let (mut engine, completions) = mount(GameKind::Scratch, EngineSettings::default(), 0);
        engine.start_play(Outcome::Scratch { reward_amount: 3 }).unwrap();
        for row in 0..8 {
            for col in 0..12 {
                engine.scratch_at(col as f32 * 25.0 + 12.5, row as f32 * 25.0 + 12.5).unwrap();
            }
        }
        prop_assert_eq!(engine.phase(), PlayPhase::Completed);
        let settled = engine.revealed_fraction();

        for (x, y) in extra {
            engine.scratch_at(x, y).unwrap();
            prop_assert_eq!(engine.phase(), PlayPhase::Completed);
            prop_assert_eq!(engine.revealed_fraction(), settled);
        }
        prop_assert_eq!(*completions.borrow(), 1);
        prop_assert_eq!(engine.last_reconciliation().map(|r| r.reward), Some(3));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_play_completes_and_pays_its_target(
        target in physics_target(),
        seed in any::<u64>(),
        planar in any::<bool>(),
    ) {
        let settings = EngineSettings {
            backend_override: Some(if planar { BackendKind::Planar } else { BackendKind::Rigid }),
            ..EngineSettings::default()
        };
        let (mut engine, completions) = mount(target.kind(), settings, seed);
        engine.start_play(target.clone()).unwrap();

        let reward = engine.run_to_completion();
        prop_assert_eq!(reward, Some(table_reward(&Tuning::default(), &target)));
        prop_assert!(engine.sim_tick() <= engine.settings().tick_ceiling);
        prop_assert_eq!(engine.phase(), PlayPhase::Completed);
        prop_assert_eq!(*completions.borrow(), 1);

        let reconciliation = engine.last_reconciliation().unwrap();
        prop_assert_eq!(&reconciliation.outcome, &target);
    }
}
