//! Whole plays driven through the public engine API

use std::cell::RefCell;
use std::rc::Rc;

use chance_rig::capability::StaticProbe;
use chance_rig::sim::BackendKind;
use chance_rig::{
    CoinSide, EngineError, EngineEvent, EngineSettings, GameKind, MiniGameEngine, Outcome,
    PlayPhase, Tuning,
};

fn mount(kind: GameKind, settings: EngineSettings, seed: u64) -> MiniGameEngine {
    MiniGameEngine::new(kind, settings, Tuning::default(), &StaticProbe::capable(), seed)
        .expect("default tuning is valid")
}

/// Count `on_complete` calls and keep the rewards
fn record_completions(engine: &mut MiniGameEngine) -> Rc<RefCell<Vec<u32>>> {
    let rewards = Rc::new(RefCell::new(Vec::new()));
    let sink = rewards.clone();
    engine.on_complete(move |reward| sink.borrow_mut().push(reward));
    rewards
}

/// Drive the engine like a 60 fps render loop
fn run_frames(engine: &mut MiniGameEngine) -> u32 {
    let mut frames = 0;
    while engine.is_active() && frames < 10_000 {
        engine.tick(1.0 / 60.0);
        frames += 1;
    }
    frames
}

fn lifecycle(events: &[EngineEvent]) -> Vec<&'static str> {
    events
        .iter()
        .filter(|e| !e.is_transient() && e.name() != "settled")
        .map(|e| e.name())
        .collect()
}

#[test]
fn test_dice_three_four_pays_four_once() {
    let mut engine = mount(GameKind::Dice, EngineSettings::exact(), 1);
    let rewards = record_completions(&mut engine);

    engine.start_play(Outcome::Dice { faces: [3, 4] }).unwrap();
    run_frames(&mut engine);

    assert_eq!(*rewards.borrow(), vec![4]);
    let reconciliation = engine.last_reconciliation().unwrap();
    assert_eq!(reconciliation.extracted, Outcome::Dice { faces: [3, 4] });
    assert!(!reconciliation.snapped);
    assert!(!reconciliation.jackpot);

    // More frames after completion change nothing
    assert_eq!(engine.tick(0.1), 0);
    assert_eq!(rewards.borrow().len(), 1);
}

#[test]
fn test_double_six_is_a_jackpot() {
    let mut engine = mount(GameKind::Dice, EngineSettings::exact(), 2);
    engine.start_play(Outcome::Dice { faces: [6, 6] }).unwrap();
    assert_eq!(engine.run_to_completion(), Some(10));

    let events = engine.drain_events();
    assert_eq!(
        lifecycle(&events),
        vec!["launched", "reconciled", "jackpot", "completed"]
    );
    assert!(events.contains(&EngineEvent::Jackpot { reward: 10 }));
}

#[test]
fn test_randomized_dice_pay_the_target() {
    let tuning = Tuning::default();
    for seed in 0..6 {
        let mut engine = mount(GameKind::Dice, EngineSettings::default(), seed);
        let faces = [(seed % 6) as u8 + 1, ((seed * 5) % 6) as u8 + 1];
        engine.start_play(Outcome::Dice { faces }).unwrap();
        run_frames(&mut engine);

        let sum = usize::from(faces[0] + faces[1]);
        let reconciliation = engine.last_reconciliation().unwrap();
        assert_eq!(reconciliation.reward, tuning.dice.sum_credits[sum - 2]);
        assert_eq!(reconciliation.outcome, Outcome::Dice { faces });
    }
}

#[test]
fn test_pachinko_center_slot_pays_ten() {
    let mut engine = mount(GameKind::Pachinko, EngineSettings::exact(), 3);
    let rewards = record_completions(&mut engine);
    engine
        .start_play(Outcome::Pachinko { slot_index: 4 })
        .unwrap();
    run_frames(&mut engine);
    assert_eq!(*rewards.borrow(), vec![10]);
    assert_eq!(
        engine.last_reconciliation().map(|r| r.outcome.clone()),
        Some(Outcome::Pachinko { slot_index: 4 })
    );
}

#[test]
fn test_planar_pachinko_drop_completes() {
    let settings = EngineSettings {
        backend_override: Some(BackendKind::Planar),
        ..EngineSettings::default()
    };
    let mut engine = mount(GameKind::Pachinko, settings, 11);
    assert_eq!(engine.backend(), Some(BackendKind::Planar));
    engine
        .start_play(Outcome::Pachinko { slot_index: 2 })
        .unwrap();
    run_frames(&mut engine);

    assert_eq!(engine.phase(), PlayPhase::Completed);
    // Force-snap: the target slot is always the one paid
    assert_eq!(engine.last_reconciliation().map(|r| r.reward), Some(1));
    assert!(engine.sim_tick() <= engine.settings().tick_ceiling);
}

#[test]
fn test_scratch_zero_reveals_without_jackpot() {
    let mut engine = mount(GameKind::Scratch, EngineSettings::default(), 4);
    let rewards = record_completions(&mut engine);
    engine
        .start_play(Outcome::Scratch { reward_amount: 0 })
        .unwrap();

    let mut fractions = Vec::new();
    for row in 0..8 {
        for col in 0..12 {
            let x = col as f32 * 25.0 + 12.5;
            let y = row as f32 * 25.0 + 12.5;
            fractions.push(engine.scratch_at(x, y).unwrap());
        }
    }

    assert!(fractions.windows(2).all(|w| w[1] >= w[0]));
    assert!(engine.revealed_fraction().unwrap() >= 0.55);
    assert_eq!(*rewards.borrow(), vec![0]);

    let events = engine.drain_events();
    assert!(events.iter().any(|e| e.name() == "revealed"));
    assert!(!events.iter().any(|e| e.name() == "jackpot"));
    assert_eq!(events.iter().filter(|e| e.name() == "completed").count(), 1);
}

#[test]
fn test_coin_and_wheel_on_the_planar_backend() {
    let settings = EngineSettings {
        backend_override: Some(BackendKind::Planar),
        ..EngineSettings::default()
    };

    let mut coin = mount(GameKind::Coin, settings.clone(), 5);
    coin.start_play(Outcome::Coin {
        side: CoinSide::Heads,
    })
    .unwrap();
    run_frames(&mut coin);
    assert_eq!(coin.last_reconciliation().map(|r| r.reward), Some(10));

    let mut wheel = mount(GameKind::Wheel, settings, 6);
    wheel.start_play(Outcome::Wheel { segment_index: 7 }).unwrap();
    run_frames(&mut wheel);
    assert_eq!(wheel.last_reconciliation().map(|r| r.reward), Some(10));
    let ticks = wheel
        .drain_events()
        .iter()
        .filter(|e| e.name() == "tick")
        .count();
    assert!(ticks > 0);
}

#[test]
fn test_reels_pay_triples_and_pairs() {
    let mut engine = mount(GameKind::SlotReels, EngineSettings::exact(), 7);
    engine
        .start_play(Outcome::SlotReels { symbols: [2, 2, 2] })
        .unwrap();
    assert_eq!(engine.run_to_completion(), Some(4));

    engine
        .start_play(Outcome::SlotReels { symbols: [1, 3, 1] })
        .unwrap();
    assert_eq!(engine.run_to_completion(), Some(1));

    engine
        .start_play(Outcome::SlotReels { symbols: [0, 1, 2] })
        .unwrap();
    assert_eq!(engine.run_to_completion(), Some(0));
    assert_eq!(engine.history().len(), 3);
    assert_eq!(engine.history().total_reward(), 5);
}

#[test]
fn test_second_start_is_rejected_mid_play() {
    let mut engine = mount(GameKind::Wheel, EngineSettings::default(), 8);
    let rewards = record_completions(&mut engine);
    engine.start_play(Outcome::Wheel { segment_index: 0 }).unwrap();
    engine.tick(0.1);

    assert_eq!(
        engine.start_play(Outcome::Wheel { segment_index: 7 }),
        Err(EngineError::DuplicatePlay)
    );
    run_frames(&mut engine);
    assert_eq!(*rewards.borrow(), vec![0]);
    assert_eq!(
        engine.last_reconciliation().map(|r| r.target.clone()),
        Some(Outcome::Wheel { segment_index: 0 })
    );
}

#[test]
fn test_cancelled_play_is_not_recorded() {
    let mut engine = mount(GameKind::Coin, EngineSettings::default(), 9);
    let rewards = record_completions(&mut engine);
    engine
        .start_play(Outcome::Coin {
            side: CoinSide::Tails,
        })
        .unwrap();
    engine.tick(0.05);
    assert!(engine.cancel());

    assert!(rewards.borrow().is_empty());
    assert!(engine.history().is_empty());
    assert_eq!(engine.phase(), PlayPhase::Idle);

    // The engine is reusable after a cancel
    engine
        .start_play(Outcome::Coin {
            side: CoinSide::Tails,
        })
        .unwrap();
    run_frames(&mut engine);
    assert_eq!(*rewards.borrow(), vec![0]);
}

#[test]
fn test_failing_probe_falls_back_to_planar() {
    let engine = MiniGameEngine::new(
        GameKind::Dice,
        EngineSettings::default(),
        Tuning::default(),
        &StaticProbe::failing("webgl2 context lost"),
        10,
    )
    .unwrap();
    assert_eq!(engine.backend(), Some(BackendKind::Planar));
}

#[test]
fn test_target_json_drives_a_play() {
    let mut engine = mount(GameKind::Dice, EngineSettings::exact(), 12);
    let target = Outcome::from_json(r#"{"kind":"dice","faces":[1,1]}"#).unwrap();
    engine.start_play(target).unwrap();
    assert_eq!(engine.run_to_completion(), Some(2));

    let json = serde_json::to_value(engine.last_reconciliation().unwrap()).unwrap();
    assert_eq!(json["reward"], 2);
    assert_eq!(json["snapped"], false);
}
