//! Chance Rig entry point
//!
//! The browser build is driven through `platform::web::WebMiniGame`. The
//! native binary is a headless demo: it plays one target per mini-game (or
//! the target given on the command line) and prints the event stream.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use chance_rig::capability::StaticProbe;
    use chance_rig::{EngineSettings, MiniGameEngine, Outcome, Tuning};

    env_logger::init();
    log::info!("Chance Rig (native) starting...");

    let targets = match std::env::args().nth(1) {
        Some(json) => match Outcome::from_json(&json) {
            Ok(target) => vec![target],
            Err(err) => {
                eprintln!("bad target {json}: {err}");
                std::process::exit(2);
            }
        },
        None => demo_targets(),
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);
    let probe = StaticProbe::capable();

    for target in targets {
        let kind = target.kind();
        let mut engine = match MiniGameEngine::new(
            kind,
            EngineSettings::default(),
            Tuning::default(),
            &probe,
            seed,
        ) {
            Ok(engine) => engine,
            Err(err) => {
                eprintln!("{kind}: {err}");
                continue;
            }
        };
        if let Err(err) = engine.start_play(target) {
            eprintln!("{kind}: {err}");
            continue;
        }

        let reward = if kind.is_physics() {
            run_frames(&mut engine)
        } else {
            scratch_off(&mut engine)
        };

        for event in engine.drain_events() {
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
        }
        match reward {
            Some(reward) => println!(
                "{kind}: {reward} credits after {} ticks\n",
                engine.sim_tick()
            ),
            None => println!("{kind}: no payout\n"),
        }
    }

    log::info!("Demo finished");
}

/// Drive the fixed-step loop the way a 30 fps render loop would
#[cfg(not(target_arch = "wasm32"))]
fn run_frames(engine: &mut chance_rig::MiniGameEngine) -> Option<u32> {
    const FRAME_DT: f32 = 1.0 / 30.0;

    let mut frames = 0u32;
    while engine.is_active() && engine.tick(FRAME_DT) > 0 {
        frames += 1;
    }
    log::debug!("{} settled after {frames} frames", engine.kind());
    engine.last_reconciliation().map(|r| r.reward)
}

/// Sweep the brush across the card row by row until it reveals
#[cfg(not(target_arch = "wasm32"))]
fn scratch_off(engine: &mut chance_rig::MiniGameEngine) -> Option<u32> {
    let tuning = engine.tuning().scratch.clone();
    let step = tuning.brush_radius.max(1.0);
    let mut y = step / 2.0;
    while y < tuning.mask_height as f32 && engine.is_active() {
        let mut x = step / 2.0;
        while x < tuning.mask_width as f32 && engine.is_active() {
            if engine.scratch_at(x, y).is_err() {
                return None;
            }
            x += step;
        }
        y += step;
    }
    engine.last_reconciliation().map(|r| r.reward)
}

#[cfg(not(target_arch = "wasm32"))]
fn demo_targets() -> Vec<chance_rig::Outcome> {
    use chance_rig::{CoinSide, Outcome};

    vec![
        Outcome::Dice { faces: [3, 4] },
        Outcome::Coin {
            side: CoinSide::Heads,
        },
        Outcome::Pachinko { slot_index: 4 },
        Outcome::SlotReels { symbols: [2, 2, 2] },
        Outcome::Wheel { segment_index: 5 },
        Outcome::Scratch { reward_amount: 25 },
    ]
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::init, this is just to satisfy the compiler
}
