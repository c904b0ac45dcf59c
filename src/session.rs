//! Play sessions and the engine facade
//!
//! A `MiniGameEngine` hosts one mini-game kind and at most one active play.
//! The host drives it with `tick(frame_dt)` from its render loop (physics
//! games) or `scratch_at` from pointer input (scratch card), and listens for
//! events. Every successful play ends in exactly one `completed` event.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::AudioDirector;
use crate::capability::{CapabilityProbe, select_backend};
use crate::consts::MAX_FRAME_DT;
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBridge};
use crate::games::{GameStrategy, MiniGameStrategy};
use crate::history::{PlayHistory, PlayRecord};
use crate::outcome::{GameKind, Outcome, TargetOutcome};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::scratch::{ScratchCard, ScratchResult};
use crate::settings::EngineSettings;
use crate::sim::{BackendKind, PhysicsWorld, SimulationBody};
use crate::tuning::Tuning;

/// Lifecycle of one play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayPhase {
    Idle,
    Launched,
    /// Physics stepping, or the foil being scratched
    Simulating,
    Settled,
    Reconciled,
    Completed,
}

enum Modality {
    Physics {
        strategy: GameStrategy,
        world: PhysicsWorld,
    },
    Reveal(ScratchCard),
}

/// State exclusively owned by one play
struct PlaySession {
    target: TargetOutcome,
    phase: PlayPhase,
    modality: Modality,
    audio: AudioDirector,
    reconciliation: Option<Reconciliation>,
}

impl PlaySession {
    fn is_active(&self) -> bool {
        self.phase != PlayPhase::Completed
    }
}

/// Send an event and the sound cues it triggers
fn emit(bridge: &mut EventBridge, audio: &mut AudioDirector, event: EngineEvent) {
    let cues = audio.cues_for(&event);
    bridge.emit(event);
    for cue in cues {
        bridge.emit(EngineEvent::Cue { cue });
    }
}

/// Reconciled → jackpot? → completed, then record the play
fn finish(
    bridge: &mut EventBridge,
    history: &mut PlayHistory,
    session: &mut PlaySession,
    reconciliation: Reconciliation,
    record: PlayRecord,
) {
    session.phase = PlayPhase::Reconciled;
    emit(
        bridge,
        &mut session.audio,
        EngineEvent::Reconciled {
            target: reconciliation.target.clone(),
            extracted: reconciliation.extracted.clone(),
            snapped: reconciliation.snapped,
            reward: reconciliation.reward,
        },
    );
    let reward = reconciliation.reward;
    if reconciliation.jackpot {
        emit(bridge, &mut session.audio, EngineEvent::Jackpot { reward });
    }

    history.record(record);
    history.save();
    session.phase = PlayPhase::Completed;
    session.reconciliation = Some(reconciliation);
    log::info!("Play #{} complete: {reward} credits", history.latest().map_or(0, |r| r.sequence));
    emit(bridge, &mut session.audio, EngineEvent::Completed { reward });
}

/// Engine facade for one mini-game
pub struct MiniGameEngine {
    kind: GameKind,
    settings: EngineSettings,
    tuning: Tuning,
    /// None for the scratch card
    backend: Option<BackendKind>,
    reconciler: Reconciler,
    rng: Pcg32,
    bridge: EventBridge,
    session: Option<PlaySession>,
    accumulator: f32,
    history: PlayHistory,
    plays: u64,
}

impl MiniGameEngine {
    /// Mount an engine; the capability gate runs once, here
    pub fn new(
        kind: GameKind,
        settings: EngineSettings,
        tuning: Tuning,
        probe: &dyn CapabilityProbe,
        seed: u64,
    ) -> EngineResult<Self> {
        tuning.validate()?;
        let backend = kind.is_physics().then(|| select_backend(probe, &settings));
        log::info!(
            "Mounted {kind} engine (backend: {})",
            backend.map_or("none", |b| b.as_str())
        );
        Ok(Self {
            kind,
            reconciler: Reconciler::new(tuning.jackpot_threshold),
            settings,
            tuning,
            backend,
            rng: Pcg32::seed_from_u64(seed),
            bridge: EventBridge::new(),
            session: None,
            accumulator: 0.0,
            history: PlayHistory::new(),
            plays: 0,
        })
    }

    pub fn with_history(mut self, history: PlayHistory) -> Self {
        self.history = history;
        self
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn backend(&self) -> Option<BackendKind> {
        self.backend
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn history(&self) -> &PlayHistory {
        &self.history
    }

    pub fn phase(&self) -> PlayPhase {
        self.session.as_ref().map_or(PlayPhase::Idle, |s| s.phase)
    }

    /// A play has started and not yet completed or been cancelled
    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(PlaySession::is_active)
    }

    pub fn target(&self) -> Option<&TargetOutcome> {
        self.session.as_ref().map(|s| &s.target)
    }

    /// Bodies of the current (or just completed) physics play
    pub fn bodies(&self) -> &[SimulationBody] {
        match self.session.as_ref().map(|s| &s.modality) {
            Some(Modality::Physics { world, .. }) => world.bodies(),
            _ => &[],
        }
    }

    /// Ticks simulated by the current (or just completed) physics play
    pub fn sim_tick(&self) -> u64 {
        match self.session.as_ref().map(|s| &s.modality) {
            Some(Modality::Physics { world, .. }) => world.tick(),
            _ => 0,
        }
    }

    /// Scratch card coverage, if a card is up
    pub fn revealed_fraction(&self) -> Option<f32> {
        match self.session.as_ref().map(|s| &s.modality) {
            Some(Modality::Reveal(card)) => Some(card.revealed_fraction()),
            _ => None,
        }
    }

    pub fn last_reconciliation(&self) -> Option<&Reconciliation> {
        self.session.as_ref().and_then(|s| s.reconciliation.as_ref())
    }

    /// Subscribe to the reward of each successful play
    pub fn on_complete(&mut self, listener: impl FnMut(u32) + 'static) {
        self.bridge.on_complete(listener);
    }

    pub fn on_event(&mut self, listener: impl FnMut(&EngineEvent) + 'static) {
        self.bridge.on_event(listener);
    }

    /// Events since the last drain, for polling hosts
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.bridge.drain()
    }

    /// Begin a play for an authoritative target
    pub fn start_play(&mut self, target: TargetOutcome) -> EngineResult<()> {
        if self.is_active() {
            log::warn!("start_play rejected: a {} play is still running", self.kind);
            return Err(EngineError::DuplicatePlay);
        }
        if target.kind() != self.kind {
            return Err(EngineError::configuration(
                self.kind,
                format!("got a {} target", target.kind()),
            ));
        }
        target.validate(&self.tuning)?;

        let modality = match (&target, self.backend) {
            (Outcome::Scratch { reward_amount }, _) => {
                Modality::Reveal(ScratchCard::new(*reward_amount, &self.tuning.scratch))
            }
            (_, Some(backend)) => {
                let strategy = GameStrategy::for_kind(self.kind, &self.tuning).ok_or_else(|| {
                    EngineError::configuration(self.kind, "no physics strategy")
                })?;
                let mode = self.settings.effective_launch_mode();
                let launch = strategy.launch(&target, mode, &mut self.rng)?;
                let mut world = PhysicsWorld::new(backend, self.settings.tick_ceiling);
                world.load(launch.arena, launch.bodies);
                Modality::Physics { strategy, world }
            }
            (_, None) => {
                return Err(EngineError::configuration(self.kind, "no physics backend"));
            }
        };

        self.plays += 1;
        self.accumulator = 0.0;
        log::info!("Play #{} launched: {:?}", self.plays, target);
        let mut session = PlaySession {
            target: target.clone(),
            phase: PlayPhase::Launched,
            modality,
            audio: AudioDirector::new(self.kind, self.settings.effective_volume()),
            reconciliation: None,
        };
        emit(
            &mut self.bridge,
            &mut session.audio,
            EngineEvent::Launched {
                game: self.kind,
                backend: self.backend,
                target,
            },
        );
        self.session = Some(session);
        Ok(())
    }

    /// Advance by one render frame; returns the fixed steps taken
    ///
    /// The frame delta is clamped, accumulated and consumed in whole
    /// `sim_dt` steps, at most `max_substeps` per call.
    pub fn tick(&mut self, frame_dt: f32) -> u32 {
        if !self.is_physics_active() {
            return 0;
        }
        let dt = self.settings.effective_dt();
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= dt && substeps < self.settings.max_substeps.max(1) {
            self.accumulator -= dt;
            substeps += 1;
            if self.step_once() {
                self.accumulator = 0.0;
                break;
            }
        }
        substeps
    }

    /// Step the active physics play to completion, ignoring frame pacing
    ///
    /// Returns the reward, or None when no physics play is running. The tick
    /// ceiling bounds the loop.
    pub fn run_to_completion(&mut self) -> Option<u32> {
        if !self.is_physics_active() {
            return None;
        }
        while !self.step_once() {}
        self.last_reconciliation().map(|r| r.reward)
    }

    fn is_physics_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.is_active() && matches!(s.modality, Modality::Physics { .. }))
    }

    /// One fixed step; returns true when the play completed on it
    fn step_once(&mut self) -> bool {
        let dt = self.settings.effective_dt();
        let settled = {
            let Some(session) = self.session.as_mut().filter(|s| s.is_active()) else {
                return true;
            };
            let Modality::Physics { strategy, world } = &mut session.modality else {
                return true;
            };
            if session.phase == PlayPhase::Launched {
                session.phase = PlayPhase::Simulating;
            }
            for event in strategy.step(world, dt, &mut self.rng) {
                emit(&mut self.bridge, &mut session.audio, event);
            }
            strategy.is_settled(world)
        };
        if settled {
            self.complete_physics();
        }
        settled
    }

    fn complete_physics(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase = PlayPhase::Settled;
        let Modality::Physics { strategy, world } = &mut session.modality else {
            return;
        };
        let reconciliation =
            self.reconciler
                .reconcile(&*strategy, &session.target, world.bodies_mut());
        let record = PlayRecord {
            kind: self.kind,
            outcome: reconciliation.outcome.clone(),
            reward: reconciliation.reward,
            snapped: reconciliation.snapped,
            forced: world.timed_out(),
            ticks: world.tick(),
            backend: Some(world.backend_kind()),
            sequence: self.plays,
        };
        finish(&mut self.bridge, &mut self.history, session, reconciliation, record);
    }

    /// Scratch input in mask logical coordinates; returns the revealed fraction
    pub fn scratch_at(&mut self, x: f32, y: f32) -> EngineResult<f32> {
        self.scratch_with(|card| card.scratch_at(x, y))
    }

    /// Scratch input in device pixels over a card drawn `width` x `height`
    pub fn scratch_at_device(&mut self, x: f32, y: f32, width: f32, height: f32) -> EngineResult<f32> {
        self.scratch_with(|card| card.scratch_at_device(x, y, width, height))
    }

    fn scratch_with(
        &mut self,
        input: impl FnOnce(&mut ScratchCard) -> ScratchResult,
    ) -> EngineResult<f32> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::NoActivePlay);
        };
        let Modality::Reveal(card) = &mut session.modality else {
            return Err(EngineError::WrongModality { kind: self.kind });
        };
        let result = input(card);
        let fraction = card.revealed_fraction();
        let reward_amount = card.reward_amount();
        match result {
            ScratchResult::Ignored => {}
            ScratchResult::Scratched { fraction } => {
                session.phase = PlayPhase::Simulating;
                emit(&mut self.bridge, &mut session.audio, EngineEvent::Reveal { fraction });
            }
            ScratchResult::Revealed { fraction } => {
                session.phase = PlayPhase::Settled;
                emit(&mut self.bridge, &mut session.audio, EngineEvent::Revealed { fraction });
                let reconciliation = self.reconciler.reconcile_reveal(reward_amount);
                let record = PlayRecord {
                    kind: self.kind,
                    outcome: reconciliation.outcome.clone(),
                    reward: reconciliation.reward,
                    snapped: false,
                    forced: false,
                    ticks: 0,
                    backend: None,
                    sequence: self.plays,
                };
                finish(&mut self.bridge, &mut self.history, session, reconciliation, record);
            }
        }
        Ok(fraction)
    }

    /// Abandon the active play without paying; returns false if none was active
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        if let Some(mut session) = self.session.take() {
            log::info!("Play #{} cancelled in phase {:?}", self.plays, session.phase);
            emit(&mut self.bridge, &mut session.audio, EngineEvent::Cancelled);
        }
        self.accumulator = 0.0;
        true
    }
}

impl std::fmt::Debug for MiniGameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniGameEngine")
            .field("kind", &self.kind)
            .field("backend", &self.backend)
            .field("phase", &self.phase())
            .field("plays", &self.plays)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StaticProbe;
    use crate::consts::SIM_DT;
    use crate::outcome::CoinSide;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(kind: GameKind, settings: EngineSettings) -> MiniGameEngine {
        MiniGameEngine::new(kind, settings, Tuning::default(), &StaticProbe::capable(), 7).unwrap()
    }

    fn names(events: &[EngineEvent]) -> Vec<&'static str> {
        events
            .iter()
            .filter(|e| !e.is_transient())
            .map(|e| e.name())
            .collect()
    }

    #[test]
    fn test_lifecycle_order() {
        let mut e = engine(GameKind::Coin, EngineSettings::exact());
        assert_eq!(e.phase(), PlayPhase::Idle);
        e.start_play(Outcome::Coin {
            side: CoinSide::Tails,
        })
        .unwrap();
        assert_eq!(e.phase(), PlayPhase::Launched);
        assert_eq!(e.run_to_completion(), Some(0));
        assert_eq!(e.phase(), PlayPhase::Completed);
        assert!(!e.is_active());
        assert_eq!(
            names(&e.drain_events()),
            vec!["launched", "settled", "reconciled", "completed"]
        );
    }

    #[test]
    fn test_accumulator_steps_whole_ticks() {
        let mut e = engine(GameKind::Wheel, EngineSettings::default());
        e.start_play(Outcome::Wheel { segment_index: 3 }).unwrap();
        assert_eq!(e.tick(SIM_DT * 0.5), 0);
        assert_eq!(e.tick(SIM_DT * 0.6), 1);
        // Huge frame deltas are clamped to 0.1 s: six steps, not sixty
        assert_eq!(e.tick(1.0), 6);
        assert_eq!(e.tick(f32::NAN), 0);
        assert_eq!(e.tick(-1.0), 0);
        assert_eq!(e.sim_tick(), 7);
    }

    #[test]
    fn test_substeps_are_capped() {
        let settings = EngineSettings {
            max_substeps: 2,
            ..EngineSettings::default()
        };
        let mut e = engine(GameKind::Wheel, settings);
        e.start_play(Outcome::Wheel { segment_index: 3 }).unwrap();
        assert_eq!(e.tick(0.1), 2);
    }

    #[test]
    fn test_duplicate_play_leaves_first_untouched() {
        let mut e = engine(GameKind::Wheel, EngineSettings::default());
        let first = Outcome::Wheel { segment_index: 2 };
        e.start_play(first.clone()).unwrap();
        e.tick(0.05);
        let tick = e.sim_tick();

        let err = e.start_play(Outcome::Wheel { segment_index: 5 }).unwrap_err();
        assert_eq!(err, EngineError::DuplicatePlay);
        assert_eq!(e.target(), Some(&first));
        assert_eq!(e.sim_tick(), tick);

        e.run_to_completion();
        // A completed play no longer blocks the next one
        assert!(e.start_play(Outcome::Wheel { segment_index: 5 }).is_ok());
    }

    #[test]
    fn test_configuration_errors() {
        let mut e = engine(GameKind::Pachinko, EngineSettings::default());
        let err = e.start_play(Outcome::Pachinko { slot_index: 9 }).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
        let err = e.start_play(Outcome::Dice { faces: [1, 2] }).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
        assert_eq!(e.phase(), PlayPhase::Idle);
    }

    #[test]
    fn test_bad_tuning_fails_at_mount() {
        let mut tuning = Tuning::default();
        tuning.coin.toss_speed_min = 9.0;
        tuning.coin.toss_speed_max = 1.0;
        let result = MiniGameEngine::new(
            GameKind::Coin,
            EngineSettings::default(),
            tuning,
            &StaticProbe::capable(),
            7,
        );
        assert!(matches!(result, Err(EngineError::InvalidSettings(_))));
    }

    #[test]
    fn test_cancel_never_completes() {
        let completions = Rc::new(RefCell::new(0));
        let mut e = engine(GameKind::SlotReels, EngineSettings::default());
        {
            let completions = completions.clone();
            e.on_complete(move |_| *completions.borrow_mut() += 1);
        }
        e.start_play(Outcome::SlotReels { symbols: [1, 1, 1] }).unwrap();
        e.tick(0.1);
        assert!(e.cancel());
        assert!(!e.cancel());
        assert_eq!(e.tick(0.1), 0);

        let events = e.drain_events();
        assert_eq!(events.last().map(|e| e.name()), Some("cue"));
        assert!(events.iter().any(|e| e.name() == "cancelled"));
        assert!(!events.iter().any(|e| e.name() == "completed"));
        // The reel loop started on launch was stopped
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::Cue {
                cue: crate::audio::SoundCue::StopLoop { .. }
            }
        )));
        assert_eq!(*completions.borrow(), 0);
        assert_eq!(e.phase(), PlayPhase::Idle);
    }

    #[test]
    fn test_scratch_modality_checks() {
        let mut dice = engine(GameKind::Dice, EngineSettings::default());
        assert_eq!(dice.scratch_at(1.0, 1.0), Err(EngineError::NoActivePlay));
        dice.start_play(Outcome::Dice { faces: [1, 1] }).unwrap();
        assert_eq!(
            dice.scratch_at(1.0, 1.0),
            Err(EngineError::WrongModality {
                kind: GameKind::Dice
            })
        );

        let mut card = engine(GameKind::Scratch, EngineSettings::default());
        assert_eq!(card.backend(), None);
        card.start_play(Outcome::Scratch { reward_amount: 2 }).unwrap();
        assert_eq!(card.tick(0.1), 0);
        assert!(card.scratch_at(150.0, 100.0).unwrap() > 0.0);
        assert_eq!(card.phase(), PlayPhase::Simulating);
    }

    #[test]
    fn test_reduced_motion_plays_are_immediate() {
        let settings = EngineSettings {
            reduced_motion: true,
            ..EngineSettings::default()
        };
        let mut e = engine(GameKind::Dice, settings);
        e.start_play(Outcome::Dice { faces: [2, 5] }).unwrap();
        assert_eq!(e.run_to_completion(), Some(4));
        assert!(e.sim_tick() <= 2);
        assert!(!e.last_reconciliation().unwrap().snapped);
    }
}
