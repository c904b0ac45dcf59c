//! Per-game strategies
//!
//! Every physics mini-game shares one lifecycle and differs only in math:
//! how a target biases the launch, how final transforms map back to symbols,
//! how a mismatch is corrected and what a symbol pays.

pub mod coin;
pub mod dice;
pub mod pachinko;
pub mod reels;
pub mod wheel;

use rand_pcg::Pcg32;

use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::outcome::{GameKind, Outcome, TargetOutcome};
use crate::settings::LaunchMode;
use crate::sim::{Arena, PhysicsWorld, SimulationBody, Surface, WorldStep};
use crate::tuning::Tuning;

pub use coin::CoinGame;
pub use dice::DiceGame;
pub use pachinko::PachinkoGame;
pub use reels::ReelsGame;
pub use wheel::WheelGame;

/// Initial state of one play
#[derive(Debug, Clone)]
pub struct Launch {
    pub arena: Arena,
    pub bodies: Vec<SimulationBody>,
}

/// One physics mini-game
pub trait MiniGameStrategy {
    fn kind(&self) -> GameKind;

    /// Biased-but-randomized initial state for a target
    ///
    /// `LaunchMode::Exact` places every body at its terminal transform with
    /// zero velocity instead.
    fn launch(
        &self,
        target: &TargetOutcome,
        mode: LaunchMode,
        rng: &mut Pcg32,
    ) -> EngineResult<Launch>;

    /// Advance the world one fixed step and describe what happened
    fn step(&self, world: &mut PhysicsWorld, dt: f32, rng: &mut Pcg32) -> Vec<EngineEvent> {
        let step = world.step(dt, rng);
        step_events(&step)
    }

    fn is_settled(&self, world: &PhysicsWorld) -> bool {
        world.all_settled()
    }

    /// Pure mapping from final transforms to the symbolic result
    fn extract(&self, bodies: &[SimulationBody]) -> Outcome;

    /// Move mismatched bodies onto the target's terminal transform
    fn snap(&self, target: &TargetOutcome, bodies: &mut [SimulationBody]);

    fn reward_lookup(&self, outcome: &Outcome) -> u32;
}

/// Default translation of a world step into events: impacts, then settles
pub fn step_events(step: &WorldStep) -> Vec<EngineEvent> {
    let mut events: Vec<EngineEvent> = step
        .contacts
        .iter()
        .filter(|c| c.surface != Surface::Detent)
        .map(|c| EngineEvent::Collision {
            body: c.body,
            surface: c.surface,
            impact: c.impact,
        })
        .collect();
    events.extend(step.settled.iter().map(|s| EngineEvent::Settled {
        body: s.body,
        tick: s.tick,
        forced: s.forced,
    }));
    events
}

/// Error for a target of the wrong game
pub(crate) fn wrong_target(kind: GameKind, target: &TargetOutcome) -> EngineError {
    EngineError::configuration(kind, format!("got a {} target", target.kind()))
}

/// Closed set of physics strategies
#[derive(Debug, Clone)]
pub enum GameStrategy {
    Dice(DiceGame),
    Coin(CoinGame),
    Pachinko(PachinkoGame),
    SlotReels(ReelsGame),
    Wheel(WheelGame),
}

impl GameStrategy {
    /// Strategy for a physics game; `None` for the scratch card
    pub fn for_kind(kind: GameKind, tuning: &Tuning) -> Option<Self> {
        match kind {
            GameKind::Dice => Some(Self::Dice(DiceGame::new(tuning.dice.clone()))),
            GameKind::Coin => Some(Self::Coin(CoinGame::new(tuning.coin.clone()))),
            GameKind::Pachinko => Some(Self::Pachinko(PachinkoGame::new(tuning.pachinko.clone()))),
            GameKind::SlotReels => Some(Self::SlotReels(ReelsGame::new(tuning.reels.clone()))),
            GameKind::Wheel => Some(Self::Wheel(WheelGame::new(tuning.wheel.clone()))),
            GameKind::Scratch => None,
        }
    }

    fn inner(&self) -> &dyn MiniGameStrategy {
        match self {
            Self::Dice(game) => game,
            Self::Coin(game) => game,
            Self::Pachinko(game) => game,
            Self::SlotReels(game) => game,
            Self::Wheel(game) => game,
        }
    }
}

impl MiniGameStrategy for GameStrategy {
    fn kind(&self) -> GameKind {
        self.inner().kind()
    }

    fn launch(
        &self,
        target: &TargetOutcome,
        mode: LaunchMode,
        rng: &mut Pcg32,
    ) -> EngineResult<Launch> {
        self.inner().launch(target, mode, rng)
    }

    fn step(&self, world: &mut PhysicsWorld, dt: f32, rng: &mut Pcg32) -> Vec<EngineEvent> {
        self.inner().step(world, dt, rng)
    }

    fn is_settled(&self, world: &PhysicsWorld) -> bool {
        self.inner().is_settled(world)
    }

    fn extract(&self, bodies: &[SimulationBody]) -> Outcome {
        self.inner().extract(bodies)
    }

    fn snap(&self, target: &TargetOutcome, bodies: &mut [SimulationBody]) {
        self.inner().snap(target, bodies)
    }

    fn reward_lookup(&self, outcome: &Outcome) -> u32 {
        self.inner().reward_lookup(outcome)
    }
}
