//! Chance Rig - deterministic-outcome physics mini-games
//!
//! The reward of every play is decided before the animation starts. The engine
//! runs a plausible simulation that converges on that result, reads the result
//! back from the final transforms and reconciles the two.
//!
//! Core modules:
//! - `outcome`: Target outcomes and extracted symbolic results
//! - `sim`: Bodies, rest detection, the two physics backends and the world adapter
//! - `games`: Per-game launch biasing, extraction and reward lookup
//! - `reconcile`: Divergence policy and payout
//! - `scratch`: Progressive reveal state machine (scratch card)
//! - `capability`: 3D/2D backend selection
//! - `events` / `audio`: Lifecycle events and sound cues for collaborators
//! - `session`: Play session lifecycle and the engine facade
//! - `tuning` / `settings`: Data-driven constants and engine preferences
//! - `history`: Ledger of completed plays
//! - `platform`: Browser binding, capability probe and cue synth (wasm only)

pub mod audio;
pub mod capability;
pub mod error;
pub mod events;
pub mod games;
pub mod history;
pub mod outcome;
pub mod platform;
pub mod reconcile;
pub mod scratch;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventBridge};
pub use history::PlayHistory;
pub use outcome::{CoinSide, GameKind, Outcome, TargetOutcome};
pub use session::{MiniGameEngine, PlayPhase};
pub use settings::{EngineSettings, LaunchMode, QualityPreset};
pub use tuning::Tuning;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the rigid-body world)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted by the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Hard tick ceiling per play (30 s at 60 Hz)
    pub const DEFAULT_TICK_CEILING: u64 = 1800;

    /// Standard gravity (m/s²)
    pub const GRAVITY: f32 = 9.81;
}

/// Wrap an angle to [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Forward (counter-clockwise) distance from `from` to `to`, in [0, 2π)
#[inline]
pub fn forward_angle(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}
