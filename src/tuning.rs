//! Data-driven game balance
//!
//! Physics constants, launch-bias ranges and reward tables for every mini-game.
//! All fields default, so a partial JSON document only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Complete tuning set for all mini-games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Paid rewards at or above this fire a `jackpot` event
    pub jackpot_threshold: u32,
    pub dice: DiceTuning,
    pub coin: CoinTuning,
    pub pachinko: PachinkoTuning,
    pub reels: ReelTuning,
    pub wheel: WheelTuning,
    pub scratch: ScratchTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            jackpot_threshold: 10,
            dice: DiceTuning::default(),
            coin: CoinTuning::default(),
            pachinko: PachinkoTuning::default(),
            reels: ReelTuning::default(),
            wheel: WheelTuning::default(),
            scratch: ScratchTuning::default(),
        }
    }
}

/// Two dice thrown onto a walled table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceTuning {
    /// Half of the die edge length
    pub half_extent: f32,
    /// Table walls sit at ±this on X and Z
    pub table_half_size: f32,
    /// Spawn height above the felt
    pub drop_height: f32,
    /// Horizontal distance between the two dice at spawn
    pub spawn_spacing: f32,
    /// Max random lateral throw speed (X)
    pub throw_lateral: f32,
    /// Max random depth throw speed (Z)
    pub throw_depth: f32,
    /// Fixed downward throw speed
    pub throw_down: f32,
    pub restitution: f32,
    /// Coulomb friction coefficient against the felt
    pub friction: f32,
    /// Exponential angular damping (1/s)
    pub angular_damping: f32,
    pub min_turns: u32,
    pub max_turns: u32,
    /// Max spin jitter (radians); must stay under π/4
    pub spin_jitter: f32,
    /// Below this angular speed a grounded die is eased flat
    pub align_below: f32,
    /// Flat-easing rate (1/s)
    pub align_rate: f32,
    pub linear_epsilon: f32,
    pub angular_epsilon: f32,
    /// Credits indexed by `sum - 2`
    pub sum_credits: [u32; 11],
}

impl Default for DiceTuning {
    fn default() -> Self {
        Self {
            half_extent: 0.5,
            table_half_size: 5.0,
            drop_height: 3.0,
            spawn_spacing: 2.0,
            throw_lateral: 1.5,
            throw_depth: 1.0,
            throw_down: 2.0,
            restitution: 0.3,
            friction: 0.6,
            angular_damping: 2.5,
            min_turns: 8,
            max_turns: 10,
            spin_jitter: 0.2,
            align_below: 1.0,
            align_rate: 6.0,
            linear_epsilon: 0.1,
            angular_epsilon: 0.1,
            sum_credits: [2, 2, 3, 3, 4, 4, 6, 6, 8, 8, 10],
        }
    }
}

/// A single coin tossed above a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinTuning {
    pub radius: f32,
    pub half_thickness: f32,
    pub table_half_size: f32,
    pub toss_speed_min: f32,
    pub toss_speed_max: f32,
    /// Max random horizontal toss speed
    pub toss_lateral: f32,
    pub restitution: f32,
    pub friction: f32,
    pub angular_damping: f32,
    pub min_turns: u32,
    pub max_turns: u32,
    /// Max spin jitter (radians); must stay under π/2
    pub spin_jitter: f32,
    pub align_below: f32,
    pub align_rate: f32,
    pub linear_epsilon: f32,
    pub angular_epsilon: f32,
    pub heads_credits: u32,
    pub tails_credits: u32,
}

impl Default for CoinTuning {
    fn default() -> Self {
        Self {
            radius: 0.6,
            half_thickness: 0.05,
            table_half_size: 3.0,
            toss_speed_min: 4.0,
            toss_speed_max: 6.0,
            toss_lateral: 1.0,
            restitution: 0.3,
            friction: 0.5,
            angular_damping: 2.0,
            min_turns: 8,
            max_turns: 10,
            spin_jitter: 0.3,
            align_below: 1.0,
            align_rate: 6.0,
            linear_epsilon: 0.1,
            angular_epsilon: 0.3,
            heads_credits: 10,
            tails_credits: 0,
        }
    }
}

/// Ball dropped through a peg board into value slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PachinkoTuning {
    pub slot_width: f32,
    pub ball_radius: f32,
    pub peg_radius: f32,
    pub peg_rows: u32,
    /// Y of the first peg row
    pub peg_top_y: f32,
    pub peg_row_spacing: f32,
    /// Spawn height of the ball
    pub drop_height: f32,
    /// Fixed downward drop speed
    pub drop_speed: f32,
    /// Blend weight from board center toward the target slot center
    pub target_weight: f32,
    /// Uniform start-X jitter (±)
    pub start_jitter: f32,
    /// Lateral pull toward the aimed slot inside the peg field (1/s²)
    pub steer_stiffness: f32,
    /// Lateral damping inside the peg field (1/s)
    pub steer_damping: f32,
    /// Cap on the peg-field pull, below gravity
    pub steer_max_accel: f32,
    /// Below this line the ball is inside a slot bin
    pub capture_y: f32,
    pub floor_y: f32,
    pub restitution: f32,
    /// Coulomb friction against pegs, walls and bins
    pub friction: f32,
    /// Simplified backend: per-tick velocity friction
    pub planar_friction: f32,
    /// Simplified backend: max random lateral kick on a peg bounce
    pub perturbation: f32,
    /// Simplified backend: speed clamp
    pub max_speed: f32,
    pub linear_epsilon: f32,
    pub angular_epsilon: f32,
    /// Credits per slot, left to right; also defines the slot count
    pub slot_values: Vec<u32>,
}

impl Default for PachinkoTuning {
    fn default() -> Self {
        Self {
            slot_width: 0.8,
            ball_radius: 0.2,
            peg_radius: 0.15,
            peg_rows: 7,
            peg_top_y: 4.0,
            peg_row_spacing: 0.9,
            drop_height: 5.5,
            drop_speed: 1.0,
            target_weight: 0.3,
            start_jitter: 0.2,
            steer_stiffness: 12.0,
            steer_damping: 4.0,
            steer_max_accel: 4.0,
            capture_y: -3.0,
            floor_y: -3.5,
            restitution: 0.65,
            friction: 0.3,
            planar_friction: 0.01,
            perturbation: 0.15,
            max_speed: 12.0,
            linear_epsilon: 0.05,
            angular_epsilon: 0.05,
            slot_values: vec![0, 0, 1, 3, 10, 3, 1, 0, 0],
        }
    }
}

impl PachinkoTuning {
    pub fn slot_count(&self) -> usize {
        self.slot_values.len()
    }

    pub fn half_width(&self) -> f32 {
        self.slot_count() as f32 * self.slot_width / 2.0
    }

    /// X of the center of a slot
    pub fn slot_center_x(&self, slot_index: usize) -> f32 {
        -self.half_width() + self.slot_width * (slot_index as f32 + 0.5)
    }
}

/// Three reels of symbols spinning on a drum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelTuning {
    /// Credits for three of a kind, per symbol; also defines the symbol count
    pub triple_payouts: Vec<u32>,
    /// Credits for any two matching symbols
    pub pair_credits: u32,
    pub base_turns_min: u32,
    pub base_turns_max: u32,
    /// Extra full turns added per reel index (staggers the stops)
    pub turns_per_reel: u32,
    /// Constant angular deceleration (rad/s²)
    pub deceleration: f32,
    /// Max stop jitter as a fraction of one symbol step
    pub jitter_fraction: f32,
    pub angular_epsilon: f32,
}

impl Default for ReelTuning {
    fn default() -> Self {
        Self {
            triple_payouts: vec![2, 3, 4, 5, 6, 8, 10],
            pair_credits: 1,
            base_turns_min: 10,
            base_turns_max: 11,
            turns_per_reel: 2,
            deceleration: 25.0,
            jitter_fraction: 0.3,
            angular_epsilon: 0.05,
        }
    }
}

impl ReelTuning {
    pub fn symbol_count(&self) -> usize {
        self.triple_payouts.len()
    }
}

/// Fortune wheel under a stationary pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelTuning {
    /// Credits per segment; also defines the segment count
    pub segment_values: Vec<u32>,
    pub min_turns: u32,
    pub max_turns: u32,
    pub deceleration: f32,
    /// Max stop jitter as a fraction of one segment
    pub jitter_fraction: f32,
    pub angular_epsilon: f32,
}

impl Default for WheelTuning {
    fn default() -> Self {
        Self {
            segment_values: vec![0, 0, 1, 1, 2, 3, 3, 10],
            min_turns: 5,
            max_turns: 8,
            deceleration: 3.2,
            jitter_fraction: 0.35,
            angular_epsilon: 0.05,
        }
    }
}

impl WheelTuning {
    pub fn segment_count(&self) -> usize {
        self.segment_values.len()
    }
}

/// Scratch-card reveal mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchTuning {
    /// Mask logical resolution
    pub mask_width: u32,
    pub mask_height: u32,
    /// Brush disc radius in mask cells
    pub brush_radius: f32,
    /// Coverage is sampled on every n-th cell
    pub sample_stride: usize,
    /// Revealed fraction that completes the card
    pub reveal_threshold: f32,
}

impl Default for ScratchTuning {
    fn default() -> Self {
        Self {
            mask_width: 300,
            mask_height: 200,
            brush_radius: 25.0,
            sample_stride: 20,
            reveal_threshold: 0.55,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tables and ranges the engine cannot run with
    pub fn validate(&self) -> EngineResult<()> {
        let fail = |msg: &str| Err(EngineError::InvalidSettings(msg.to_string()));

        if self.dice.min_turns > self.dice.max_turns
            || self.coin.min_turns > self.coin.max_turns
            || self.wheel.min_turns > self.wheel.max_turns
            || self.reels.base_turns_min > self.reels.base_turns_max
        {
            return fail("turn range minimum exceeds maximum");
        }
        if !(self.coin.toss_speed_min.is_finite() && self.coin.toss_speed_max.is_finite())
            || self.coin.toss_speed_min > self.coin.toss_speed_max
        {
            return fail("coin toss speed range must be finite with minimum at most maximum");
        }
        let amplitudes = [
            self.dice.throw_lateral,
            self.dice.throw_depth,
            self.dice.spin_jitter,
            self.coin.toss_lateral,
            self.coin.spin_jitter,
            self.pachinko.start_jitter,
            self.pachinko.perturbation,
            self.reels.jitter_fraction,
            self.wheel.jitter_fraction,
        ];
        if amplitudes.iter().any(|a| !a.is_finite() || *a < 0.0) {
            return fail("jitter amplitudes must be finite and non-negative");
        }
        let steering = [
            self.pachinko.steer_stiffness,
            self.pachinko.steer_damping,
            self.pachinko.steer_max_accel,
        ];
        if steering.iter().any(|k| !k.is_finite() || *k < 0.0) {
            return fail("pachinko steering must be finite and non-negative");
        }
        if self.dice.angular_damping <= 0.0 || self.coin.angular_damping <= 0.0 {
            return fail("angular damping must be positive");
        }
        if self.dice.spin_jitter >= std::f32::consts::FRAC_PI_4 {
            return fail("dice spin jitter must stay below π/4");
        }
        if self.coin.spin_jitter >= std::f32::consts::FRAC_PI_2 {
            return fail("coin spin jitter must stay below π/2");
        }
        if self.pachinko.slot_values.is_empty() || self.pachinko.slot_width <= 0.0 {
            return fail("pachinko board needs at least one slot of positive width");
        }
        if self.reels.triple_payouts.is_empty() {
            return fail("reels need at least one symbol");
        }
        if self.wheel.segment_values.is_empty() {
            return fail("wheel needs at least one segment");
        }
        if self.reels.deceleration <= 0.0 || self.wheel.deceleration <= 0.0 {
            return fail("rotor deceleration must be positive");
        }
        if !(0.0..0.5).contains(&self.reels.jitter_fraction)
            || !(0.0..0.5).contains(&self.wheel.jitter_fraction)
        {
            return fail("rotor jitter must stay below half a step");
        }
        if self.scratch.mask_width == 0 || self.scratch.mask_height == 0 {
            return fail("scratch mask must not be empty");
        }
        if self.scratch.sample_stride == 0 {
            return fail("scratch sample stride must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.scratch.reveal_threshold) {
            return fail("scratch reveal threshold must be a fraction");
        }
        Ok(())
    }
}
