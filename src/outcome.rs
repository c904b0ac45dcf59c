//! Target outcomes and extracted symbolic results
//!
//! The Reward Authority hands the engine a `TargetOutcome` before a play; the
//! extractor produces an `Outcome` of the same shape from the final transforms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::tuning::Tuning;

/// The mini-game a play belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Dice,
    Coin,
    Pachinko,
    SlotReels,
    Wheel,
    Scratch,
}

impl GameKind {
    pub const ALL: [GameKind; 6] = [
        GameKind::Dice,
        GameKind::Coin,
        GameKind::Pachinko,
        GameKind::SlotReels,
        GameKind::Wheel,
        GameKind::Scratch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Dice => "dice",
            GameKind::Coin => "coin",
            GameKind::Pachinko => "pachinko",
            GameKind::SlotReels => "slot_reels",
            GameKind::Wheel => "wheel",
            GameKind::Scratch => "scratch",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dice" => Some(GameKind::Dice),
            "coin" => Some(GameKind::Coin),
            "pachinko" => Some(GameKind::Pachinko),
            "slot_reels" | "slots" | "reels" => Some(GameKind::SlotReels),
            "wheel" => Some(GameKind::Wheel),
            "scratch" => Some(GameKind::Scratch),
            _ => None,
        }
    }

    /// Physics-driven games go through the world adapter; scratch does not
    pub fn is_physics(&self) -> bool {
        !matches!(self, GameKind::Scratch)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSide {
    Heads,
    Tails,
}

/// Discrete symbolic result of one play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Top faces of the two dice (1-6 each)
    Dice { faces: [u8; 2] },
    Coin { side: CoinSide },
    /// Bin the ball came to rest in, left to right
    Pachinko { slot_index: usize },
    /// Symbol under the payline for each of the three reels
    SlotReels { symbols: [usize; 3] },
    /// Segment under the pointer
    Wheel { segment_index: usize },
    /// Authoritative reward printed under the scratch foil
    Scratch { reward_amount: u32 },
}

/// What the Reward Authority asks a play to land on
pub type TargetOutcome = Outcome;

impl Outcome {
    pub fn kind(&self) -> GameKind {
        match self {
            Outcome::Dice { .. } => GameKind::Dice,
            Outcome::Coin { .. } => GameKind::Coin,
            Outcome::Pachinko { .. } => GameKind::Pachinko,
            Outcome::SlotReels { .. } => GameKind::SlotReels,
            Outcome::Wheel { .. } => GameKind::Wheel,
            Outcome::Scratch { .. } => GameKind::Scratch,
        }
    }

    /// Check the outcome is legal for its game under the given tuning
    pub fn validate(&self, tuning: &Tuning) -> EngineResult<()> {
        let kind = self.kind();
        match self {
            Outcome::Dice { faces } => {
                if let Some(face) = faces.iter().find(|f| !(1..=6).contains(*f)) {
                    return Err(EngineError::configuration(
                        kind,
                        format!("die face {face} outside 1-6"),
                    ));
                }
            }
            Outcome::Coin { .. } => {}
            Outcome::Pachinko { slot_index } => {
                let count = tuning.pachinko.slot_count();
                if *slot_index >= count {
                    return Err(EngineError::configuration(
                        kind,
                        format!("slot {slot_index} outside 0..{count}"),
                    ));
                }
            }
            Outcome::SlotReels { symbols } => {
                let count = tuning.reels.symbol_count();
                if let Some(symbol) = symbols.iter().find(|s| **s >= count) {
                    return Err(EngineError::configuration(
                        kind,
                        format!("symbol {symbol} outside 0..{count}"),
                    ));
                }
            }
            Outcome::Wheel { segment_index } => {
                let count = tuning.wheel.segment_count();
                if *segment_index >= count {
                    return Err(EngineError::configuration(
                        kind,
                        format!("segment {segment_index} outside 0..{count}"),
                    ));
                }
            }
            // u32 already rules out negative rewards
            Outcome::Scratch { .. } => {}
        }
        Ok(())
    }

    /// Parse a target from JSON, e.g. `{"kind":"dice","faces":[3,4]}`
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
