//! Sound cues for the audio/haptics collaborator
//!
//! The engine never plays audio itself. It turns lifecycle events into named
//! cues with a volume, and tracks which loops are running so that every loop
//! a play started is stopped when it completes or is cancelled.

use serde::{Deserialize, Serialize};

use crate::events::EngineEvent;
use crate::outcome::GameKind;
use crate::sim::Surface;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEffect {
    /// Pachinko ball released
    BallDrop,
    /// Pachinko ball hits a peg
    PegHit,
    /// Pachinko ball lands in a paying slot
    SlotWin,
    /// Wheel launched
    SpinStart,
    /// Wheel segment boundary passes the pointer
    WheelTick,
    WheelWin,
    DiceRoll,
    DiceBounce,
    DiceLand,
    /// Slot reels spinning (loop)
    ReelSpin,
    ReelStop,
    Jackpot,
    CoinFlip,
    /// Coin in the air (loop)
    CoinSpin,
    CoinLand,
    /// Foil being scratched (loop)
    Scratch,
    Reveal,
}

impl SoundEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::BallDrop => "ball_drop",
            SoundEffect::PegHit => "peg_hit",
            SoundEffect::SlotWin => "slot_win",
            SoundEffect::SpinStart => "spin_start",
            SoundEffect::WheelTick => "wheel_tick",
            SoundEffect::WheelWin => "wheel_win",
            SoundEffect::DiceRoll => "dice_roll",
            SoundEffect::DiceBounce => "dice_bounce",
            SoundEffect::DiceLand => "dice_land",
            SoundEffect::ReelSpin => "reel_spin",
            SoundEffect::ReelStop => "reel_stop",
            SoundEffect::Jackpot => "jackpot",
            SoundEffect::CoinFlip => "coin_flip",
            SoundEffect::CoinSpin => "coin_spin",
            SoundEffect::CoinLand => "coin_land",
            SoundEffect::Scratch => "scratch",
            SoundEffect::Reveal => "reveal",
        }
    }

    /// Mix level before settings are applied
    pub fn base_volume(&self) -> f32 {
        match self {
            SoundEffect::BallDrop => 0.4,
            SoundEffect::PegHit => 0.3,
            SoundEffect::SlotWin => 0.6,
            SoundEffect::SpinStart => 0.5,
            SoundEffect::WheelTick => 0.3,
            SoundEffect::WheelWin => 0.6,
            SoundEffect::DiceRoll => 0.5,
            SoundEffect::DiceBounce => 0.3,
            SoundEffect::DiceLand => 0.4,
            SoundEffect::ReelSpin => 0.5,
            SoundEffect::ReelStop => 0.4,
            SoundEffect::Jackpot => 0.7,
            SoundEffect::CoinFlip => 0.5,
            SoundEffect::CoinSpin => 0.3,
            SoundEffect::CoinLand => 0.4,
            SoundEffect::Scratch => 0.2,
            SoundEffect::Reveal => 0.6,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            SoundEffect::ReelSpin | SoundEffect::CoinSpin | SoundEffect::Scratch
        )
    }
}

/// Instruction for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SoundCue {
    Play { effect: SoundEffect, volume: f32 },
    StartLoop { effect: SoundEffect, volume: f32 },
    StopLoop { effect: SoundEffect },
}

/// Maps events to cues for one mini-game
#[derive(Debug, Clone)]
pub struct AudioDirector {
    kind: GameKind,
    volume: f32,
    active_loops: Vec<SoundEffect>,
}

impl AudioDirector {
    pub fn new(kind: GameKind, volume: f32) -> Self {
        Self {
            kind,
            volume: volume.clamp(0.0, 1.0),
            active_loops: Vec::new(),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn active_loops(&self) -> &[SoundEffect] {
        &self.active_loops
    }

    /// Cues triggered by one event
    pub fn cues_for(&mut self, event: &EngineEvent) -> Vec<SoundCue> {
        use SoundEffect as S;

        let mut cues = Vec::new();
        match (self.kind, event) {
            (GameKind::Dice, EngineEvent::Launched { .. }) => self.play(&mut cues, S::DiceRoll, 1.0),
            (GameKind::Coin, EngineEvent::Launched { .. }) => {
                self.play(&mut cues, S::CoinFlip, 1.0);
                self.start_loop(&mut cues, S::CoinSpin);
            }
            (GameKind::Pachinko, EngineEvent::Launched { .. }) => {
                self.play(&mut cues, S::BallDrop, 1.0)
            }
            (GameKind::SlotReels, EngineEvent::Launched { .. }) => {
                self.start_loop(&mut cues, S::ReelSpin)
            }
            (GameKind::Wheel, EngineEvent::Launched { .. }) => {
                self.play(&mut cues, S::SpinStart, 1.0)
            }

            (GameKind::Dice, EngineEvent::Collision { impact, .. }) => {
                self.play(&mut cues, S::DiceBounce, impact_scale(*impact))
            }
            (
                GameKind::Pachinko,
                EngineEvent::Collision {
                    surface: Surface::Peg,
                    impact,
                    ..
                },
            ) => self.play(&mut cues, S::PegHit, impact_scale(*impact)),
            (GameKind::Wheel, EngineEvent::Tick { .. }) => self.play(&mut cues, S::WheelTick, 1.0),
            (GameKind::SlotReels, EngineEvent::ReelStop { reel, .. }) => {
                self.play(&mut cues, S::ReelStop, 1.0);
                if *reel == 2 {
                    self.stop_loop(&mut cues, S::ReelSpin);
                }
            }

            (GameKind::Dice, EngineEvent::Settled { .. }) => self.play(&mut cues, S::DiceLand, 1.0),
            (GameKind::Coin, EngineEvent::Settled { .. }) => {
                self.stop_loop(&mut cues, S::CoinSpin);
                self.play(&mut cues, S::CoinLand, 1.0);
            }

            (GameKind::Scratch, EngineEvent::Reveal { .. }) => self.start_loop(&mut cues, S::Scratch),
            (GameKind::Scratch, EngineEvent::Revealed { .. }) => {
                self.stop_loop(&mut cues, S::Scratch);
                self.play(&mut cues, S::Reveal, 1.0);
            }

            (GameKind::Pachinko, EngineEvent::Reconciled { reward, .. }) if *reward > 0 => {
                self.play(&mut cues, S::SlotWin, 1.0)
            }
            (GameKind::Wheel, EngineEvent::Reconciled { .. }) => {
                self.play(&mut cues, S::WheelWin, 1.0)
            }

            (_, EngineEvent::Jackpot { .. }) => self.play(&mut cues, S::Jackpot, 1.0),
            (_, EngineEvent::Completed { .. }) | (_, EngineEvent::Cancelled) => {
                cues.extend(self.stop_all())
            }
            _ => {}
        }
        cues
    }

    /// Stop every loop still running
    pub fn stop_all(&mut self) -> Vec<SoundCue> {
        self.active_loops
            .drain(..)
            .map(|effect| SoundCue::StopLoop { effect })
            .collect()
    }

    fn play(&self, cues: &mut Vec<SoundCue>, effect: SoundEffect, scale: f32) {
        let volume = effect.base_volume() * self.volume * scale;
        if volume > 0.0 {
            cues.push(SoundCue::Play { effect, volume });
        }
    }

    fn start_loop(&mut self, cues: &mut Vec<SoundCue>, effect: SoundEffect) {
        if self.active_loops.contains(&effect) {
            return;
        }
        self.active_loops.push(effect);
        cues.push(SoundCue::StartLoop {
            effect,
            volume: effect.base_volume() * self.volume,
        });
    }

    fn stop_loop(&mut self, cues: &mut Vec<SoundCue>, effect: SoundEffect) {
        if let Some(i) = self.active_loops.iter().position(|e| *e == effect) {
            self.active_loops.remove(i);
            cues.push(SoundCue::StopLoop { effect });
        }
    }
}

/// Louder hits for harder impacts
fn impact_scale(impact: f32) -> f32 {
    (impact / 5.0).clamp(0.2, 1.0)
}
