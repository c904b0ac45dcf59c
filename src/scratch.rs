//! Scratch card: progressive reveal
//!
//! The foil is an alpha mask at a fixed logical resolution. Each pointer move
//! erases a disc; coverage is estimated by sampling every n-th cell, and
//! crossing the threshold reveals the card for good.

use serde::{Deserialize, Serialize};

use crate::tuning::ScratchTuning;

/// Cells below this alpha count as scratched off
const CLEAR_ALPHA: u8 = 128;

/// Foil coverage buffer
///
/// Only `stamp` and `coverage` are exposed so the buffer itself can never be
/// mutated from outside the card.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
    sample_stride: usize,
}

impl RevealMask {
    pub fn new(width: u32, height: u32, sample_stride: usize) -> Self {
        Self {
            width,
            height,
            alpha: vec![u8::MAX; width as usize * height as usize],
            sample_stride: sample_stride.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Erase a disc centered at (x, y) in mask coordinates
    pub fn stamp(&mut self, x: f32, y: f32, radius: f32) {
        if !x.is_finite() || !y.is_finite() || radius <= 0.0 {
            return;
        }
        let x0 = (x - radius).floor().max(0.0) as u32;
        let y0 = (y - radius).floor().max(0.0) as u32;
        let x1 = ((x + radius).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((y + radius).ceil().max(0.0) as u32).min(self.height);
        let r2 = radius * radius;
        for cy in y0..y1 {
            for cx in x0..x1 {
                let dx = cx as f32 + 0.5 - x;
                let dy = cy as f32 + 0.5 - y;
                if dx * dx + dy * dy <= r2 {
                    self.alpha[(cy * self.width + cx) as usize] = 0;
                }
            }
        }
    }

    /// Fraction of sampled cells scratched off, in [0, 1]
    pub fn coverage(&self) -> f32 {
        let (cleared, sampled) = self
            .alpha
            .iter()
            .step_by(self.sample_stride)
            .fold((0usize, 0usize), |(cleared, sampled), a| {
                (cleared + usize::from(*a < CLEAR_ALPHA), sampled + 1)
            });
        if sampled == 0 {
            0.0
        } else {
            cleared as f32 / sampled as f32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPhase {
    Hidden,
    Revealing,
    /// Terminal
    Revealed,
}

/// What one pointer move did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScratchResult {
    /// Card already revealed
    Ignored,
    Scratched { fraction: f32 },
    /// This move crossed the threshold
    Revealed { fraction: f32 },
}

#[derive(Debug, Clone)]
pub struct ScratchCard {
    mask: RevealMask,
    phase: RevealPhase,
    reward_amount: u32,
    brush_radius: f32,
    threshold: f32,
    fraction: f32,
}

impl ScratchCard {
    pub fn new(reward_amount: u32, tuning: &ScratchTuning) -> Self {
        Self {
            mask: RevealMask::new(tuning.mask_width, tuning.mask_height, tuning.sample_stride),
            phase: RevealPhase::Hidden,
            reward_amount,
            brush_radius: tuning.brush_radius,
            threshold: tuning.reveal_threshold,
            fraction: 0.0,
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn reward_amount(&self) -> u32 {
        self.reward_amount
    }

    /// Revealed fraction as of the last stamp; never decreases
    pub fn revealed_fraction(&self) -> f32 {
        self.fraction
    }

    pub fn is_revealed(&self) -> bool {
        self.phase == RevealPhase::Revealed
    }

    /// Pointer input in mask logical coordinates
    pub fn scratch_at(&mut self, x: f32, y: f32) -> ScratchResult {
        if self.is_revealed() {
            return ScratchResult::Ignored;
        }
        if self.phase == RevealPhase::Hidden {
            log::debug!("scratch card: first touch");
            self.phase = RevealPhase::Revealing;
        }
        self.mask.stamp(x, y, self.brush_radius);
        self.fraction = self.fraction.max(self.mask.coverage());

        if self.fraction >= self.threshold {
            self.phase = RevealPhase::Revealed;
            log::info!(
                "scratch card revealed at {:.0}%: {} credits",
                self.fraction * 100.0,
                self.reward_amount
            );
            ScratchResult::Revealed {
                fraction: self.fraction,
            }
        } else {
            ScratchResult::Scratched {
                fraction: self.fraction,
            }
        }
    }

    /// Pointer input in device pixels over a card drawn `width` x `height`
    pub fn scratch_at_device(&mut self, x: f32, y: f32, width: f32, height: f32) -> ScratchResult {
        if width <= 0.0 || height <= 0.0 {
            log::warn!("scratch input over a {width}x{height} card ignored");
            return if self.is_revealed() {
                ScratchResult::Ignored
            } else {
                ScratchResult::Scratched {
                    fraction: self.fraction,
                }
            };
        }
        let sx = self.mask.width() as f32 / width;
        let sy = self.mask.height() as f32 / height;
        self.scratch_at(x * sx, y * sy)
    }
}
