//! Three-reel slot machine
//!
//! Each reel is a drum on a fixed axle coasting under constant deceleration,
//! so the launch speed that stops it on a given symbol is exact. Later reels
//! get extra full turns and stop after the earlier ones.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Launch, MiniGameStrategy, step_events, wrong_target};
use crate::error::EngineResult;
use crate::events::EngineEvent;
use crate::outcome::{GameKind, Outcome, TargetOutcome};
use crate::settings::LaunchMode;
use crate::sim::{Arena, BodyShape, PhysicsWorld, RestDetector, Rotor, SimulationBody, jitter};
use crate::tuning::ReelTuning;
use crate::{forward_angle, wrap_angle};

const REEL_SPACING: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct ReelsGame {
    tuning: ReelTuning,
}

impl ReelsGame {
    pub fn new(tuning: ReelTuning) -> Self {
        Self { tuning }
    }

    fn symbol_step(&self) -> f32 {
        TAU / self.tuning.symbol_count().max(1) as f32
    }

    /// Symbol showing on the pay line for a drum angle
    pub fn symbol_at(&self, spin: f32) -> usize {
        let n = self.tuning.symbol_count().max(1);
        (wrap_angle(spin) / self.symbol_step()).round() as usize % n
    }

    fn reel_body(&self, reel: usize, spin: f32, omega: f32) -> SimulationBody {
        let mut rotor = Rotor::new(Vec3::X, spin, self.tuning.deceleration);
        rotor.omega = omega;
        rotor.detent = Some(self.symbol_step());
        let position = Vec3::new((reel as f32 - 1.0) * REEL_SPACING, 0.0, 0.0);
        let shape = BodyShape::Cylinder {
            radius: 0.5,
            half_height: 0.4,
        };
        let detector = RestDetector {
            angular_epsilon: self.tuning.angular_epsilon,
            ..RestDetector::default()
        };
        SimulationBody::rotor(reel, shape, position, rotor).with_detector(detector)
    }

    fn spun_reel(&self, reel: usize, symbol: usize, rng: &mut Pcg32) -> SimulationBody {
        let t = &self.tuning;
        let step = self.symbol_step();
        let start = rng.random_range(0..t.symbol_count().max(1)) as f32 * step;
        let turns = rng.random_range(t.base_turns_min..=t.base_turns_max) + reel as u32 * t.turns_per_reel;
        let rotation = forward_angle(start, symbol as f32 * step)
            + TAU * turns as f32
            + jitter(rng, t.jitter_fraction) * step;
        self.reel_body(reel, start, Rotor::launch_speed(rotation, t.deceleration))
    }
}

impl MiniGameStrategy for ReelsGame {
    fn kind(&self) -> GameKind {
        GameKind::SlotReels
    }

    fn launch(
        &self,
        target: &TargetOutcome,
        mode: LaunchMode,
        rng: &mut Pcg32,
    ) -> EngineResult<Launch> {
        let Outcome::SlotReels { symbols } = target else {
            return Err(wrong_target(self.kind(), target));
        };
        let step = self.symbol_step();
        let bodies = symbols
            .iter()
            .enumerate()
            .map(|(reel, symbol)| match mode {
                LaunchMode::Exact => self.reel_body(reel, *symbol as f32 * step, 0.0),
                LaunchMode::Randomized => self.spun_reel(reel, *symbol, rng),
            })
            .collect();
        Ok(Launch {
            arena: Arena::open(),
            bodies,
        })
    }

    /// Reel stops are announced ahead of the matching settle
    fn step(&self, world: &mut PhysicsWorld, dt: f32, rng: &mut Pcg32) -> Vec<EngineEvent> {
        let step = world.step(dt, rng);
        let mut events: Vec<EngineEvent> = step
            .settled
            .iter()
            .map(|s| EngineEvent::ReelStop {
                reel: s.body,
                symbol: world
                    .bodies()
                    .get(s.body)
                    .and_then(|b| b.rotor_state())
                    .map(|r| self.symbol_at(r.spin))
                    .unwrap_or(0),
            })
            .collect();
        events.extend(step_events(&step));
        events
    }

    fn extract(&self, bodies: &[SimulationBody]) -> Outcome {
        let symbol = |i: usize| {
            bodies
                .get(i)
                .and_then(|b| b.rotor_state())
                .map(|r| self.symbol_at(r.spin))
                .unwrap_or(0)
        };
        Outcome::SlotReels {
            symbols: [symbol(0), symbol(1), symbol(2)],
        }
    }

    fn snap(&self, target: &TargetOutcome, bodies: &mut [SimulationBody]) {
        let Outcome::SlotReels { symbols } = target else {
            return;
        };
        let step = self.symbol_step();
        for (body, symbol) in bodies.iter_mut().zip(symbols) {
            let Some(spin) = body.rotor_state().map(|r| r.spin) else {
                continue;
            };
            if self.symbol_at(spin) == *symbol {
                continue;
            }
            // Shortest signed turn onto the symbol
            let diff = wrap_angle(*symbol as f32 * step - spin + PI) - PI;
            body.set_spin(spin + diff);
        }
    }

    fn reward_lookup(&self, outcome: &Outcome) -> u32 {
        let Outcome::SlotReels { symbols: [a, b, c] } = outcome else {
            return 0;
        };
        if a == b && b == c {
            self.tuning.triple_payouts.get(*a).copied().unwrap_or(0)
        } else if a == b || b == c || a == c {
            self.tuning.pair_credits
        } else {
            0
        }
    }
}
