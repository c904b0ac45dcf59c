//! Fortune wheel
//!
//! The wheel turns counter-clockwise about Z under a pointer fixed at angle
//! zero. Segment `i` covers wheel angles `[i·w, (i+1)·w)`, so the segment
//! under the pointer is the one at wheel angle `-spin`.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Launch, MiniGameStrategy, step_events, wrong_target};
use crate::error::EngineResult;
use crate::events::EngineEvent;
use crate::outcome::{GameKind, Outcome, TargetOutcome};
use crate::settings::LaunchMode;
use crate::sim::{
    Arena, BodyShape, PhysicsWorld, RestDetector, Rotor, SimulationBody, Surface, jitter,
};
use crate::tuning::WheelTuning;
use crate::{forward_angle, wrap_angle};

const WHEEL_RADIUS: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct WheelGame {
    tuning: WheelTuning,
}

impl WheelGame {
    pub fn new(tuning: WheelTuning) -> Self {
        Self { tuning }
    }

    fn segment_width(&self) -> f32 {
        TAU / self.tuning.segment_count().max(1) as f32
    }

    /// Segment under the pointer
    pub fn segment_at(&self, spin: f32) -> usize {
        let n = self.tuning.segment_count().max(1);
        (wrap_angle(-spin) / self.segment_width()).floor() as usize % n
    }

    /// Spin that centers a segment under the pointer
    fn centered_spin(&self, segment: usize) -> f32 {
        wrap_angle(-(segment as f32 + 0.5) * self.segment_width())
    }

    fn wheel_body(&self, spin: f32, omega: f32) -> SimulationBody {
        let mut rotor = Rotor::new(Vec3::Z, spin, self.tuning.deceleration);
        rotor.omega = omega;
        rotor.detent = Some(self.segment_width());
        let detector = RestDetector {
            angular_epsilon: self.tuning.angular_epsilon,
            ..RestDetector::default()
        };
        let shape = BodyShape::Cylinder {
            radius: WHEEL_RADIUS,
            half_height: 0.1,
        };
        SimulationBody::rotor(0, shape, Vec3::ZERO, rotor).with_detector(detector)
    }
}

impl MiniGameStrategy for WheelGame {
    fn kind(&self) -> GameKind {
        GameKind::Wheel
    }

    fn launch(
        &self,
        target: &TargetOutcome,
        mode: LaunchMode,
        rng: &mut Pcg32,
    ) -> EngineResult<Launch> {
        let Outcome::Wheel { segment_index } = target else {
            return Err(wrong_target(self.kind(), target));
        };
        let desired = self.centered_spin(*segment_index);
        let body = match mode {
            LaunchMode::Exact => self.wheel_body(desired, 0.0),
            LaunchMode::Randomized => {
                let t = &self.tuning;
                let start = rng.random_range(0.0..TAU);
                let turns = rng.random_range(t.min_turns..=t.max_turns) as f32;
                let rotation = forward_angle(start, desired)
                    + TAU * turns
                    + jitter(rng, t.jitter_fraction) * self.segment_width();
                self.wheel_body(start, Rotor::launch_speed(rotation, t.deceleration))
            }
        };
        Ok(Launch {
            arena: Arena::open(),
            bodies: vec![body],
        })
    }

    /// Pointer ticks for every segment boundary that passed this step
    fn step(&self, world: &mut PhysicsWorld, dt: f32, rng: &mut Pcg32) -> Vec<EngineEvent> {
        let step = world.step(dt, rng);
        let mut events: Vec<EngineEvent> = step
            .contacts
            .iter()
            .filter(|c| c.surface == Surface::Detent)
            .filter_map(|c| world.bodies().get(c.body))
            .filter_map(|b| b.rotor_state())
            .map(|r| EngineEvent::Tick {
                segment: self.segment_at(r.spin),
            })
            .collect();
        events.extend(step_events(&step));
        events
    }

    fn extract(&self, bodies: &[SimulationBody]) -> Outcome {
        let segment_index = bodies
            .first()
            .and_then(|b| b.rotor_state())
            .map(|r| self.segment_at(r.spin))
            .unwrap_or(0);
        Outcome::Wheel { segment_index }
    }

    fn snap(&self, target: &TargetOutcome, bodies: &mut [SimulationBody]) {
        let Outcome::Wheel { segment_index } = target else {
            return;
        };
        let Some(body) = bodies.first_mut() else {
            return;
        };
        let Some(spin) = body.rotor_state().map(|r| r.spin) else {
            return;
        };
        if self.segment_at(spin) != *segment_index {
            let diff = wrap_angle(self.centered_spin(*segment_index) - spin + PI) - PI;
            body.set_spin(spin + diff);
        }
    }

    fn reward_lookup(&self, outcome: &Outcome) -> u32 {
        match outcome {
            Outcome::Wheel { segment_index } => self
                .tuning
                .segment_values
                .get(*segment_index)
                .copied()
                .unwrap_or(0),
            _ => 0,
        }
    }
}
