//! Coin toss
//!
//! Heads is local +Y. The flip spins about a random horizontal axis by an
//! even number of half-turns for heads, odd for tails, plus many full turns
//! and a little jitter.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Launch, MiniGameStrategy, wrong_target};
use crate::error::EngineResult;
use crate::outcome::{CoinSide, GameKind, Outcome, TargetOutcome};
use crate::settings::LaunchMode;
use crate::sim::{
    Arena, BodyShape, Material, RestDetector, SimulationBody, jitter, upmost_normal,
};
use crate::tuning::CoinTuning;

const SIDE_NORMALS: [Vec3; 2] = [Vec3::Y, Vec3::NEG_Y];

/// Toss height above the felt
const TOSS_HEIGHT: f32 = 1.0;

pub fn side_up(orientation: Quat) -> CoinSide {
    match upmost_normal(&SIDE_NORMALS, orientation) {
        Some(1) => CoinSide::Tails,
        _ => CoinSide::Heads,
    }
}

fn side_normal(side: CoinSide) -> Vec3 {
    match side {
        CoinSide::Heads => Vec3::Y,
        CoinSide::Tails => Vec3::NEG_Y,
    }
}

fn half_turns(side: CoinSide) -> f32 {
    match side {
        CoinSide::Heads => 0.0,
        CoinSide::Tails => 1.0,
    }
}

#[derive(Debug, Clone)]
pub struct CoinGame {
    tuning: CoinTuning,
}

impl CoinGame {
    pub fn new(tuning: CoinTuning) -> Self {
        Self { tuning }
    }

    fn shape(&self) -> BodyShape {
        BodyShape::Cylinder {
            radius: self.tuning.radius,
            half_height: self.tuning.half_thickness,
        }
    }

    fn material(&self) -> Material {
        Material {
            restitution: self.tuning.restitution,
            friction: self.tuning.friction,
            angular_damping: self.tuning.angular_damping,
            align_below: self.tuning.align_below,
            align_rate: self.tuning.align_rate,
            ..Material::default()
        }
    }

    fn resting_body(&self, side: CoinSide) -> SimulationBody {
        let orientation = Quat::from_rotation_x(PI * half_turns(side));
        let position = Vec3::new(0.0, self.tuning.half_thickness, 0.0);
        SimulationBody::new(0, self.shape(), position, orientation)
    }

    fn tossed_body(&self, side: CoinSide, rng: &mut Pcg32) -> SimulationBody {
        let t = &self.tuning;
        let start = Quat::from_rotation_y(rng.random_range(0.0..TAU));
        let heading = rng.random_range(0.0..TAU);
        let axis = Vec3::new(heading.cos(), 0.0, heading.sin());

        let turns = rng.random_range(t.min_turns..=t.max_turns) as f32;
        let rotation = PI * half_turns(side) + TAU * turns + jitter(rng, t.spin_jitter);
        let spin = axis * rotation * t.angular_damping;

        let velocity = Vec3::new(
            jitter(rng, t.toss_lateral),
            rng.random_range(t.toss_speed_min..=t.toss_speed_max),
            jitter(rng, t.toss_lateral),
        );
        let position = Vec3::new(0.0, TOSS_HEIGHT, 0.0);
        SimulationBody::new(0, self.shape(), position, start).with_velocity(velocity, spin)
    }
}

impl MiniGameStrategy for CoinGame {
    fn kind(&self) -> GameKind {
        GameKind::Coin
    }

    fn launch(
        &self,
        target: &TargetOutcome,
        mode: LaunchMode,
        rng: &mut Pcg32,
    ) -> EngineResult<Launch> {
        let Outcome::Coin { side } = target else {
            return Err(wrong_target(self.kind(), target));
        };
        let body = match mode {
            LaunchMode::Exact => self.resting_body(*side),
            LaunchMode::Randomized => self.tossed_body(*side, rng),
        };
        let detector = RestDetector::new(self.tuning.linear_epsilon, self.tuning.angular_epsilon);
        Ok(Launch {
            arena: Arena::table(self.tuning.table_half_size),
            bodies: vec![body.with_material(self.material()).with_detector(detector)],
        })
    }

    fn extract(&self, bodies: &[SimulationBody]) -> Outcome {
        let side = bodies
            .first()
            .map(|b| side_up(b.orientation))
            .unwrap_or(CoinSide::Heads);
        Outcome::Coin { side }
    }

    fn snap(&self, target: &TargetOutcome, bodies: &mut [SimulationBody]) {
        let Outcome::Coin { side } = target else {
            return;
        };
        let Some(body) = bodies.first_mut() else {
            return;
        };
        if side_up(body.orientation) == *side {
            return;
        }
        let world = (body.orientation * side_normal(*side)).normalize();
        let orientation = Quat::from_rotation_arc(world, Vec3::Y) * body.orientation;
        let mut position = body.position;
        position.y = self.shape().support_depth(orientation);
        body.place(position, orientation);
    }

    fn reward_lookup(&self, outcome: &Outcome) -> u32 {
        match outcome {
            Outcome::Coin {
                side: CoinSide::Heads,
            } => self.tuning.heads_credits,
            Outcome::Coin {
                side: CoinSide::Tails,
            } => self.tuning.tails_credits,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_support::run_play;
    use crate::sim::BackendKind;

    fn game() -> CoinGame {
        CoinGame::new(CoinTuning::default())
    }

    #[test]
    fn test_side_up() {
        assert_eq!(side_up(Quat::IDENTITY), CoinSide::Heads);
        assert_eq!(side_up(Quat::from_rotation_z(PI)), CoinSide::Tails);
        assert_eq!(side_up(Quat::from_rotation_x(0.4)), CoinSide::Heads);
    }

    #[test]
    fn test_payout() {
        let g = game();
        assert_eq!(g.reward_lookup(&Outcome::Coin { side: CoinSide::Heads }), 10);
        assert_eq!(g.reward_lookup(&Outcome::Coin { side: CoinSide::Tails }), 0);
        assert_eq!(g.reward_lookup(&Outcome::Wheel { segment_index: 0 }), 0);
    }

    #[test]
    fn test_tosses_land_on_target() {
        let g = game();
        for backend in [BackendKind::Rigid, BackendKind::Planar] {
            let mut hits = 0;
            let trials = 20;
            for seed in 0..trials {
                let side = if seed % 2 == 0 {
                    CoinSide::Heads
                } else {
                    CoinSide::Tails
                };
                let target = Outcome::Coin { side };
                let (world, _) = run_play(&g, &target, backend, LaunchMode::Randomized, seed);
                assert!(!world.timed_out());
                if g.extract(world.bodies()) == target {
                    hits += 1;
                }
            }
            assert!(hits * 100 >= trials * 95, "{backend}: {hits}/{trials}");
        }
    }

    #[test]
    fn test_snap_flips_coin() {
        let g = game();
        let mut bodies = vec![g.resting_body(CoinSide::Heads)];
        let target = Outcome::Coin {
            side: CoinSide::Tails,
        };
        g.snap(&target, &mut bodies);
        assert_eq!(g.extract(&bodies), target);
        assert!((bodies[0].position.y - 0.05).abs() < 1e-4);
    }
}
