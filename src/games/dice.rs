//! Two dice thrown onto a walled table
//!
//! The throw itself is fully random; only the spin is biased. Free spin
//! decays exponentially, so the total rotation is known at launch and is
//! chosen as: rotation onto the target face + 8-10 full turns + jitter.

use std::f32::consts::TAU;

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Launch, MiniGameStrategy, wrong_target};
use crate::error::EngineResult;
use crate::outcome::{GameKind, Outcome, TargetOutcome};
use crate::settings::LaunchMode;
use crate::sim::{
    Arena, BodyShape, Material, RestDetector, SimulationBody, jitter, upmost_normal,
};
use crate::tuning::DiceTuning;

/// Local face normals and the pip count printed on each
const FACE_NORMALS: [Vec3; 6] = [
    Vec3::Z,
    Vec3::NEG_Z,
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
];
const FACE_VALUES: [u8; 6] = [1, 6, 2, 5, 3, 4];

/// Pip count on top for an orientation
pub fn face_up(orientation: Quat) -> u8 {
    upmost_normal(&FACE_NORMALS, orientation)
        .map(|i| FACE_VALUES[i])
        .unwrap_or(1)
}

/// Local normal of the face carrying `value`
pub fn face_normal(value: u8) -> Vec3 {
    FACE_VALUES
        .iter()
        .position(|v| *v == value)
        .map(|i| FACE_NORMALS[i])
        .unwrap_or(Vec3::Z)
}

/// Flat orientation showing `value` on top, turned by `yaw`
pub fn resting_orientation(value: u8, yaw: f32) -> Quat {
    (Quat::from_rotation_y(yaw) * Quat::from_rotation_arc(face_normal(value), Vec3::Y)).normalize()
}

#[derive(Debug, Clone)]
pub struct DiceGame {
    tuning: DiceTuning,
}

impl DiceGame {
    pub fn new(tuning: DiceTuning) -> Self {
        Self { tuning }
    }

    fn shape(&self) -> BodyShape {
        BodyShape::Cuboid {
            half_extents: Vec3::splat(self.tuning.half_extent),
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

    fn spawn_x(&self, index: usize) -> f32 {
        let half = self.tuning.spawn_spacing / 2.0;
        if index == 0 { -half } else { half }
    }

    fn resting_body(&self, index: usize, face: u8, yaw: f32) -> SimulationBody {
        let orientation = resting_orientation(face, yaw);
        let position = Vec3::new(self.spawn_x(index), self.tuning.half_extent, 0.0);
        SimulationBody::new(index, self.shape(), position, orientation)
    }

    fn thrown_body(&self, index: usize, face: u8, rng: &mut Pcg32) -> SimulationBody {
        let t = &self.tuning;
        let start = Quat::from_euler(
            EulerRot::XYZ,
            rng.random_range(0.0..TAU),
            rng.random_range(0.0..TAU),
            rng.random_range(0.0..TAU),
        );
        let target = resting_orientation(face, rng.random_range(0.0..TAU));

        let mut delta = target * start.inverse();
        if delta.w < 0.0 {
            delta = -delta;
        }
        let (axis, angle) = delta.to_axis_angle();
        let turns = rng.random_range(t.min_turns..=t.max_turns) as f32;
        let rotation = angle + TAU * turns + jitter(rng, t.spin_jitter);
        let spin = axis.normalize_or(Vec3::Y) * rotation * t.angular_damping;

        let velocity = Vec3::new(
            jitter(rng, t.throw_lateral),
            -t.throw_down,
            jitter(rng, t.throw_depth),
        );
        let position = Vec3::new(self.spawn_x(index), t.drop_height, 0.0);
        SimulationBody::new(index, self.shape(), position, start).with_velocity(velocity, spin)
    }
}

impl MiniGameStrategy for DiceGame {
    fn kind(&self) -> GameKind {
        GameKind::Dice
    }

    fn launch(
        &self,
        target: &TargetOutcome,
        mode: LaunchMode,
        rng: &mut Pcg32,
    ) -> EngineResult<Launch> {
        let Outcome::Dice { faces } = target else {
            return Err(wrong_target(self.kind(), target));
        };
        let detector = RestDetector::new(self.tuning.linear_epsilon, self.tuning.angular_epsilon);
        let bodies = faces
            .iter()
            .enumerate()
            .map(|(i, face)| {
                let body = match mode {
                    LaunchMode::Exact => self.resting_body(i, *face, 0.0),
                    LaunchMode::Randomized => self.thrown_body(i, *face, rng),
                };
                body.with_material(self.material()).with_detector(detector)
            })
            .collect();
        Ok(Launch {
            arena: Arena::table(self.tuning.table_half_size),
            bodies,
        })
    }

    fn extract(&self, bodies: &[SimulationBody]) -> Outcome {
        let face = |i: usize| bodies.get(i).map(|b| face_up(b.orientation)).unwrap_or(1);
        Outcome::Dice {
            faces: [face(0), face(1)],
        }
    }

    fn snap(&self, target: &TargetOutcome, bodies: &mut [SimulationBody]) {
        let Outcome::Dice { faces } = target else {
            return;
        };
        for (body, face) in bodies.iter_mut().zip(faces) {
            if face_up(body.orientation) == *face {
                continue;
            }
            // Smallest tip that brings the target face up, keeping position on the felt
            let world = (body.orientation * face_normal(*face)).normalize();
            let orientation = Quat::from_rotation_arc(world, Vec3::Y) * body.orientation;
            let mut position = body.position;
            position.y = self.shape().support_depth(orientation);
            body.place(position, orientation);
        }
    }

    fn reward_lookup(&self, outcome: &Outcome) -> u32 {
        let Outcome::Dice { faces } = outcome else {
            return 0;
        };
        let sum = (faces[0] + faces[1]) as usize;
        sum.checked_sub(2)
            .and_then(|i| self.tuning.sum_credits.get(i))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_support::run_play;
    use crate::sim::BackendKind;
    use std::f32::consts::FRAC_PI_2;

    fn game() -> DiceGame {
        DiceGame::new(DiceTuning::default())
    }

    #[test]
    fn test_face_table() {
        assert_eq!(face_up(Quat::IDENTITY), 3);
        // +Z tipped up onto +Y
        assert_eq!(face_up(Quat::from_rotation_x(-FRAC_PI_2)), 1);
        assert_eq!(face_up(Quat::from_rotation_x(FRAC_PI_2)), 6);
        // +X tipped up
        assert_eq!(face_up(Quat::from_rotation_z(FRAC_PI_2)), 2);
        assert_eq!(face_up(Quat::from_rotation_z(-FRAC_PI_2)), 5);
        for value in 1..=6 {
            assert_eq!(face_up(resting_orientation(value, 1.3)), value);
        }
    }

    #[test]
    fn test_reward_table() {
        let g = game();
        let pays = |a, b| g.reward_lookup(&Outcome::Dice { faces: [a, b] });
        assert_eq!(pays(1, 1), 2);
        assert_eq!(pays(1, 2), 2);
        assert_eq!(pays(2, 2), 3);
        assert_eq!(pays(3, 4), 4);
        assert_eq!(pays(4, 4), 6);
        assert_eq!(pays(5, 5), 8);
        assert_eq!(pays(5, 6), 8);
        assert_eq!(pays(6, 6), 10);
    }

    #[test]
    fn test_exact_mode_extracts_target() {
        let g = game();
        for backend in [BackendKind::Rigid, BackendKind::Planar] {
            for a in 1..=6 {
                let target = Outcome::Dice { faces: [a, 7 - a] };
                let (world, _) = run_play(&g, &target, backend, LaunchMode::Exact, 0);
                assert_eq!(g.extract(world.bodies()), target);
                assert!(world.tick() <= 2);
            }
        }
    }

    #[test]
    fn test_thrown_dice_land_on_target() {
        let g = game();
        for backend in [BackendKind::Rigid, BackendKind::Planar] {
            let mut hits = 0;
            let trials = 20;
            for seed in 0..trials {
                let a = (seed % 6) as u8 + 1;
                let b = ((seed * 5 + 2) % 6) as u8 + 1;
                let target = Outcome::Dice { faces: [a, b] };
                let (world, events) = run_play(&g, &target, backend, LaunchMode::Randomized, seed);
                assert!(!world.timed_out(), "{backend} seed {seed} timed out");
                assert!(events.iter().any(|e| e.name() == "collision"));
                if g.extract(world.bodies()) == target {
                    hits += 1;
                }
            }
            assert!(hits * 100 >= trials * 95, "{backend}: only {hits}/{trials} converged");
        }
    }

    #[test]
    fn test_snap_turns_wrong_face_up() {
        let g = game();
        let mut bodies = vec![g.resting_body(0, 2, 0.4), g.resting_body(1, 5, 0.0)];
        let target = Outcome::Dice { faces: [6, 5] };
        g.snap(&target, &mut bodies);
        assert_eq!(g.extract(&bodies), target);
        assert!((bodies[0].position.y - 0.5).abs() < 1e-4);
        assert_eq!(bodies[1].orientation, resting_orientation(5, 0.0));
    }
}
