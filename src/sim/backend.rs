//! Physics backend contract
//!
//! The rigid-body backend and the simplified 2D fallback implement the same
//! trait. Session logic only ever talks to `dyn PhysicsBackend`.

use std::fmt;

use glam::{Vec2, Vec3};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::SimulationBody;
use super::planar::PlanarBackend;
use super::rigid::RigidBackend;
use crate::consts::GRAVITY;

/// Normal approach speed below which a contact rests instead of bouncing
pub const RESTING_SPEED: f32 = 0.5;

/// Which backend drives a mini-game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// 3D rigid-body mechanics
    Rigid,
    /// Explicit-Euler 2D fallback
    Planar,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Rigid => "rigid",
            BackendKind::Planar => "planar",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rigid" | "3d" => Some(BackendKind::Rigid),
            "planar" | "2d" => Some(BackendKind::Planar),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a body touched during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Floor,
    Wall,
    Peg,
    Body,
    /// A rotor detent passing its pointer
    Detent,
}

/// An impact worth telling collaborators about
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub body: usize,
    pub surface: Surface,
    /// Normal approach speed (angular speed for detents)
    pub impact: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub contacts: Vec<Contact>,
}

/// Static geometry of one play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub gravity: f32,
    pub floor_y: f32,
    /// Walls at ±x
    pub half_width: f32,
    /// Walls at ±z (None: open front and back)
    pub half_depth: Option<f32>,
    /// Peg centers in the XY board plane
    pub pegs: Vec<Vec2>,
    pub peg_radius: f32,
    /// Crossing below this line drops a body into a bin
    pub capture_y: Option<f32>,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            floor_y: 0.0,
            half_width: 5.0,
            half_depth: Some(5.0),
            pegs: Vec::new(),
            peg_radius: 0.0,
            capture_y: None,
        }
    }
}

impl Arena {
    /// Square walled table with its felt at y = 0
    pub fn table(half_size: f32) -> Self {
        Self {
            half_width: half_size,
            half_depth: Some(half_size),
            ..Self::default()
        }
    }

    /// No static geometry (rotor games)
    pub fn open() -> Self {
        Self {
            half_width: f32::INFINITY,
            half_depth: None,
            floor_y: f32::NEG_INFINITY,
            ..Self::default()
        }
    }

    /// Half-space boundaries as (inward normal, offset, surface)
    pub fn boundaries(&self) -> Vec<(Vec3, f32, Surface)> {
        let mut out = Vec::with_capacity(5);
        if self.floor_y.is_finite() {
            out.push((Vec3::Y, self.floor_y, Surface::Floor));
        }
        if self.half_width.is_finite() {
            out.push((Vec3::X, -self.half_width, Surface::Wall));
            out.push((Vec3::NEG_X, -self.half_width, Surface::Wall));
        }
        if let Some(depth) = self.half_depth.filter(|d| d.is_finite()) {
            out.push((Vec3::Z, -depth, Surface::Wall));
            out.push((Vec3::NEG_Z, -depth, Surface::Wall));
        }
        out
    }
}

/// One physics implementation
pub trait PhysicsBackend {
    fn kind(&self) -> BackendKind;

    /// Replace the arena and bodies for a new play
    fn load(&mut self, arena: Arena, bodies: Vec<SimulationBody>);

    /// Advance every unsettled body by `dt`
    fn step(&mut self, dt: f32, rng: &mut Pcg32) -> StepReport;

    fn bodies(&self) -> &[SimulationBody];

    fn bodies_mut(&mut self) -> &mut [SimulationBody];

    fn clear(&mut self);
}

/// Build the backend the capability gate picked
pub fn create_backend(kind: BackendKind) -> Box<dyn PhysicsBackend> {
    match kind {
        BackendKind::Rigid => Box::new(RigidBackend::new()),
        BackendKind::Planar => Box::new(PlanarBackend::new()),
    }
}

/// Step every rotor body; shared by both backends
pub(crate) fn step_rotors(bodies: &mut [SimulationBody], dt: f32, contacts: &mut Vec<Contact>) {
    for body in bodies.iter_mut().filter(|b| b.is_rotor() && !b.is_settled()) {
        if body.advance_rotor(dt) > 0 {
            contacts.push(Contact {
                body: body.id,
                surface: Surface::Detent,
                impact: body.angular_velocity.length(),
            });
        }
    }
}

/// Push overlapping bounding spheres apart; settled bodies never move
pub(crate) fn separate_bodies(bodies: &mut [SimulationBody], contacts: &mut Vec<Contact>) {
    use super::collision::sphere_sphere_collision;

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (head, tail) = bodies.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if a.is_rotor() || b.is_rotor() || (a.is_settled() && b.is_settled()) {
                continue;
            }
            let hit = sphere_sphere_collision(
                a.position,
                a.shape.bounding_radius(),
                b.position,
                b.shape.bounding_radius(),
            );
            if !hit.hit {
                continue;
            }
            let share = match (a.is_settled(), b.is_settled()) {
                (false, false) => (0.5, 0.5),
                (true, false) => (0.0, 1.0),
                _ => (1.0, 0.0),
            };
            // Horizontal only, so nothing is pushed through the felt
            let push = Vec3::new(hit.normal.x, 0.0, hit.normal.z) * hit.penetration;
            a.position += push * share.0;
            b.position -= push * share.1;

            let approach = (b.linear_velocity - a.linear_velocity).dot(hit.normal);
            if approach >= RESTING_SPEED {
                contacts.push(Contact {
                    body: a.id,
                    surface: Surface::Body,
                    impact: approach,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_names() {
        assert_eq!(BackendKind::from_str("3D"), Some(BackendKind::Rigid));
        assert_eq!(BackendKind::from_str("planar"), Some(BackendKind::Planar));
        assert_eq!(BackendKind::Planar.to_string(), "planar");
    }

    #[test]
    fn test_table_boundaries() {
        let table = Arena::table(5.0);
        assert_eq!(table.boundaries().len(), 5);
        assert!(Arena::open().boundaries().is_empty());

        let board = Arena {
            half_depth: None,
            ..Arena::table(3.6)
        };
        assert_eq!(board.boundaries().len(), 3);
    }

    #[test]
    fn test_create_backend_kind() {
        assert_eq!(create_backend(BackendKind::Rigid).kind(), BackendKind::Rigid);
        assert_eq!(create_backend(BackendKind::Planar).kind(), BackendKind::Planar);
    }
}
