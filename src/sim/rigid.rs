//! Rigid-body (3D) backend
//!
//! Semi-implicit Euler with restitution and Coulomb friction impulses,
//! exponentially damped free spin and exact rotor coasting. Contacts act on
//! linear velocity; orientation follows the body's attitude model.
//!
//! Contacts never apply torque. The face a die or coin rests on comes from
//! its launch spin and the alignment lock near rest, so a bounce cannot
//! change it.

use glam::Vec3;
use rand_pcg::Pcg32;

use super::backend::{
    Arena, BackendKind, Contact, PhysicsBackend, RESTING_SPEED, StepReport, Surface,
    separate_bodies, step_rotors,
};
use super::body::{Motion, SimulationBody};
use super::collision::{
    CollisionResult, apply_coulomb_friction, ball_peg_collision, boundary_collision,
    bounce_velocity,
};

#[derive(Debug, Default)]
pub struct RigidBackend {
    arena: Arena,
    bodies: Vec<SimulationBody>,
}

impl RigidBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn integrate(body: &mut SimulationBody, arena: &Arena, dt: f32, contacts: &mut Vec<Contact>) {
        body.linear_velocity.y -= arena.gravity * dt;
        body.position += body.linear_velocity * dt;
        body.advance_attitude(dt);

        if let Some(capture_y) = arena.capture_y {
            if body.motion == Motion::Free && body.position.y < capture_y {
                body.motion = Motion::Captured;
                log::debug!("body {} captured at x={:.3}", body.id, body.position.x);
            }
        }
        if body.motion == Motion::Captured {
            body.linear_velocity.x = 0.0;
            body.linear_velocity.z = 0.0;
        }

        let mut supported = false;
        for (normal, offset, surface) in arena.boundaries() {
            let extent = body.shape.extent_along(body.orientation, normal);
            let hit = boundary_collision(body.position, extent, normal, offset);
            supported |= Self::resolve(body, &hit, surface, contacts);
        }
        let radius = body.shape.bounding_radius();
        for peg in &arena.pegs {
            let hit = ball_peg_collision(body.position, radius, *peg, arena.peg_radius);
            supported |= Self::resolve(body, &hit, Surface::Peg, contacts);
        }
        body.in_contact = supported;
    }

    /// Positional correction plus impulse; returns true when resting on the floor
    fn resolve(
        body: &mut SimulationBody,
        hit: &CollisionResult,
        surface: Surface,
        contacts: &mut Vec<Contact>,
    ) -> bool {
        if !hit.hit {
            return false;
        }
        body.position += hit.normal * hit.penetration.max(0.0);

        let approach = -body.linear_velocity.dot(hit.normal);
        if approach > 0.0 {
            let resting = approach < RESTING_SPEED || body.motion == Motion::Captured;
            let restitution = if resting { 0.0 } else { body.material.restitution };
            // Balls roll rather than stick in resting contact
            let friction = if resting && body.shape.rolls() {
                0.0
            } else {
                body.material.friction
            };
            let (bounced, impulse) = bounce_velocity(body.linear_velocity, hit.normal, restitution);
            body.linear_velocity = apply_coulomb_friction(bounced, hit.normal, impulse, friction);
            if !resting {
                contacts.push(Contact {
                    body: body.id,
                    surface,
                    impact: approach,
                });
            }
        }
        surface == Surface::Floor
    }
}

impl PhysicsBackend for RigidBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Rigid
    }

    fn load(&mut self, arena: Arena, bodies: Vec<SimulationBody>) {
        self.arena = arena;
        self.bodies = bodies;
    }

    fn step(&mut self, dt: f32, _rng: &mut Pcg32) -> StepReport {
        let mut contacts = Vec::new();
        for body in self
            .bodies
            .iter_mut()
            .filter(|b| !b.is_settled() && !b.is_rotor())
        {
            Self::integrate(body, &self.arena, dt, &mut contacts);
        }
        separate_bodies(&mut self.bodies, &mut contacts);
        step_rotors(&mut self.bodies, dt, &mut contacts);
        StepReport { contacts }
    }

    fn bodies(&self) -> &[SimulationBody] {
        &self.bodies
    }

    fn bodies_mut(&mut self) -> &mut [SimulationBody] {
        &mut self.bodies
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.arena = Arena::default();
    }
}
