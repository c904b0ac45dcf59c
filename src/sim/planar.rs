//! Simplified 2D backend
//!
//! Explicit Euler in the XY board plane: `pos += vel·dt`, `vel.y -= g·dt`,
//! `vel *= 1 - drag`. Circular contacts reflect about the contact normal with
//! restitution; peg bounces get a small random lateral kick so balls never
//! lock into a repeating bounce. Speed is clamped per body.

use glam::Vec3;
use rand_pcg::Pcg32;

use super::backend::{
    Arena, BackendKind, Contact, PhysicsBackend, RESTING_SPEED, StepReport, Surface,
    separate_bodies, step_rotors,
};
use super::body::{Motion, SimulationBody, jitter};
use super::collision::{
    CollisionResult, apply_coulomb_friction, ball_peg_collision, boundary_collision,
};

#[derive(Debug, Default)]
pub struct PlanarBackend {
    arena: Arena,
    bodies: Vec<SimulationBody>,
}

impl PlanarBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn integrate(
        body: &mut SimulationBody,
        arena: &Arena,
        dt: f32,
        rng: &mut Pcg32,
        contacts: &mut Vec<Contact>,
    ) {
        body.position += body.linear_velocity * dt;
        body.linear_velocity.y -= arena.gravity * dt;
        body.linear_velocity *= (1.0 - body.material.drag).max(0.0);
        body.advance_attitude(dt);

        if let Some(capture_y) = arena.capture_y {
            if body.motion == Motion::Free && body.position.y < capture_y {
                body.motion = Motion::Captured;
            }
        }
        if body.motion == Motion::Captured {
            body.linear_velocity.x = 0.0;
        }

        let mut supported = false;
        for (normal, offset, surface) in arena.boundaries() {
            // Depth walls do not exist in the board plane
            if normal.z != 0.0 {
                continue;
            }
            let extent = body.shape.extent_along(body.orientation, normal);
            let hit = boundary_collision(body.position, extent, normal, offset);
            supported |= Self::reflect(body, &hit, surface, rng, contacts);
        }
        let radius = body.shape.bounding_radius();
        for peg in &arena.pegs {
            let hit = ball_peg_collision(body.position, radius, *peg, arena.peg_radius);
            supported |= Self::reflect(body, &hit, Surface::Peg, rng, contacts);
        }
        body.in_contact = supported;

        let max_speed = body.material.max_speed;
        if max_speed > 0.0 && body.linear_velocity.length() > max_speed {
            body.linear_velocity = body.linear_velocity.normalize() * max_speed;
        }
        body.position.z = 0.0;
        body.linear_velocity.z = 0.0;
    }

    fn reflect(
        body: &mut SimulationBody,
        hit: &CollisionResult,
        surface: Surface,
        rng: &mut Pcg32,
        contacts: &mut Vec<Contact>,
    ) -> bool {
        if !hit.hit {
            return false;
        }
        body.position += hit.normal * hit.penetration.max(0.0);

        let vn = body.linear_velocity.dot(hit.normal);
        if vn < 0.0 {
            let approach = -vn;
            if approach < RESTING_SPEED || body.motion == Motion::Captured {
                let friction = if body.shape.rolls() {
                    0.0
                } else {
                    body.material.friction
                };
                let stopped = body.linear_velocity - vn * hit.normal;
                body.linear_velocity =
                    apply_coulomb_friction(stopped, hit.normal, approach, friction);
            } else {
                let e = body.material.restitution;
                body.linear_velocity -= (1.0 + e) * vn * hit.normal;
                if surface == Surface::Peg {
                    body.linear_velocity.x += jitter(rng, body.material.bounce_jitter);
                }
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

impl PhysicsBackend for PlanarBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Planar
    }

    fn load(&mut self, arena: Arena, mut bodies: Vec<SimulationBody>) {
        for body in &mut bodies {
            if !body.is_rotor() {
                body.position.z = 0.0;
                body.linear_velocity.z = 0.0;
            }
        }
        self.arena = arena;
        self.bodies = bodies;
    }

    fn step(&mut self, dt: f32, rng: &mut Pcg32) -> StepReport {
        let mut contacts = Vec::new();
        for body in self
            .bodies
            .iter_mut()
            .filter(|b| !b.is_settled() && !b.is_rotor())
        {
            Self::integrate(body, &self.arena, dt, rng, &mut contacts);
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
