//! Physics world adapter
//!
//! Owns the backend for one mini-game instance, runs the rest detector on
//! every body each tick and enforces the tick ceiling.

use rand_pcg::Pcg32;

use super::backend::{Arena, BackendKind, Contact, PhysicsBackend, create_backend};
use super::body::SimulationBody;

/// A body that settled during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledBody {
    pub body: usize,
    pub tick: u64,
    /// Settled by the tick ceiling
    pub forced: bool,
}

/// Everything that happened during one fixed step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldStep {
    pub contacts: Vec<Contact>,
    pub settled: Vec<SettledBody>,
    /// The tick ceiling was hit on this step
    pub timed_out: bool,
}

pub struct PhysicsWorld {
    backend: Box<dyn PhysicsBackend>,
    tick: u64,
    tick_ceiling: u64,
    timed_out: bool,
}

impl PhysicsWorld {
    pub fn new(kind: BackendKind, tick_ceiling: u64) -> Self {
        Self::with_backend(create_backend(kind), tick_ceiling)
    }

    pub fn with_backend(backend: Box<dyn PhysicsBackend>, tick_ceiling: u64) -> Self {
        Self {
            backend,
            tick: 0,
            tick_ceiling: tick_ceiling.max(1),
            timed_out: false,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Reset for a new play
    pub fn load(&mut self, arena: Arena, bodies: Vec<SimulationBody>) {
        self.backend.load(arena, bodies);
        self.tick = 0;
        self.timed_out = false;
    }

    pub fn clear(&mut self) {
        self.backend.clear();
        self.tick = 0;
        self.timed_out = false;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tick_ceiling(&self) -> u64 {
        self.tick_ceiling
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn bodies(&self) -> &[SimulationBody] {
        self.backend.bodies()
    }

    pub fn bodies_mut(&mut self) -> &mut [SimulationBody] {
        self.backend.bodies_mut()
    }

    pub fn all_settled(&self) -> bool {
        self.backend.bodies().iter().all(|b| b.is_settled())
    }

    /// Advance one fixed step
    pub fn step(&mut self, dt: f32, rng: &mut Pcg32) -> WorldStep {
        if self.all_settled() {
            return WorldStep::default();
        }
        let report = self.backend.step(dt, rng);
        self.tick += 1;
        let tick = self.tick;

        let mut settled = Vec::new();
        for body in self.backend.bodies_mut() {
            if body.is_settled() {
                continue;
            }
            let (linear, angular) = body.speeds();
            let supported = body.in_contact;
            if body
                .detector
                .observe(&mut body.rest, linear, angular, supported, tick)
            {
                body.freeze();
                settled.push(SettledBody {
                    body: body.id,
                    tick,
                    forced: false,
                });
            }
        }

        let mut timed_out = false;
        if tick >= self.tick_ceiling && !self.all_settled() {
            log::warn!(
                "Simulation timeout after {} ticks; force-settling remaining bodies",
                tick
            );
            for body in self.backend.bodies_mut() {
                if body.settle(tick, true) {
                    settled.push(SettledBody {
                        body: body.id,
                        tick,
                        forced: true,
                    });
                }
            }
            timed_out = true;
            self.timed_out = true;
        }

        WorldStep {
            contacts: report.contacts,
            settled,
            timed_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::body::{BodyShape, Rotor};
    use glam::{Quat, Vec3};
    use rand::SeedableRng;

    fn ball(id: usize, y: f32) -> SimulationBody {
        SimulationBody::new(id, BodyShape::Sphere { radius: 0.2 }, Vec3::new(0.0, y, 0.0), Quat::IDENTITY)
    }

    #[test]
    fn test_settles_naturally() {
        for kind in [BackendKind::Rigid, BackendKind::Planar] {
            let mut world = PhysicsWorld::new(kind, 1800);
            world.load(Arena::table(5.0), vec![ball(0, 1.0)]);
            let mut rng = Pcg32::seed_from_u64(9);
            let mut settled = Vec::new();
            while !world.all_settled() {
                settled.extend(world.step(SIM_DT, &mut rng).settled);
            }
            assert_eq!(settled.len(), 1);
            assert!(!settled[0].forced);
            assert!(!world.timed_out());
        }
    }

    #[test]
    fn test_tick_ceiling_forces_settlement() {
        // A rotor that would coast for minutes
        let mut rotor = Rotor::new(Vec3::Z, 0.0, 0.01);
        rotor.omega = 50.0;
        let body = SimulationBody::rotor(0, BodyShape::Sphere { radius: 1.0 }, Vec3::ZERO, rotor);
        let mut world = PhysicsWorld::new(BackendKind::Rigid, 120);
        world.load(Arena::open(), vec![body, ball(1, 30.0)]);
        let mut rng = Pcg32::seed_from_u64(9);

        let mut last = WorldStep::default();
        for _ in 0..120 {
            last = world.step(SIM_DT, &mut rng);
        }
        assert!(last.timed_out);
        assert_eq!(last.settled.len(), 2);
        assert!(last.settled.iter().all(|s| s.forced && s.tick == 120));
        assert!(world.all_settled());

        // Nothing moves once everything is frozen
        let frozen = world.bodies()[1].position;
        let after = world.step(SIM_DT, &mut rng);
        assert!(after.settled.is_empty());
        assert_eq!(world.bodies()[1].position, frozen);
        assert_eq!(world.tick(), 120);
    }

    #[test]
    fn test_load_resets_tick() {
        let mut world = PhysicsWorld::new(BackendKind::Planar, 1800);
        world.load(Arena::table(5.0), vec![ball(0, 1.0)]);
        let mut rng = Pcg32::seed_from_u64(9);
        world.step(SIM_DT, &mut rng);
        assert_eq!(world.tick(), 1);
        world.load(Arena::table(5.0), vec![ball(0, 1.0)]);
        assert_eq!(world.tick(), 0);
    }
}
