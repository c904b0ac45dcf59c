//! Deterministic simulation module
//!
//! Bodies, rest detection and the two interchangeable physics backends.
//! This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body index)
//! - No rendering or platform dependencies

pub mod backend;
pub mod body;
pub mod collision;
pub mod planar;
pub mod rigid;
pub mod world;

pub use backend::{
    Arena, BackendKind, Contact, PhysicsBackend, StepReport, Surface, create_backend,
};
pub use body::{
    BodyShape, Material, Motion, RestDetector, RestState, Rotor, SimulationBody, flat_orientation,
    jitter, upmost_normal,
};
pub use collision::{CollisionResult, reflect_velocity};
pub use planar::PlanarBackend;
pub use rigid::RigidBackend;
pub use world::{PhysicsWorld, SettledBody, WorldStep};
