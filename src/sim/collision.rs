//! Collision detection and response for boards and tables
//!
//! Shapes are reduced to what the mini-games need: half-space boundaries
//! (felt, table walls, bin floors), circular pegs in the board plane and
//! bounding spheres between bodies.

use glam::{Vec2, Vec3};

/// Contacts this close count as touching
pub const CONTACT_SLOP: f32 = 1e-3;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Collision point (if hit)
    pub point: Vec3,
    /// Surface normal at collision (pointing toward the body, for reflection)
    pub normal: Vec3,
    /// Penetration depth (for position correction, may be slightly negative within the slop)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a body against a half-space boundary
///
/// The allowed side is `p · normal >= offset`; `extent` is the body's half
/// extent along the normal.
pub fn boundary_collision(position: Vec3, extent: f32, normal: Vec3, offset: f32) -> CollisionResult {
    let penetration = offset - (position.dot(normal) - extent);
    if penetration > -CONTACT_SLOP {
        CollisionResult {
            hit: true,
            point: position - normal * extent,
            normal,
            penetration,
        }
    } else {
        CollisionResult::miss()
    }
}

/// Check a ball against a peg (a circle in the XY board plane)
pub fn ball_peg_collision(center: Vec3, radius: f32, peg: Vec2, peg_radius: f32) -> CollisionResult {
    let offset = center.truncate() - peg;
    let dist = offset.length();
    let reach = radius + peg_radius;
    if dist >= reach {
        return CollisionResult::miss();
    }
    // Dead center: push straight up
    let normal = if dist > 1e-6 { offset / dist } else { Vec2::Y };
    CollisionResult {
        hit: true,
        point: (peg + normal * peg_radius).extend(center.z),
        normal: normal.extend(0.0),
        penetration: reach - dist,
    }
}

/// Check two bounding spheres; the normal points from `b` toward `a`
pub fn sphere_sphere_collision(a: Vec3, ra: f32, b: Vec3, rb: f32) -> CollisionResult {
    let offset = a - b;
    let dist = offset.length();
    let reach = ra + rb;
    if dist >= reach {
        return CollisionResult::miss();
    }
    let normal = if dist > 1e-6 { offset / dist } else { Vec3::X };
    CollisionResult {
        hit: true,
        point: b + normal * rb,
        normal,
        penetration: reach - dist,
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce off a surface with restitution
///
/// Returns the new velocity and the normal impulse (per unit mass) applied.
/// Separating velocities are left untouched.
pub fn bounce_velocity(velocity: Vec3, normal: Vec3, restitution: f32) -> (Vec3, f32) {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return (velocity, 0.0);
    }
    let impulse = -(1.0 + restitution) * vn;
    (velocity + normal * impulse, impulse)
}

/// Coulomb friction: tangential speed drops by at most `mu` times the normal impulse
pub fn apply_coulomb_friction(velocity: Vec3, normal: Vec3, normal_impulse: f32, mu: f32) -> Vec3 {
    let tangential = velocity - velocity.dot(normal) * normal;
    let speed = tangential.length();
    if speed <= f32::EPSILON || normal_impulse <= 0.0 || mu <= 0.0 {
        return velocity;
    }
    let drop = (mu * normal_impulse).min(speed);
    velocity - tangential * (drop / speed)
}
