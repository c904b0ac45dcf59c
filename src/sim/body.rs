//! Simulation bodies, rest detection and attitude integration

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Below this remaining angle an aligning body is placed exactly on its face
const ALIGN_SNAP: f32 = 1e-3;

/// Collision shape of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    Cuboid { half_extents: Vec3 },
    /// Axis along local Y (coins, reel drums)
    Cylinder { radius: f32, half_height: f32 },
    Sphere { radius: f32 },
}

const CUBOID_FACES: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];
const CYLINDER_FACES: [Vec3; 2] = [Vec3::Y, Vec3::NEG_Y];

impl BodyShape {
    /// Half extent of the shape along a world direction
    pub fn extent_along(&self, orientation: Quat, dir: Vec3) -> f32 {
        match *self {
            BodyShape::Cuboid { half_extents: h } => {
                h.x * (orientation * Vec3::X).dot(dir).abs()
                    + h.y * (orientation * Vec3::Y).dot(dir).abs()
                    + h.z * (orientation * Vec3::Z).dot(dir).abs()
            }
            BodyShape::Cylinder {
                radius,
                half_height,
            } => {
                let c = (orientation * Vec3::Y).dot(dir).clamp(-1.0, 1.0);
                half_height * c.abs() + radius * (1.0 - c * c).max(0.0).sqrt()
            }
            BodyShape::Sphere { radius } => radius,
        }
    }

    /// Distance from the center down to the lowest point
    pub fn support_depth(&self, orientation: Quat) -> f32 {
        self.extent_along(orientation, Vec3::Y)
    }

    pub fn bounding_radius(&self) -> f32 {
        match *self {
            BodyShape::Cuboid { half_extents } => half_extents.length(),
            BodyShape::Cylinder {
                radius,
                half_height,
            } => (radius * radius + half_height * half_height).sqrt(),
            BodyShape::Sphere { radius } => radius,
        }
    }

    pub fn rolls(&self) -> bool {
        matches!(self, BodyShape::Sphere { .. })
    }

    /// Local normals of the faces the body can come to rest on
    pub fn rest_normals(&self) -> &'static [Vec3] {
        match self {
            BodyShape::Cuboid { .. } => &CUBOID_FACES,
            BodyShape::Cylinder { .. } => &CYLINDER_FACES,
            BodyShape::Sphere { .. } => &[],
        }
    }
}

/// Index of the local normal pointing most nearly world-up
pub fn upmost_normal(normals: &[Vec3], orientation: Quat) -> Option<usize> {
    normals
        .iter()
        .map(|n| (orientation * *n).y)
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

/// Smallest rotation of `orientation` that lays its upmost face flat
pub fn flat_orientation(normals: &[Vec3], orientation: Quat) -> Quat {
    match upmost_normal(normals, orientation) {
        Some(i) => {
            let world = (orientation * normals[i]).normalize();
            (Quat::from_rotation_arc(world, Vec3::Y) * orientation).normalize()
        }
        None => orientation,
    }
}

/// Surface response and damping of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    /// Coulomb coefficient
    pub friction: f32,
    /// Exponential angular damping (1/s)
    pub angular_damping: f32,
    /// Below this angular speed a grounded body is eased onto a face
    pub align_below: f32,
    pub align_rate: f32,
    /// Per-tick velocity friction (simplified backend)
    pub drag: f32,
    /// Max random lateral kick on peg bounces (simplified backend)
    pub bounce_jitter: f32,
    /// Speed clamp (simplified backend)
    pub max_speed: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            angular_damping: 0.0,
            align_below: 0.0,
            align_rate: 0.0,
            drag: 0.005,
            bounce_jitter: 0.0,
            max_speed: 25.0,
        }
    }
}

/// A body spinning on a fixed axle under constant deceleration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotor {
    pub axis: Vec3,
    /// Accumulated (unwrapped) rotation about the axis
    pub spin: f32,
    /// Angular speed, never negative
    pub omega: f32,
    pub deceleration: f32,
    /// Angular spacing of pointer detents
    pub detent: Option<f32>,
}

impl Rotor {
    pub fn new(axis: Vec3, spin: f32, deceleration: f32) -> Self {
        Self {
            axis: axis.normalize_or(Vec3::Z),
            spin,
            omega: 0.0,
            deceleration,
            detent: None,
        }
    }

    /// Initial speed that coasts exactly `rotation` radians before stopping
    pub fn launch_speed(rotation: f32, deceleration: f32) -> f32 {
        (2.0 * deceleration * rotation.max(0.0)).sqrt()
    }

    /// Rotation still to come at the current speed
    pub fn coast_distance(&self) -> f32 {
        if self.deceleration > 0.0 {
            self.omega * self.omega / (2.0 * self.deceleration)
        } else {
            f32::INFINITY
        }
    }

    /// Advance one step; returns the number of detents that passed
    ///
    /// Integration is exact for constant deceleration, so the total rotation
    /// from launch to stop is `omega² / 2a` regardless of the timestep.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.omega <= 0.0 {
            self.omega = 0.0;
            return 0;
        }
        let before = self.spin;
        let slow = self.deceleration * dt;
        if self.omega > slow {
            self.spin += (self.omega - 0.5 * slow) * dt;
            self.omega -= slow;
        } else {
            self.spin += self.coast_distance();
            self.omega = 0.0;
        }
        match self.detent {
            Some(step) if step > 0.0 => {
                ((self.spin / step).floor() - (before / step).floor()).max(0.0) as u32
            }
            _ => 0,
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_axis_angle(self.axis, self.spin)
    }
}

/// How a body moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Gravity, contacts and exponentially damped free spin
    Free,
    /// Grounded and easing onto a resting face
    Aligning { target: Quat },
    /// Dropped into a bin: lateral motion absorbed, no bounce
    Captured,
    /// Fixed axle, no gravity
    Rotor(Rotor),
}

/// Rest tracking for one body
///
/// The false to true transition is terminal within a play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestState {
    pub settled: bool,
    pub settle_tick: Option<u64>,
    /// Settled by the tick ceiling rather than naturally
    pub forced: bool,
}

impl RestState {
    /// Mark settled; returns false if it already was
    pub fn settle(&mut self, tick: u64, forced: bool) -> bool {
        if self.settled {
            return false;
        }
        self.settled = true;
        self.settle_tick = Some(tick);
        self.forced = forced;
        true
    }
}

/// Velocity-threshold rest check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestDetector {
    pub linear_epsilon: f32,
    pub angular_epsilon: f32,
}

impl Default for RestDetector {
    fn default() -> Self {
        Self {
            linear_epsilon: 0.05,
            angular_epsilon: 0.05,
        }
    }
}

impl RestDetector {
    pub fn new(linear_epsilon: f32, angular_epsilon: f32) -> Self {
        Self {
            linear_epsilon,
            angular_epsilon,
        }
    }

    pub fn is_at_rest(&self, linear_speed: f32, angular_speed: f32) -> bool {
        linear_speed < self.linear_epsilon && angular_speed < self.angular_epsilon
    }

    /// Feed one tick of speeds; returns true on the tick the body settles
    pub fn observe(
        &self,
        rest: &mut RestState,
        linear_speed: f32,
        angular_speed: f32,
        supported: bool,
        tick: u64,
    ) -> bool {
        if rest.settled || !supported || !self.is_at_rest(linear_speed, angular_speed) {
            return false;
        }
        rest.settle(tick, false)
    }
}

/// One physics-driven actor within a play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationBody {
    pub id: usize,
    pub shape: BodyShape,
    pub material: Material,
    pub motion: Motion,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Touching the floor after the last step (pegs and walls never support)
    pub in_contact: bool,
    pub rest: RestState,
    pub detector: RestDetector,
    /// Point a steered body is guided toward (the pachinko ball's slot)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aim: Option<Vec3>,
}

impl SimulationBody {
    pub fn new(id: usize, shape: BodyShape, position: Vec3, orientation: Quat) -> Self {
        Self {
            id,
            shape,
            material: Material::default(),
            motion: Motion::Free,
            position,
            orientation,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            in_contact: false,
            rest: RestState::default(),
            detector: RestDetector::default(),
            aim: None,
        }
    }

    /// A body on a fixed axle at `position`
    pub fn rotor(id: usize, shape: BodyShape, position: Vec3, rotor: Rotor) -> Self {
        let mut body = Self::new(id, shape, position, rotor.orientation());
        body.angular_velocity = rotor.axis * rotor.omega;
        body.motion = Motion::Rotor(rotor);
        body.in_contact = true;
        body
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_detector(mut self, detector: RestDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_aim(mut self, aim: Vec3) -> Self {
        self.aim = Some(aim);
        self
    }

    pub fn is_settled(&self) -> bool {
        self.rest.settled
    }

    pub fn is_rotor(&self) -> bool {
        matches!(self.motion, Motion::Rotor(_))
    }

    pub fn rotor_state(&self) -> Option<&Rotor> {
        match &self.motion {
            Motion::Rotor(rotor) => Some(rotor),
            _ => None,
        }
    }

    /// (linear, angular) speed fed to the rest detector
    pub fn speeds(&self) -> (f32, f32) {
        (
            self.linear_velocity.length(),
            self.angular_velocity.length(),
        )
    }

    /// Advance a rotor body; returns detents crossed
    pub fn advance_rotor(&mut self, dt: f32) -> u32 {
        let Motion::Rotor(rotor) = &mut self.motion else {
            return 0;
        };
        let crossed = rotor.advance(dt);
        self.orientation = rotor.orientation();
        self.angular_velocity = rotor.axis * rotor.omega;
        self.linear_velocity = Vec3::ZERO;
        self.in_contact = true;
        crossed
    }

    /// Integrate orientation for a free body
    ///
    /// Free spin keeps a fixed world axis and decays by `1 - k·dt` per step,
    /// so the rotation still to come is always `|ω| / k`. Once the body is
    /// grounded and slow enough, it locks onto the face that rotation would
    /// have left on top and eases there.
    pub fn advance_attitude(&mut self, dt: f32) {
        match self.motion {
            Motion::Free => {
                self.advance_free_spin(dt);
                self.try_begin_alignment();
            }
            Motion::Aligning { target } => self.advance_alignment(target, dt),
            Motion::Captured => self.angular_velocity = Vec3::ZERO,
            Motion::Rotor(_) => {}
        }
    }

    fn advance_free_spin(&mut self, dt: f32) {
        let w = self.angular_velocity.length();
        if w <= f32::EPSILON {
            self.angular_velocity = Vec3::ZERO;
            return;
        }
        let axis = self.angular_velocity / w;
        self.orientation = (Quat::from_axis_angle(axis, w * dt) * self.orientation).normalize();
        self.angular_velocity *= (1.0 - self.material.angular_damping * dt).max(0.0);
    }

    /// Orientation the free spin will coast to if left alone
    pub fn predicted_orientation(&self) -> Quat {
        let w = self.angular_velocity.length();
        let k = self.material.angular_damping;
        if w <= f32::EPSILON || k <= 0.0 {
            return self.orientation;
        }
        (Quat::from_axis_angle(self.angular_velocity / w, w / k) * self.orientation).normalize()
    }

    fn try_begin_alignment(&mut self) {
        let normals = self.shape.rest_normals();
        if !self.in_contact
            || normals.is_empty()
            || self.material.align_rate <= 0.0
            || self.angular_velocity.length() >= self.material.align_below
        {
            return;
        }
        let target = flat_orientation(normals, self.predicted_orientation());
        self.motion = Motion::Aligning { target };
        self.angular_velocity = Vec3::ZERO;
    }

    fn advance_alignment(&mut self, target: Quat, dt: f32) {
        if self.orientation.angle_between(target) < ALIGN_SNAP {
            self.orientation = target;
            self.angular_velocity = Vec3::ZERO;
            return;
        }
        let alpha = 1.0 - (-self.material.align_rate * dt).exp();
        let next = self.orientation.slerp(target, alpha).normalize();
        let mut delta = next * self.orientation.inverse();
        if delta.w < 0.0 {
            delta = -delta;
        }
        let (axis, angle) = delta.to_axis_angle();
        self.angular_velocity = if dt > 0.0 { axis * (angle / dt) } else { Vec3::ZERO };
        self.orientation = next;
    }

    /// Mark settled and freeze; returns false if it already was
    pub fn settle(&mut self, tick: u64, forced: bool) -> bool {
        if !self.rest.settle(tick, forced) {
            return false;
        }
        self.freeze();
        true
    }

    /// Stop all motion at the current transform
    pub fn freeze(&mut self) {
        if let Motion::Aligning { target } = self.motion {
            self.orientation = target;
        }
        if let Motion::Rotor(rotor) = &mut self.motion {
            rotor.omega = 0.0;
        }
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Overwrite the transform (terminal placement or force-snap)
    pub fn place(&mut self, position: Vec3, orientation: Quat) {
        self.position = position;
        self.orientation = orientation.normalize();
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        if let Motion::Aligning { .. } = self.motion {
            self.motion = Motion::Aligning {
                target: self.orientation,
            };
        }
    }

    /// Overwrite a rotor's spin angle, keeping orientation in step
    pub fn set_spin(&mut self, spin: f32) {
        if let Motion::Rotor(rotor) = &mut self.motion {
            rotor.spin = spin;
            rotor.omega = 0.0;
            self.orientation = rotor.orientation();
            self.angular_velocity = Vec3::ZERO;
        }
    }
}

/// Uniform draw in `[-amplitude, amplitude]` (zero for non-positive amplitude)
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        rng.random_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}
