//! Math types for PetalSonic Router

pub use glam::{Quat, Vec3};

/// World-space transform of a scene entity as reported by the scene graph.
///
/// The local frame follows the audio convention used throughout the router:
/// +Z is forward, +Y is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation,
        }
    }

    /// Local +Z rotated into world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local +Y rotated into world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up())
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }

    /// Rotate so that `forward()` points at `target`. No-op when the target
    /// coincides with the current position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(forward) = (target - self.position).try_normalize() else {
            return;
        };
        self.rotation = Quat::from_rotation_arc(Vec3::Z, forward);
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Per-tick kinematic state of an active listener or emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialPose {
    pub position: Vec3,
    /// Finite-difference velocity in world units per second.
    pub velocity: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl SpatialPose {
    /// A motionless pose at `pose`.
    pub fn at_rest(pose: &Pose) -> Self {
        Self {
            position: pose.position,
            velocity: Vec3::ZERO,
            forward: pose.forward(),
            up: pose.up(),
        }
    }

    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up)
    }
}
