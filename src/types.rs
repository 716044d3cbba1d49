//! Core types shared by the arena simulation.
//!
//! Defines agent identity, episode roles, rigid-body state and the small
//! amount of planar geometry the reward and observation code relies on.

use std::fmt;

use glam::{Quat, Vec3};

/// Stable, orderable identity of an agent within one arena.
///
/// Ordering is used for tie-breaking: the lower id is processed first in a
/// tick and is the default spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub u8);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{}", self.0)
    }
}

/// Episode role. Mutually exclusive; `None` only before the first assignment
/// and in the goal-seeking variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Tagger,
    Runner,
    #[default]
    None,
}

impl Role {
    /// The role the other agent must hold.
    pub fn complement(&self) -> Role {
        match self {
            Role::Tagger => Role::Runner,
            Role::Runner => Role::Tagger,
            Role::None => Role::None,
        }
    }

    /// Observation encoding of the role flag.
    pub fn indicator(&self) -> f32 {
        match self {
            Role::Tagger => 1.0,
            Role::Runner | Role::None => 0.0,
        }
    }

    /// Sign applied to the potential shaping term.
    ///
    /// Taggers gain from closing distance, runners from opening it.
    pub fn pursuit_sign(&self) -> f32 {
        match self {
            Role::Tagger | Role::None => 1.0,
            Role::Runner => -1.0,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tagger => write!(f, "tagger"),
            Role::Runner => write!(f, "runner"),
            Role::None => write!(f, "none"),
        }
    }
}

/// Position and yaw-only orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` facing along yaw `degrees` about +Y.
    pub fn with_yaw(position: Vec3, degrees: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(degrees.to_radians()),
        }
    }

    /// Pose at `position` facing `target` in the horizontal plane.
    pub fn facing(position: Vec3, target: Vec3) -> Self {
        let dir = horizontal(target - position);
        if dir.length_squared() < 1e-12 {
            return Self::new(position, Quat::IDENTITY);
        }
        // Forward is +Z, so yaw = atan2(x, z).
        let yaw = dir.x.atan2(dir.z);
        Self::new(position, Quat::from_rotation_y(yaw))
    }

    /// Unit forward axis (+Z rotated by the pose).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Rigid-body state owned by the simulation and advanced by a
/// [`PhysicsWorld`](crate::physics::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pose: Pose,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Collision radius (bodies are treated as spheres for contacts).
    pub radius: f32,
    pub mass: f32,
}

impl Body {
    pub fn new(pose: Pose, radius: f32, mass: f32) -> Self {
        Self {
            pose,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            radius,
            mass,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    /// Zeroes linear and angular velocity.
    pub fn halt(&mut self) {
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }
}

/// Projection of `v` onto the XZ plane.
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Clamps the horizontal projection of `velocity` to `max_speed`, leaving
/// the vertical component untouched.
pub fn clamp_horizontal(velocity: Vec3, max_speed: f32) -> Vec3 {
    let h = horizontal(velocity);
    let speed = h.length();
    if speed <= max_speed || speed == 0.0 {
        return velocity;
    }
    let clamped = h * (max_speed / speed);
    Vec3::new(clamped.x, velocity.y, clamped.z)
}
