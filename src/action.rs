//! Action decoding and actuation.
//!
//! Turns a policy's action record into velocity and orientation changes on the
//! agent body, then enforces the horizontal speed ceiling.

use glam::{Quat, Vec3};

use crate::config::{MotionConfig, MovementScheme};
use crate::error::ArenaError;
use crate::types::{clamp_horizontal, Body};

/// One agent's action for one tick.
///
/// Channel meaning depends on the [`MovementScheme`]:
/// forward/turn uses `primary` as forward input and `secondary` as turn
/// input; planar uses them as world X and Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActionRecord {
    pub primary: f32,
    pub secondary: f32,
    pub jump: bool,
}

impl ActionRecord {
    pub fn new(primary: f32, secondary: f32, jump: bool) -> Self {
        Self {
            primary,
            secondary,
            jump,
        }
    }

    /// No input.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Builds a record from 2 or 3 raw channels; the optional third channel is
    /// the jump trigger (pressed above 0.5).
    pub fn from_slice(channels: &[f32]) -> Result<Self, ArenaError> {
        match *channels {
            [primary, secondary] => Ok(Self::new(primary, secondary, false)),
            [primary, secondary, jump] => Ok(Self::new(primary, secondary, jump > 0.5)),
            _ => Err(ArenaError::ActionWidth(channels.len())),
        }
    }

    /// Replaces non-finite channels with 0 and clamps the rest to [-1, 1].
    ///
    /// Returns the cleaned record and whether anything had to change.
    pub fn sanitized(&self) -> (Self, bool) {
        let clean = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        let out = Self::new(clean(self.primary), clean(self.secondary), self.jump);
        let changed = out.primary != self.primary || out.secondary != self.secondary;
        (out, changed)
    }
}

/// Applies action records to agent bodies.
pub struct ActionDecoder;

impl ActionDecoder {
    /// Applies `action` to `body` for one tick of length `dt`.
    ///
    /// The jump only fires when `grounded` holds. Returns whether it fired.
    pub fn apply(
        action: &ActionRecord,
        body: &mut Body,
        grounded: bool,
        config: &MotionConfig,
        dt: f32,
    ) -> bool {
        let (action, changed) = action.sanitized();
        if changed {
            tracing::warn!(
                primary = action.primary,
                secondary = action.secondary,
                "action channels out of range, sanitized"
            );
        }

        match config.scheme {
            MovementScheme::ForwardTurn => {
                let yaw = (action.secondary * config.rotation_speed * dt).to_radians();
                body.pose.rotation = (Quat::from_rotation_y(yaw) * body.pose.rotation).normalize();
                let forward = body.pose.forward();
                body.linear_velocity += forward * action.primary * config.move_acceleration * dt;
            }
            MovementScheme::Planar => {
                let force = Vec3::new(action.primary, 0.0, action.secondary) * config.move_force;
                body.linear_velocity += force / body.mass * dt;
            }
        }

        let jumped = action.jump && grounded;
        if jumped {
            body.linear_velocity.y = config.jump_speed;
        }

        body.linear_velocity = clamp_horizontal(body.linear_velocity, config.move_speed);
        jumped
    }
}
