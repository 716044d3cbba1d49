//! Scripted chase / flee / seek baseline.
//!
//! Reads only the observation vector, so it can stand in for a trained policy
//! on either variant.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use glam::Vec3;

use super::trait_::Policy;
use crate::action::ActionRecord;
use crate::config::{ArenaConfig, MovementScheme, Variant};
use crate::observation::ObservationLayout;

/// Fraction of the leash at which a runner stops fleeing and circles instead.
const LEASH_MARGIN: f32 = 0.7;

/// Steers taggers and goal seekers straight at their counterpart and runners
/// away from it.
///
/// Runners are pulled back toward the arena center as they near the edge and
/// strafe once the tagger is close to the leash distance, so they do not lose
/// by running out of bounds.
pub struct HeuristicPolicy {
    layout: ObservationLayout,
    variant: Variant,
    scheme: MovementScheme,
    /// Leash distance in observation units.
    leash: f32,
    /// Arena radius in observation units.
    reach: f32,
}

impl HeuristicPolicy {
    pub fn new(config: &ArenaConfig) -> Self {
        let scale = config.observation.position_scale;
        Self {
            layout: ObservationLayout::for_config(config),
            variant: config.variant,
            scheme: config.motion.scheme,
            leash: config.max_distance / scale,
            reach: config.arena_radius / scale,
        }
    }

    /// Horizontal unit direction the agent wants to move in.
    fn desired_direction(&self, obs: &[f32]) -> Option<Vec3> {
        if obs.len() != self.layout.dim() {
            return None;
        }
        let c = self.layout.counterpart();
        let rel = Vec3::new(obs[c], 0.0, obs[c + 2]);
        if rel.length_squared() < 1e-12 {
            return None;
        }

        let chasing = self.variant == Variant::Goal || obs[ObservationLayout::ROLE] > 0.5;
        if chasing {
            return Some(rel.normalize());
        }

        let distance = obs[c + 6];
        let evade = if distance > LEASH_MARGIN * self.leash {
            Vec3::new(-rel.z, 0.0, rel.x).normalize()
        } else {
            -rel.normalize()
        };
        let own = Vec3::new(
            obs[ObservationLayout::OWN_POSITION],
            0.0,
            obs[ObservationLayout::OWN_POSITION + 2],
        );
        let edge = (own.length() / self.reach).powi(2);
        Some((evade - own.normalize_or_zero() * edge).normalize_or_zero())
    }

    fn steer(&self, obs: &[f32], dir: Vec3) -> ActionRecord {
        match (self.scheme, self.layout.forward()) {
            (MovementScheme::ForwardTurn, Some(f)) => {
                let heading = obs[f].atan2(obs[f + 2]);
                let wanted = dir.x.atan2(dir.z);
                let diff = (wanted - heading + PI).rem_euclid(TAU) - PI;
                let turn = (diff / FRAC_PI_4).clamp(-1.0, 1.0);
                let thrust = if diff.abs() < FRAC_PI_2 { 1.0 } else { 0.2 };
                ActionRecord::new(thrust, turn, false)
            }
            _ => ActionRecord::new(dir.x, dir.z, false),
        }
    }
}

impl Policy for HeuristicPolicy {
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<ActionRecord> {
        observations
            .iter()
            .map(|obs| match self.desired_direction(obs) {
                Some(dir) => self.steer(obs, dir),
                None => ActionRecord::idle(),
            })
            .collect()
    }

    fn name(&self) -> &str {
        match self.variant {
            Variant::Tag => "chase_flee",
            Variant::Goal => "seek",
        }
    }
}
