//! Observation encoding.
//!
//! Builds the fixed-width feature vector an agent hands to its policy each
//! tick. Absent entities are zero-filled so the width never changes.

use glam::Vec3;

use crate::agent::AgentState;
use crate::config::{ArenaConfig, MovementScheme};
use crate::types::Body;

/// Relative position (3), relative velocity (3), distance (1).
pub const COUNTERPART_FEATURE_DIM: usize = 7;
/// Relative position (3), relative velocity (3).
pub const OBSTACLE_FEATURE_DIM: usize = 6;

/// Field offsets of the observation vector.
///
/// ```text
/// [role(1)] [own_pos(3)] [own_vel(3)] [forward(3)?]
/// [counterpart_rel_pos(3) counterpart_rel_vel(3) counterpart_dist(1)]
/// [obstacle_rel_pos(3) obstacle_rel_vel(3)] [grounded(1)] [time_left(1)?]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationLayout {
    /// Own forward vector, present when orientation drives movement.
    pub include_forward: bool,
    /// Normalized time remaining, present when episodes have a step limit.
    pub include_time: bool,
}

impl ObservationLayout {
    pub const ROLE: usize = 0;
    pub const OWN_POSITION: usize = 1;
    pub const OWN_VELOCITY: usize = 4;

    pub fn for_config(config: &ArenaConfig) -> Self {
        Self {
            include_forward: config.motion.scheme == MovementScheme::ForwardTurn,
            include_time: config.has_step_limit(),
        }
    }

    pub fn forward(&self) -> Option<usize> {
        self.include_forward.then_some(7)
    }

    /// Start of the opponent/target block.
    pub fn counterpart(&self) -> usize {
        if self.include_forward {
            10
        } else {
            7
        }
    }

    pub fn obstacle(&self) -> usize {
        self.counterpart() + COUNTERPART_FEATURE_DIM
    }

    pub fn grounded(&self) -> usize {
        self.obstacle() + OBSTACLE_FEATURE_DIM
    }

    pub fn time_remaining(&self) -> Option<usize> {
        self.include_time.then_some(self.grounded() + 1)
    }

    /// Total width.
    pub fn dim(&self) -> usize {
        self.grounded() + 1 + usize::from(self.include_time)
    }
}

/// Position and velocity of the entity an agent is measured against: the
/// opponent in the tag variant, the target in the goal variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counterpart {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Counterpart {
    pub fn of(agent: &AgentState) -> Self {
        Self {
            position: agent.position(),
            velocity: agent.velocity(),
        }
    }

    /// A static target.
    pub fn fixed(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
        }
    }
}

/// Builds observation vectors for agents.
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// Builds the observation for `agent`.
    ///
    /// Positions are taken relative to the arena center and divided by
    /// `position_scale`; velocities are divided by `velocity_scale`.
    pub fn build(
        agent: &AgentState,
        counterpart: Option<Counterpart>,
        obstacle: Option<&Body>,
        config: &ArenaConfig,
    ) -> Vec<f32> {
        let layout = ObservationLayout::for_config(config);
        let pos_scale = config.observation.position_scale;
        let vel_scale = config.observation.velocity_scale;
        let own_pos = agent.position();
        let own_vel = agent.velocity();

        let mut obs = Vec::with_capacity(layout.dim());
        obs.push(agent.role.indicator());
        obs.extend(((own_pos - config.arena_center) / pos_scale).to_array());
        obs.extend((own_vel / vel_scale).to_array());

        if layout.include_forward {
            obs.extend(agent.forward().to_array());
        }

        match counterpart {
            Some(other) => {
                let rel = other.position - own_pos;
                obs.extend((rel / pos_scale).to_array());
                obs.extend(((other.velocity - own_vel) / vel_scale).to_array());
                obs.push(rel.length() / pos_scale);
            }
            None => obs.extend([0.0; COUNTERPART_FEATURE_DIM]),
        }

        match obstacle {
            Some(body) => {
                obs.extend(((body.position() - own_pos) / pos_scale).to_array());
                obs.extend(((body.linear_velocity - own_vel) / vel_scale).to_array());
            }
            None => obs.extend([0.0; OBSTACLE_FEATURE_DIM]),
        }

        obs.push(if agent.grounded { 1.0 } else { 0.0 });

        if layout.include_time {
            let used = agent.step_count as f32 / config.max_steps as f32;
            obs.push((1.0 - used).clamp(0.0, 1.0));
        }

        debug_assert_eq!(obs.len(), layout.dim());
        obs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentId, Pose, Role};
    use glam::Quat;

    const EPS: f32 = 1e-6;

    fn agent_at(p: Vec3) -> AgentState {
        AgentState::new(AgentId(0), Pose::new(p, Quat::IDENTITY), 0.5, 1.0)
    }

    fn obstacle_at(p: Vec3) -> Body {
        Body::new(Pose::new(p, Quat::IDENTITY), 1.0, 100.0)
    }

    #[test]
    fn layout_dims_per_variant() {
        assert_eq!(ObservationLayout::for_config(&ArenaConfig::tag()).dim(), 25);
        assert_eq!(ObservationLayout::for_config(&ArenaConfig::goal()).dim(), 21);
        let limited_goal = ArenaConfig {
            max_steps: 1000,
            ..ArenaConfig::goal()
        };
        assert_eq!(ObservationLayout::for_config(&limited_goal).dim(), 22);
    }

    #[test]
    fn width_is_invariant_when_entities_are_absent() {
        for config in [ArenaConfig::tag(), ArenaConfig::goal()] {
            let agent = agent_at(Vec3::new(1.0, 0.5, 1.0));
            let other = Counterpart::fixed(Vec3::new(4.0, 0.5, 0.0));
            let obstacle = obstacle_at(Vec3::ZERO);
            let dim = ObservationLayout::for_config(&config).dim();
            let variants = [
                ObservationBuilder::build(&agent, Some(other), Some(&obstacle), &config),
                ObservationBuilder::build(&agent, None, Some(&obstacle), &config),
                ObservationBuilder::build(&agent, Some(other), None, &config),
                ObservationBuilder::build(&agent, None, None, &config),
            ];
            for obs in variants {
                assert_eq!(obs.len(), dim);
            }
        }
    }

    #[test]
    fn absent_entities_are_exact_zeros() {
        let config = ArenaConfig::tag();
        let layout = ObservationLayout::for_config(&config);
        let agent = agent_at(Vec3::new(3.0, 0.5, -2.0));
        let obs = ObservationBuilder::build(&agent, None, None, &config);
        let start = layout.counterpart();
        let end = layout.grounded();
        assert!(obs[start..end].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn counterpart_features_are_relative_and_normalized() {
        let config = ArenaConfig::tag();
        let layout = ObservationLayout::for_config(&config);
        let agent = agent_at(Vec3::new(0.0, 0.5, 0.0));
        let other = Counterpart {
            position: Vec3::new(6.0, 0.5, 8.0),
            velocity: Vec3::new(5.0, 0.0, 0.0),
        };
        let obs = ObservationBuilder::build(&agent, Some(other), None, &config);
        let c = layout.counterpart();
        let scale = config.observation.position_scale;
        assert!((obs[c] - 6.0 / scale).abs() < EPS);
        assert!((obs[c + 2] - 8.0 / scale).abs() < EPS);
        assert!((obs[c + 3] - 5.0 / config.observation.velocity_scale).abs() < EPS);
        assert!((obs[c + 6] - 10.0 / scale).abs() < EPS);
    }

    #[test]
    fn role_grounded_and_time_fields() {
        let config = ArenaConfig::tag();
        let layout = ObservationLayout::for_config(&config);
        let mut agent = agent_at(Vec3::ZERO);
        agent.role = Role::Tagger;
        agent.grounded = true;
        agent.step_count = config.max_steps / 4;
        let obs = ObservationBuilder::build(&agent, None, None, &config);
        assert_eq!(obs[ObservationLayout::ROLE], 1.0);
        assert_eq!(obs[layout.grounded()], 1.0);
        assert!((obs[layout.time_remaining().unwrap()] - 0.75).abs() < EPS);
        let f = layout.forward().unwrap();
        assert_eq!(&obs[f..f + 3], &[0.0, 0.0, 1.0]);

        agent.role = Role::Runner;
        let obs = ObservationBuilder::build(&agent, None, None, &config);
        assert_eq!(obs[ObservationLayout::ROLE], 0.0);
    }

    #[test]
    fn observation_is_deterministic() {
        let config = ArenaConfig::tag();
        let agent = agent_at(Vec3::new(1.0, 0.5, 2.0));
        let other = Some(Counterpart::fixed(Vec3::new(-3.0, 0.5, 4.0)));
        let obstacle = obstacle_at(Vec3::new(0.0, 1.0, 0.0));
        let a = ObservationBuilder::build(&agent, other, Some(&obstacle), &config);
        let b = ObservationBuilder::build(&agent, other, Some(&obstacle), &config);
        assert_eq!(a, b);
    }
}
