//! Configuration for the arena simulation.
//!
//! Every reward constant and threshold is configurable. The defaults are the
//! tuned values of the pursuit and goal-seeking scenes; none of them is fixed.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which decision process the arena runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Variant {
    /// Two agents, one Tagger and one Runner.
    Tag,
    /// One agent seeking a static target.
    Goal,
}

/// How continuous action channels map to motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MovementScheme {
    /// Channel 0 accelerates along the forward axis, channel 1 turns.
    ForwardTurn,
    /// Channel 0 pushes along world X, channel 1 along world Z.
    Planar,
}

/// Placement of the two agents at episode start, chosen by the spawner.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpawnLayout {
    /// Use [`ArenaConfig::start_positions`] as-is.
    Fixed,
    /// Opposite points on a circle at a fixed angle.
    Circle { radius: f32, angle_degrees: f32 },
    /// Opposite points on a circle at a uniformly random angle.
    RandomCircle { radius: f32 },
}

/// Whether the arena uses an obstacle and where its body comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObstacleMode {
    Disabled,
    /// A pre-placed body is repositioned every episode.
    Reuse,
    /// A fresh body is created every episode; the previous one is discarded.
    Spawn,
}

/// Actuation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionConfig {
    pub scheme: MovementScheme,
    /// Horizontal speed ceiling.
    pub move_speed: f32,
    /// Forward acceleration at full input (forward/turn scheme).
    pub move_acceleration: f32,
    /// Force at full input (planar scheme).
    pub move_force: f32,
    /// Degrees per second at full turn input.
    pub rotation_speed: f32,
    /// Vertical velocity set by a jump.
    pub jump_speed: f32,
    pub agent_radius: f32,
    pub agent_mass: f32,
}

impl MotionConfig {
    fn tag() -> Self {
        Self {
            scheme: MovementScheme::ForwardTurn,
            move_speed: 10.0,
            move_acceleration: 20.0,
            move_force: 5.0,
            rotation_speed: 200.0,
            jump_speed: 8.0,
            agent_radius: 0.5,
            agent_mass: 1.0,
        }
    }

    fn goal() -> Self {
        Self {
            scheme: MovementScheme::Planar,
            move_speed: 8.0,
            move_force: 5.0,
            ..Self::tag()
        }
    }
}

/// Reward constants. Terminal rewards are the values assigned at episode end;
/// coefficients scale the per-tick shaping terms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RewardConfig {
    // --- Terminal ---
    pub tagger_catch_reward: f32,
    /// Subtracted from the runner when caught.
    pub runner_caught_penalty: f32,
    pub tagger_timeout_reward: f32,
    pub runner_survive_reward: f32,
    pub out_of_bounds_reward: f32,
    /// Added to the tagger when the runner goes out of bounds, and to the
    /// other agent in any role-less case.
    pub out_of_bounds_opponent_reward: f32,
    /// Added to the runner when the tagger goes out of bounds.
    pub out_of_bounds_runner_reward: f32,
    pub stuck_terminal_reward: f32,
    /// Added to the other agent when one times out stuck.
    pub stuck_opponent_reward: f32,
    pub goal_reward: f32,
    pub goal_timeout_reward: f32,

    // --- Shaping ---
    /// Scales the change in distance to the opponent or target.
    pub progress_coefficient: f32,
    pub proximity_coefficient: f32,
    pub speed_coefficient: f32,
    pub facing_coefficient: f32,
    pub tagger_step_reward: f32,
    pub runner_step_reward: f32,
    pub goal_step_reward: f32,
    pub collision_penalty: f32,
    /// Minimum impact speed for the collision penalty.
    pub collision_speed_threshold: f32,
    /// Per-tick penalty while stuck.
    pub stuck_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            tagger_catch_reward: 1.0,
            runner_caught_penalty: 1.0,
            tagger_timeout_reward: -0.5,
            runner_survive_reward: 0.5,
            out_of_bounds_reward: -1.0,
            out_of_bounds_opponent_reward: 0.5,
            out_of_bounds_runner_reward: 0.5,
            stuck_terminal_reward: -1.0,
            stuck_opponent_reward: 0.5,
            goal_reward: 1.0,
            goal_timeout_reward: 0.0,
            progress_coefficient: 0.05,
            proximity_coefficient: 0.001,
            speed_coefficient: 0.0005,
            facing_coefficient: 0.0005,
            tagger_step_reward: -0.001,
            runner_step_reward: 0.002,
            goal_step_reward: -0.001,
            collision_penalty: -0.01,
            collision_speed_threshold: 2.0,
            stuck_penalty: -0.005,
        }
    }
}

/// Stuck watchdog thresholds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StuckConfig {
    /// Displacement per tick below which the agent counts as still.
    pub displacement_threshold: f32,
    /// Still ticks tolerated before the agent is flagged stuck.
    pub frames: u32,
    /// Simulated seconds of being stuck before the episode is failed.
    pub timeout_secs: f32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            displacement_threshold: 0.01,
            frames: 30,
            timeout_secs: 5.0,
        }
    }
}

/// Obstacle placement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleConfig {
    pub mode: ObstacleMode,
    pub center_spawn_position: Vec3,
    /// Sample inside the spawn area instead of using the center position.
    pub randomize_position: bool,
    pub spawn_area_min: Vec3,
    pub spawn_area_max: Vec3,
    pub min_distance_from_target: f32,
    pub min_distance_from_agent: f32,
    pub max_spawn_attempts: u32,
    pub radius: f32,
    pub mass: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            mode: ObstacleMode::Spawn,
            center_spawn_position: Vec3::new(0.0, 0.2, 0.0),
            randomize_position: false,
            spawn_area_min: Vec3::new(-7.0, 0.25, -7.0),
            spawn_area_max: Vec3::new(7.0, 0.25, 7.0),
            min_distance_from_target: 3.0,
            min_distance_from_agent: 2.0,
            max_spawn_attempts: 10,
            radius: 1.0,
            mass: 100.0,
        }
    }
}

/// Observation normalization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationConfig {
    pub position_scale: f32,
    pub velocity_scale: f32,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            position_scale: 15.0,
            velocity_scale: 10.0,
        }
    }
}

/// Full arena configuration.
///
/// Use [`ArenaConfig::tag`] or [`ArenaConfig::goal`] as a starting point and
/// override fields with struct-update syntax.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArenaConfig {
    pub variant: Variant,
    /// Physics tick length in seconds.
    pub fixed_delta: f32,
    /// Step limit per episode; 0 disables the limit.
    pub max_steps: u32,
    pub arena_center: Vec3,
    /// Maximum horizontal distance from the center before out-of-bounds.
    pub arena_radius: f32,
    /// Maximum distance to the opponent or target before out-of-bounds.
    pub max_distance: f32,
    /// Capture distance.
    pub tag_distance: f32,
    /// Height below which an agent has fallen off.
    pub fall_height: f32,
    /// Index of the agent holding spawner authority.
    pub spawner: usize,
    pub spawn_layout: SpawnLayout,
    pub start_positions: [Vec3; 2],
    /// Goal variant: target is placed uniformly in this box each episode.
    pub target_area_min: Vec3,
    pub target_area_max: Vec3,
    pub motion: MotionConfig,
    pub reward: RewardConfig,
    pub stuck: StuckConfig,
    pub obstacle: ObstacleConfig,
    pub observation: ObservationConfig,
}

impl ArenaConfig {
    /// Pursuit game defaults.
    pub fn tag() -> Self {
        Self {
            variant: Variant::Tag,
            fixed_delta: 0.02,
            max_steps: 500,
            arena_center: Vec3::ZERO,
            arena_radius: 20.0,
            max_distance: 15.0,
            tag_distance: 1.5,
            fall_height: -2.0,
            spawner: 0,
            spawn_layout: SpawnLayout::RandomCircle { radius: 5.0 },
            start_positions: [Vec3::new(-5.0, 0.5, 0.0), Vec3::new(5.0, 0.5, 0.0)],
            target_area_min: Vec3::new(-8.0, 0.5, -8.0),
            target_area_max: Vec3::new(8.0, 0.5, 8.0),
            motion: MotionConfig::tag(),
            reward: RewardConfig::default(),
            stuck: StuckConfig::default(),
            obstacle: ObstacleConfig::default(),
            observation: ObservationConfig::default(),
        }
    }

    /// Goal-seeking defaults.
    pub fn goal() -> Self {
        Self {
            variant: Variant::Goal,
            max_steps: 0,
            max_distance: 10.0,
            fall_height: -1.0,
            spawn_layout: SpawnLayout::Fixed,
            start_positions: [Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.5, 0.0)],
            motion: MotionConfig::goal(),
            reward: RewardConfig {
                facing_coefficient: 0.0,
                proximity_coefficient: 0.0,
                ..RewardConfig::default()
            },
            obstacle: ObstacleConfig {
                mode: ObstacleMode::Disabled,
                ..ObstacleConfig::default()
            },
            observation: ObservationConfig {
                position_scale: 10.0,
                velocity_scale: 8.0,
            },
            ..Self::tag()
        }
    }

    /// Number of agents the variant runs.
    pub fn n_agents(&self) -> usize {
        match self.variant {
            Variant::Tag => 2,
            Variant::Goal => 1,
        }
    }

    /// Whether episodes end at [`ArenaConfig::max_steps`].
    pub fn has_step_limit(&self) -> bool {
        self.max_steps > 0
    }

    /// Checks the configuration for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positives = [
            ("fixed_delta", self.fixed_delta),
            ("arena_radius", self.arena_radius),
            ("max_distance", self.max_distance),
            ("tag_distance", self.tag_distance),
            ("motion.move_speed", self.motion.move_speed),
            ("motion.agent_radius", self.motion.agent_radius),
            ("motion.agent_mass", self.motion.agent_mass),
            ("obstacle.radius", self.obstacle.radius),
            ("obstacle.mass", self.obstacle.mass),
            ("observation.position_scale", self.observation.position_scale),
            ("observation.velocity_scale", self.observation.velocity_scale),
        ];
        for (field, value) in positives {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if self.tag_distance >= self.max_distance {
            return Err(ConfigError::TagDistanceTooLarge {
                tag_distance: self.tag_distance,
                max_distance: self.max_distance,
            });
        }

        if self.spawner >= 2 {
            return Err(ConfigError::SpawnerOutOfRange(self.spawner));
        }

        if self.obstacle.randomize_position
            && !self.obstacle.spawn_area_min.cmple(self.obstacle.spawn_area_max).all()
        {
            return Err(ConfigError::EmptySpawnArea {
                min: self.obstacle.spawn_area_min.to_array(),
                max: self.obstacle.spawn_area_max.to_array(),
            });
        }

        if self.variant == Variant::Goal
            && !self.target_area_min.cmple(self.target_area_max).all()
        {
            return Err(ConfigError::EmptySpawnArea {
                min: self.target_area_min.to_array(),
                max: self.target_area_max.to_array(),
            });
        }

        Ok(())
    }

    /// Parses and validates a JSON configuration.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_are_valid() {
        assert_eq!(ArenaConfig::tag().validate(), Ok(()));
        assert_eq!(ArenaConfig::goal().validate(), Ok(()));
    }

    #[test]
    fn variant_agent_counts() {
        assert_eq!(ArenaConfig::tag().n_agents(), 2);
        assert_eq!(ArenaConfig::goal().n_agents(), 1);
    }

    #[test]
    fn goal_preset_uses_planar_motion_without_step_limit() {
        let cfg = ArenaConfig::goal();
        assert_eq!(cfg.motion.scheme, MovementScheme::Planar);
        assert!(!cfg.has_step_limit());
    }

    #[test]
    fn rejects_non_positive_scale() {
        let cfg = ArenaConfig {
            observation: ObservationConfig {
                position_scale: 0.0,
                velocity_scale: 10.0,
            },
            ..ArenaConfig::tag()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                field: "observation.position_scale",
                ..
            })
        ));
    }

    #[test]
    fn rejects_nan_speed() {
        let mut cfg = ArenaConfig::tag();
        cfg.motion.move_speed = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_tag_distance_beyond_leash() {
        let cfg = ArenaConfig {
            tag_distance: 20.0,
            ..ArenaConfig::tag()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TagDistanceTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_bad_spawner() {
        let cfg = ArenaConfig {
            spawner: 2,
            ..ArenaConfig::tag()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::SpawnerOutOfRange(2)));
    }

    #[test]
    fn rejects_inverted_obstacle_area_when_randomized() {
        let mut cfg = ArenaConfig::tag();
        cfg.obstacle.randomize_position = true;
        cfg.obstacle.spawn_area_min = Vec3::splat(5.0);
        cfg.obstacle.spawn_area_max = Vec3::splat(-5.0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EmptySpawnArea { .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_preserves_config() {
        let cfg = ArenaConfig::goal();
        let json = serde_json::to_string(&cfg).unwrap();
        let restored = ArenaConfig::from_json_str(&json).unwrap();
        assert_eq!(restored, cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_parse_error_is_reported() {
        let err = ArenaConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
