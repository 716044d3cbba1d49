//! tag_arena - multi-agent pursuit and goal-seeking simulation core
//!
//! Owns the episode state machine, the two-agent role protocol, reward
//! shaping and the observation/action contract of a reinforcement-learning
//! arena. Physics sits behind [`physics::PhysicsWorld`]; learning happens
//! outside the crate behind [`policy::Policy`].
//!
//! Two variants are provided:
//!
//! - [`TagArena`]: a tagger chases a runner; roles are redrawn each episode.
//! - [`GoalArena`]: a single agent steers to a target re-placed each episode.
//!
//! Both report episode results to a shared [`Scoreboard`].

pub mod action;
pub mod agent;
pub mod arena;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod observation;
pub mod obstacle;
pub mod physics;
pub mod policy;
pub mod reward;
pub mod scoreboard;
pub mod stuck;
pub mod types;

pub use action::{ActionDecoder, ActionRecord};
pub use agent::{AgentState, EpisodePhase};
pub use arena::{GoalArena, GoalStepResult, TagArena, TagStepResult};
pub use config::{
    ArenaConfig, MotionConfig, MovementScheme, ObstacleConfig, ObstacleMode, ObservationConfig,
    RewardConfig, SpawnLayout, StuckConfig, Variant,
};
pub use coordinator::EpisodeCoordinator;
pub use error::{ArenaError, ConfigError};
pub use metrics::EvaluationMetrics;
pub use observation::{Counterpart, ObservationBuilder, ObservationLayout};
pub use obstacle::{ObstacleManager, ObstacleSlot};
pub use physics::{ContactReport, FlatArenaPhysics, PhysicsWorld};
pub use policy::{HeuristicPolicy, ManualInput, ManualPolicy, Policy, RandomPolicy};
pub use reward::{
    RewardShaper, RewardUpdate, ShapedReward, ShapingOutcome, TerminalCause, TerminalEvent,
};
pub use scoreboard::{Outcome, ScoreSnapshot, Scoreboard};
pub use types::{AgentId, Body, Pose, Role};
