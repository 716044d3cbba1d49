use thiserror::Error;

/// Errors raised while validating or loading an [`ArenaConfig`](crate::config::ArenaConfig).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("tag distance {tag_distance} must be smaller than max distance {max_distance}")]
    TagDistanceTooLarge { tag_distance: f32, max_distance: f32 },

    #[error("spawn area is empty: min {min:?} is not below max {max:?}")]
    EmptySpawnArea { min: [f32; 3], max: [f32; 3] },

    #[error("spawner index {0} is out of range for a two-agent arena")]
    SpawnerOutOfRange(usize),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Errors returned by the arena controllers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArenaError {
    #[error("action record needs 2 or 3 channels, got {0}")]
    ActionWidth(usize),

    #[error("episode is not active; call reset() first")]
    EpisodeNotActive,

    #[error("expected {expected} actions, got {got}")]
    AgentCount { expected: usize, got: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
