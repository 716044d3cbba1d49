//! Obstacle spawner.
//!
//! Owns the single dynamic obstacle of an arena. The spawner agent calls
//! [`ObstacleManager::spawn`] at every episode start; the encoder and shaper
//! read the body back through [`ObstacleManager::body`].

use glam::{Quat, Vec3};
use rand::Rng;

use crate::config::{ObstacleConfig, ObstacleMode};
use crate::types::{Body, Pose};

/// Where the current obstacle came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleSlot {
    /// No active obstacle.
    Absent,
    /// A pre-placed body, repositioned each episode.
    Reused(Body),
    /// A body created for this episode.
    Spawned { body: Body, generation: u32 },
}

impl ObstacleSlot {
    pub fn body(&self) -> Option<&Body> {
        match self {
            ObstacleSlot::Absent => None,
            ObstacleSlot::Reused(body) | ObstacleSlot::Spawned { body, .. } => Some(body),
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        match self {
            ObstacleSlot::Absent => None,
            ObstacleSlot::Reused(body) | ObstacleSlot::Spawned { body, .. } => Some(body),
        }
    }
}

/// Places and resets the arena obstacle.
#[derive(Debug, Clone)]
pub struct ObstacleManager {
    config: ObstacleConfig,
    slot: ObstacleSlot,
    /// Pre-placed body held while the slot is empty (reuse mode only).
    existing: Option<Body>,
    spawn_pose: Pose,
    generation: u32,
}

impl ObstacleManager {
    /// Creates a manager. In [`ObstacleMode::Reuse`] a default body is
    /// pre-placed at the center spawn position.
    pub fn new(config: ObstacleConfig) -> Self {
        let spawn_pose = Pose::new(config.center_spawn_position, Quat::IDENTITY);
        let existing = (config.mode == ObstacleMode::Reuse)
            .then(|| Body::new(spawn_pose, config.radius, config.mass));
        Self {
            config,
            slot: ObstacleSlot::Absent,
            existing,
            spawn_pose,
            generation: 0,
        }
    }

    /// Creates a manager that reuses `body` every episode.
    pub fn with_existing(config: ObstacleConfig, body: Body) -> Self {
        let config = ObstacleConfig {
            mode: ObstacleMode::Reuse,
            ..config
        };
        Self {
            existing: Some(body),
            ..Self::new(config)
        }
    }

    pub fn slot(&self) -> &ObstacleSlot {
        &self.slot
    }

    pub fn body(&self) -> Option<&Body> {
        self.slot.body()
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.slot.body_mut()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.slot, ObstacleSlot::Absent)
    }

    /// Number of bodies spawned so far (spawn mode).
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Places the obstacle for a new episode.
    ///
    /// The position is the configured center, or a sampled point inside the
    /// spawn area that keeps clear of `agents` and `target`. The yaw is
    /// random; velocities are zeroed.
    pub fn spawn<R: Rng>(&mut self, rng: &mut R, agents: &[Vec3], target: Option<Vec3>) {
        if self.config.mode == ObstacleMode::Disabled {
            self.slot = ObstacleSlot::Absent;
            return;
        }

        let position = self.choose_position(rng, agents, target);
        let yaw = rng.gen_range(0.0..360.0_f32);
        self.spawn_pose = Pose::with_yaw(position, yaw);

        match self.config.mode {
            ObstacleMode::Reuse => {
                let mut body = match std::mem::replace(&mut self.slot, ObstacleSlot::Absent) {
                    ObstacleSlot::Reused(body) => body,
                    _ => self.existing.take().unwrap_or_else(|| {
                        Body::new(self.spawn_pose, self.config.radius, self.config.mass)
                    }),
                };
                body.pose = self.spawn_pose;
                body.halt();
                self.slot = ObstacleSlot::Reused(body);
            }
            ObstacleMode::Spawn => {
                if let ObstacleSlot::Spawned { generation, .. } = self.slot {
                    tracing::debug!(generation, "discarding previous obstacle");
                }
                self.generation += 1;
                let body = Body::new(self.spawn_pose, self.config.radius, self.config.mass);
                self.slot = ObstacleSlot::Spawned {
                    body,
                    generation: self.generation,
                };
            }
            ObstacleMode::Disabled => return,
        }

        tracing::debug!(
            x = position.x,
            z = position.z,
            yaw,
            mode = ?self.config.mode,
            "obstacle spawned"
        );
    }

    /// Returns the obstacle to its spawn pose without choosing a new one.
    pub fn reset(&mut self) {
        let pose = self.spawn_pose;
        if let Some(body) = self.slot.body_mut() {
            body.pose = pose;
            body.halt();
        }
    }

    fn choose_position<R: Rng>(
        &self,
        rng: &mut R,
        agents: &[Vec3],
        target: Option<Vec3>,
    ) -> Vec3 {
        if !self.config.randomize_position {
            return self.config.center_spawn_position;
        }

        let (min, max) = (self.config.spawn_area_min, self.config.spawn_area_max);
        for _ in 0..self.config.max_spawn_attempts {
            let candidate = Vec3::new(
                sample(rng, min.x, max.x),
                sample(rng, min.y, max.y),
                sample(rng, min.z, max.z),
            );
            let clear_of_agents = agents
                .iter()
                .all(|a| a.distance(candidate) >= self.config.min_distance_from_agent);
            let clear_of_target = target
                .map_or(true, |t| t.distance(candidate) >= self.config.min_distance_from_target);
            if clear_of_agents && clear_of_target {
                return candidate;
            }
        }

        tracing::warn!(
            attempts = self.config.max_spawn_attempts,
            "no clear obstacle position found, using center"
        );
        self.config.center_spawn_position
    }
}

fn sample<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}
