//! Single-agent goal-seeking arena.

use glam::Vec3;
use rand::Rng;

use crate::action::ActionRecord;
use crate::agent::AgentState;
use crate::config::{ArenaConfig, Variant};
use crate::coordinator::EpisodeCoordinator;
use crate::error::ArenaError;
use crate::observation::{Counterpart, ObservationBuilder};
use crate::obstacle::ObstacleManager;
use crate::physics::{FlatArenaPhysics, PhysicsWorld};
use crate::reward::{RewardShaper, ShapingOutcome, TerminalCause};
use crate::scoreboard::{Outcome, Scoreboard};

/// Attempts at placing the target outside capture range of the start pose.
const TARGET_PLACEMENT_ATTEMPTS: usize = 16;

/// Result of a single [`GoalArena::step`].
#[derive(Debug, Clone)]
pub struct GoalStepResult {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    pub cause: Option<TerminalCause>,
    pub outcome: Option<Outcome>,
    pub step: u32,
}

/// One agent steering across the floor to a target re-placed every episode.
#[derive(Debug)]
pub struct GoalArena<P = FlatArenaPhysics> {
    config: ArenaConfig,
    agents: Vec<AgentState>,
    coordinator: EpisodeCoordinator,
    obstacle: ObstacleManager,
    physics: P,
    scoreboard: Scoreboard,
    target: Vec3,
    time: f32,
    outcome_recorded: bool,
}

impl GoalArena {
    /// Creates an arena on the flat reference physics.
    pub fn new(config: ArenaConfig, seed: u64, scoreboard: Scoreboard) -> Result<Self, ArenaError> {
        let physics = FlatArenaPhysics::new(config.arena_center, config.arena_radius);
        Self::with_physics(config, seed, scoreboard, physics)
    }
}

impl<P: PhysicsWorld> GoalArena<P> {
    pub fn with_physics(
        config: ArenaConfig,
        seed: u64,
        scoreboard: Scoreboard,
        physics: P,
    ) -> Result<Self, ArenaError> {
        config.validate()?;
        if config.variant != Variant::Goal {
            return Err(ArenaError::AgentCount {
                expected: 1,
                got: config.n_agents(),
            });
        }

        let target = (config.target_area_min + config.target_area_max) * 0.5;
        Ok(Self {
            agents: super::spawn_agents(&config),
            // A lone agent is always its own spawner.
            coordinator: EpisodeCoordinator::new(0, seed),
            obstacle: ObstacleManager::new(config.obstacle.clone()),
            physics,
            scoreboard,
            target,
            time: 0.0,
            outcome_recorded: false,
            config,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn agent(&self) -> &AgentState {
        &self.agents[0]
    }

    pub fn agent_mut(&mut self) -> &mut AgentState {
        &mut self.agents[0]
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Moves the target, e.g. to script a scenario after `reset`.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.agents[0].prev_distance = None;
    }

    pub fn obstacle(&self) -> &ObstacleManager {
        &self.obstacle
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn episode_index(&self) -> u64 {
        self.coordinator.episode_index()
    }

    /// Places a new target, starts an episode and returns the first
    /// observation.
    pub fn reset(&mut self) -> Vec<f32> {
        self.time = 0.0;
        self.outcome_recorded = false;
        super::abandon_episode(&mut self.agents);
        self.target = self.place_target();
        self.coordinator.begin_episode(
            &mut self.agents,
            0,
            &mut self.obstacle,
            Some(self.target),
            &self.config,
        );
        super::probe_ground(&self.physics, &mut self.agents);
        tracing::debug!(
            x = self.target.x,
            z = self.target.z,
            "target placed"
        );
        self.observation()
    }

    /// Advances the agent by one tick.
    pub fn step(&mut self, action: ActionRecord) -> Result<GoalStepResult, ArenaError> {
        super::ensure_active(&self.agents)?;

        let contacts = super::advance(
            &mut self.physics,
            &mut self.agents,
            &mut self.obstacle,
            &[action],
            &self.config,
        );
        self.time += self.config.fixed_delta;

        let target = Counterpart::fixed(self.target);
        let agent = &mut self.agents[0];
        let terminal = match RewardShaper::evaluate(
            agent,
            Some(target),
            &contacts[0],
            self.time,
            &self.config,
        ) {
            ShapingOutcome::Continue(shaped) => {
                agent.add_reward(shaped.total());
                None
            }
            ShapingOutcome::Terminal { shaped, event } => {
                agent.add_reward(shaped.total());
                let outcome = EpisodeCoordinator::terminate(&mut self.agents, 0, &event);
                Some((event.cause, outcome))
            }
        };

        let agent = &mut self.agents[0];
        let reward = agent.commit_reward();
        let step = agent.step_count;
        self.scoreboard.update_rewards(agent.cumulative_reward, 0.0);

        if let Some((cause, outcome)) = terminal {
            self.record(cause, outcome, step);
        }

        Ok(GoalStepResult {
            observation: self.observation(),
            reward,
            done: terminal.is_some(),
            cause: terminal.map(|(cause, _)| cause),
            outcome: terminal.map(|(_, outcome)| outcome),
            step,
        })
    }

    pub fn observation(&self) -> Vec<f32> {
        ObservationBuilder::build(
            &self.agents[0],
            Some(Counterpart::fixed(self.target)),
            self.obstacle.body(),
            &self.config,
        )
    }

    /// Uniform point in the target area, resampled while it lands inside
    /// capture range of the agent's start position.
    fn place_target(&mut self) -> Vec3 {
        let (min, max) = (self.config.target_area_min, self.config.target_area_max);
        let start = self.agents[0].start_pose.position;
        let rng = self.coordinator.rng_mut();
        let mut target = min;
        for _ in 0..TARGET_PLACEMENT_ATTEMPTS {
            target = Vec3::new(
                rng.gen_range(min.x..=max.x),
                rng.gen_range(min.y..=max.y),
                rng.gen_range(min.z..=max.z),
            );
            if target.distance(start) >= self.config.tag_distance {
                break;
            }
        }
        target
    }

    fn record(&mut self, cause: TerminalCause, outcome: Outcome, steps: u32) {
        if self.outcome_recorded {
            return;
        }
        self.outcome_recorded = true;
        self.scoreboard.record_outcome(outcome);
        tracing::info!(
            episode = self.coordinator.episode_index(),
            %cause,
            winner = %outcome,
            steps,
            "episode ended"
        );
    }
}
