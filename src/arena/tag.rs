//! Two-agent pursuit arena.

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
use crate::types::Role;

/// Result of a single [`TagArena::step`].
#[derive(Debug, Clone)]
pub struct TagStepResult {
    /// Per-agent observations for the next tick, in agent order.
    pub observations: [Vec<f32>; 2],
    /// Reward each agent earned this tick.
    pub rewards: [f32; 2],
    /// Both agents are terminal.
    pub done: bool,
    pub cause: Option<TerminalCause>,
    pub outcome: Option<Outcome>,
    /// Ticks taken this episode.
    pub step: u32,
}

/// The tag game: one tagger chases one runner around a circular arena.
///
/// # Lifecycle
///
/// 1. Create with [`TagArena::new`] (or [`TagArena::with_physics`]).
/// 2. Call [`TagArena::reset`] to start an episode.
/// 3. Call [`TagArena::step`] with both actions until `done`.
/// 4. Go back to 2.
#[derive(Debug)]
pub struct TagArena<P = FlatArenaPhysics> {
    config: ArenaConfig,
    agents: Vec<AgentState>,
    coordinator: EpisodeCoordinator,
    obstacle: ObstacleManager,
    physics: P,
    scoreboard: Scoreboard,
    /// Simulated seconds since the episode started.
    time: f32,
    outcome_recorded: bool,
}

impl TagArena {
    /// Creates an arena on the flat reference physics.
    pub fn new(config: ArenaConfig, seed: u64, scoreboard: Scoreboard) -> Result<Self, ArenaError> {
        let physics = FlatArenaPhysics::new(config.arena_center, config.arena_radius);
        Self::with_physics(config, seed, scoreboard, physics)
    }
}

impl<P: PhysicsWorld> TagArena<P> {
    /// Creates an arena stepping `physics`.
    pub fn with_physics(
        config: ArenaConfig,
        seed: u64,
        scoreboard: Scoreboard,
        physics: P,
    ) -> Result<Self, ArenaError> {
        config.validate()?;
        if config.variant != Variant::Tag {
            return Err(ArenaError::AgentCount {
                expected: 2,
                got: config.n_agents(),
            });
        }

        Ok(Self {
            agents: super::spawn_agents(&config),
            coordinator: EpisodeCoordinator::new(config.spawner, seed),
            obstacle: ObstacleManager::new(config.obstacle.clone()),
            physics,
            scoreboard,
            time: 0.0,
            outcome_recorded: false,
            config,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    /// Mutable agent access, for scripted setups.
    pub fn agents_mut(&mut self) -> &mut [AgentState] {
        &mut self.agents
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

    /// Simulated seconds since the episode started.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Index of the agent currently holding `role`.
    pub fn index_of(&self, role: Role) -> Option<usize> {
        self.agents.iter().position(|a| a.role == role)
    }

    /// Starts a new episode and returns both initial observations.
    ///
    /// An episode still running is abandoned without recording an outcome.
    pub fn reset(&mut self) -> [Vec<f32>; 2] {
        self.time = 0.0;
        self.outcome_recorded = false;
        super::abandon_episode(&mut self.agents);
        for i in 0..self.agents.len() {
            self.coordinator.begin_episode(
                &mut self.agents,
                i,
                &mut self.obstacle,
                None,
                &self.config,
            );
        }
        super::probe_ground(&self.physics, &mut self.agents);
        self.observations()
    }

    /// Advances the match by one tick.
    ///
    /// Both agents are shaped from the same post-physics state. If more than
    /// one terminal fires, [`EpisodeCoordinator::arbitrate`] picks the one
    /// that ends the episode for both.
    pub fn step(&mut self, actions: [ActionRecord; 2]) -> Result<TagStepResult, ArenaError> {
        super::ensure_active(&self.agents)?;

        let contacts = super::advance(
            &mut self.physics,
            &mut self.agents,
            &mut self.obstacle,
            &actions,
            &self.config,
        );
        self.time += self.config.fixed_delta;

        let mut detected = Vec::new();
        for i in 0..self.agents.len() {
            let counterpart = Counterpart::of(&self.agents[1 - i]);
            let outcome = RewardShaper::evaluate(
                &mut self.agents[i],
                Some(counterpart),
                &contacts[i],
                self.time,
                &self.config,
            );
            match outcome {
                ShapingOutcome::Continue(shaped) => self.agents[i].add_reward(shaped.total()),
                ShapingOutcome::Terminal { shaped, event } => {
                    self.agents[i].add_reward(shaped.total());
                    detected.push((i, event));
                }
            }
        }

        let terminal = EpisodeCoordinator::arbitrate(&self.agents, &detected, &self.config).map(
            |(i, event)| {
                let outcome = EpisodeCoordinator::terminate(&mut self.agents, i, &event);
                (event.cause, outcome)
            },
        );

        let rewards = [self.agents[0].commit_reward(), self.agents[1].commit_reward()];
        self.publish_rewards();

        let step = self.agents[0].step_count;
        if let Some((cause, outcome)) = terminal {
            self.record(cause, outcome, step);
        }

        Ok(TagStepResult {
            observations: self.observations(),
            rewards,
            done: terminal.is_some(),
            cause: terminal.map(|(cause, _)| cause),
            outcome: terminal.map(|(_, outcome)| outcome),
            step,
        })
    }

    /// Observations of both agents for the current state.
    pub fn observations(&self) -> [Vec<f32>; 2] {
        let obstacle = self.obstacle.body();
        let observe = |i: usize| {
            let counterpart = Counterpart::of(&self.agents[1 - i]);
            ObservationBuilder::build(&self.agents[i], Some(counterpart), obstacle, &self.config)
        };
        [observe(0), observe(1)]
    }

    fn publish_rewards(&self) {
        let reward_of = |role| {
            self.index_of(role)
                .map_or(0.0, |i| self.agents[i].cumulative_reward)
        };
        self.scoreboard
            .update_rewards(reward_of(Role::Tagger), reward_of(Role::Runner));
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
