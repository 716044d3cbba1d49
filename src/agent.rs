//! Per-agent state for the arena.

use glam::Vec3;

use crate::stuck::StuckTracker;
use crate::types::{AgentId, Body, Pose, Role};

/// Where an agent is in its episode lifecycle.
///
/// `Idle → Active → Terminal → (begin_episode) → Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodePhase {
    #[default]
    Idle,
    Active,
    Terminal,
}

/// State of a single agent.
///
/// Everything that must be cleared at an episode boundary is reset together in
/// [`AgentState::reset_for_episode`].
#[derive(Debug, Clone)]
pub struct AgentState {
    pub id: AgentId,
    pub role: Role,
    pub body: Body,
    pub grounded: bool,
    pub phase: EpisodePhase,
    /// Pose the agent returns to at episode start.
    pub start_pose: Pose,
    /// Ticks taken this episode.
    pub step_count: u32,
    /// Reward accumulated over the current episode, excluding this tick.
    pub cumulative_reward: f32,
    /// Reward for the tick being processed.
    pub pending_reward: f32,
    /// Distance to the opponent or target at the end of the previous tick.
    pub prev_distance: Option<f32>,
    pub stuck: StuckTracker,
}

impl AgentState {
    /// Creates an idle agent at `start_pose`.
    pub fn new(id: AgentId, start_pose: Pose, radius: f32, mass: f32) -> Self {
        Self {
            id,
            role: Role::None,
            body: Body::new(start_pose, radius, mass),
            grounded: false,
            phase: EpisodePhase::Idle,
            start_pose,
            step_count: 0,
            cumulative_reward: 0.0,
            pending_reward: 0.0,
            prev_distance: None,
            stuck: StuckTracker::new(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.body.pose.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.linear_velocity
    }

    pub fn forward(&self) -> Vec3 {
        self.body.pose.forward()
    }

    pub fn is_active(&self) -> bool {
        self.phase == EpisodePhase::Active
    }

    /// Returns the agent to its start pose and clears all per-episode scalars.
    ///
    /// Overwrites rather than accumulates, so calling it twice is the same as
    /// calling it once.
    pub fn reset_for_episode(&mut self) {
        self.body.pose = self.start_pose;
        self.body.halt();
        self.grounded = false;
        self.phase = EpisodePhase::Active;
        self.step_count = 0;
        self.cumulative_reward = 0.0;
        self.pending_reward = 0.0;
        self.prev_distance = None;
        self.stuck.reset();
    }

    /// Adds to this tick's reward.
    pub fn add_reward(&mut self, reward: f32) {
        self.pending_reward += reward;
    }

    /// Replaces this tick's reward.
    pub fn set_reward(&mut self, reward: f32) {
        self.pending_reward = reward;
    }

    /// Folds this tick's reward into the episode total and returns it.
    pub fn commit_reward(&mut self) -> f32 {
        let reward = self.pending_reward;
        self.cumulative_reward += reward;
        self.pending_reward = 0.0;
        reward
    }

    /// Marks the episode as ended for this agent.
    pub fn end_episode(&mut self) {
        self.phase = EpisodePhase::Terminal;
    }
}
