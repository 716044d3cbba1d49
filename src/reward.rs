//! Reward shaping and termination checks.
//!
//! Each tick an agent runs through a fixed pipeline:
//!
//! 1. out-of-bounds / fall
//! 2. tag or goal capture
//! 3. potential-based progress shaping
//! 4. secondary shaping (speed, facing, proximity, per-step, collision)
//! 5. stuck watchdog
//! 6. step limit
//!
//! The first terminal condition reached ends the pipeline.

use std::fmt;

use glam::Vec3;

use crate::agent::AgentState;
use crate::config::{ArenaConfig, Variant};
use crate::observation::Counterpart;
use crate::physics::ContactReport;
use crate::scoreboard::Outcome;
use crate::stuck::StuckStatus;
use crate::types::{horizontal, Role};

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalCause {
    OutOfBounds,
    Tag,
    GoalReached,
    Stuck,
    StepLimit,
}

impl TerminalCause {
    /// Pipeline position of the check that raises this cause. When several
    /// agents detect a terminal on one tick, the lowest precedence wins.
    pub fn precedence(&self) -> u8 {
        match self {
            TerminalCause::OutOfBounds => 0,
            TerminalCause::Tag | TerminalCause::GoalReached => 1,
            TerminalCause::Stuck => 2,
            TerminalCause::StepLimit => 3,
        }
    }
}

impl fmt::Display for TerminalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalCause::OutOfBounds => write!(f, "out_of_bounds"),
            TerminalCause::Tag => write!(f, "tag"),
            TerminalCause::GoalReached => write!(f, "goal_reached"),
            TerminalCause::Stuck => write!(f, "stuck"),
            TerminalCause::StepLimit => write!(f, "step_limit"),
        }
    }
}

/// How a terminal reward combines with the reward already accrued this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RewardUpdate {
    /// Replace the tick reward.
    Set(f32),
    /// Add to the tick reward.
    Add(f32),
}

impl RewardUpdate {
    pub fn apply(&self, agent: &mut AgentState) {
        match *self {
            RewardUpdate::Set(r) => agent.set_reward(r),
            RewardUpdate::Add(r) => agent.add_reward(r),
        }
    }
}

/// A terminal condition detected on one agent, carrying the rewards for both
/// sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalEvent {
    pub cause: TerminalCause,
    /// Applied to the agent that detected the condition.
    pub own: RewardUpdate,
    /// Applied to the other agent, if there is one.
    pub other: RewardUpdate,
    pub outcome: Outcome,
}

/// Per-term breakdown of the shaped (non-terminal) reward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapedReward {
    pub progress: f32,
    pub proximity: f32,
    pub speed: f32,
    pub facing: f32,
    pub step: f32,
    pub collision: f32,
    pub stuck: f32,
}

impl ShapedReward {
    pub fn total(&self) -> f32 {
        self.progress
            + self.proximity
            + self.speed
            + self.facing
            + self.step
            + self.collision
            + self.stuck
    }
}

/// Result of running the pipeline for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapingOutcome {
    Continue(ShapedReward),
    Terminal {
        shaped: ShapedReward,
        event: TerminalEvent,
    },
}

/// Computes per-tick rewards and detects terminal conditions.
pub struct RewardShaper;

impl RewardShaper {
    /// Runs the pipeline for `agent`.
    ///
    /// `counterpart` is the opponent (tag) or target (goal); when absent the
    /// distance-based checks and terms are skipped. `now` is simulated time in
    /// seconds, used by the stuck watchdog. Updates the agent's stuck tracker
    /// and previous-distance record; does not touch its reward.
    pub fn evaluate(
        agent: &mut AgentState,
        counterpart: Option<Counterpart>,
        contact: &ContactReport,
        now: f32,
        config: &ArenaConfig,
    ) -> ShapingOutcome {
        let rc = &config.reward;
        let position = agent.position();
        let distance = counterpart.map(|c| c.position.distance(position));
        let mut shaped = ShapedReward::default();

        // 1. Out of bounds.
        let too_far = distance.is_some_and(|d| d > config.max_distance);
        if Self::breaches_bounds(position, config) || too_far {
            let opponent_reward = match agent.role {
                Role::Tagger => rc.out_of_bounds_runner_reward,
                Role::Runner | Role::None => rc.out_of_bounds_opponent_reward,
            };
            let event = TerminalEvent {
                cause: TerminalCause::OutOfBounds,
                own: RewardUpdate::Set(rc.out_of_bounds_reward),
                other: RewardUpdate::Add(opponent_reward),
                outcome: Self::loss_for(agent.role, config.variant),
            };
            return ShapingOutcome::Terminal { shaped, event };
        }

        // 2. Tag / goal.
        if let Some(d) = distance.filter(|&d| d < config.tag_distance) {
            let event = match (config.variant, agent.role) {
                (Variant::Goal, _) => Some(TerminalEvent {
                    cause: TerminalCause::GoalReached,
                    own: RewardUpdate::Set(rc.goal_reward),
                    other: RewardUpdate::Add(0.0),
                    outcome: Outcome::GoalReached,
                }),
                (Variant::Tag, Role::Tagger) => Some(TerminalEvent {
                    cause: TerminalCause::Tag,
                    own: RewardUpdate::Set(rc.tagger_catch_reward),
                    other: RewardUpdate::Set(-rc.runner_caught_penalty),
                    outcome: Outcome::TaggerWon,
                }),
                (Variant::Tag, Role::Runner) => Some(TerminalEvent {
                    cause: TerminalCause::Tag,
                    own: RewardUpdate::Set(-rc.runner_caught_penalty),
                    other: RewardUpdate::Set(rc.tagger_catch_reward),
                    outcome: Outcome::TaggerWon,
                }),
                (Variant::Tag, Role::None) => None,
            };
            if let Some(event) = event {
                tracing::trace!(agent = %agent.id, distance = d, "capture");
                return ShapingOutcome::Terminal { shaped, event };
            }
        }

        // 3. Potential-based progress.
        let sign = agent.role.pursuit_sign();
        if let Some(d) = distance {
            if let Some(prev) = agent.prev_distance {
                shaped.progress = rc.progress_coefficient * (prev - d) * sign;
            }
            agent.prev_distance = Some(d);
        }

        // The watchdog runs before the secondary terms so the speed bonus can
        // see this tick's stuck flag; its penalty and timeout apply in step 5.
        let stuck = agent.stuck.observe(position, now, &config.stuck);

        // 4. Secondary shaping.
        if !stuck.is_stuck() {
            let speed = horizontal(agent.velocity()).length();
            shaped.speed = rc.speed_coefficient * (speed / config.motion.move_speed).min(1.0);
        }

        if let (Some(d), Some(other)) = (distance, counterpart) {
            if config.variant == Variant::Tag && d > 1e-6 {
                let dir = (other.position - position) / d;
                shaped.facing = rc.facing_coefficient * agent.forward().dot(dir) * sign;
            }
            let closeness = (d / config.max_distance).clamp(0.0, 1.0);
            shaped.proximity = match agent.role {
                Role::Runner => closeness * rc.proximity_coefficient,
                Role::Tagger | Role::None => (1.0 - closeness) * rc.proximity_coefficient,
            };
        }

        shaped.step = match (config.variant, agent.role) {
            (Variant::Goal, _) => rc.goal_step_reward,
            (Variant::Tag, Role::Tagger) => rc.tagger_step_reward,
            (Variant::Tag, Role::Runner) => rc.runner_step_reward,
            (Variant::Tag, Role::None) => 0.0,
        };

        if contact
            .obstacle_impact
            .is_some_and(|speed| speed > rc.collision_speed_threshold)
        {
            shaped.collision = rc.collision_penalty;
        }

        // 5. Stuck.
        if stuck.is_stuck() {
            shaped.stuck = rc.stuck_penalty;
        }
        if let StuckStatus::TimedOut { elapsed } = stuck {
            tracing::debug!(agent = %agent.id, elapsed, "stuck timeout");
            let event = TerminalEvent {
                cause: TerminalCause::Stuck,
                own: RewardUpdate::Set(rc.stuck_terminal_reward),
                other: RewardUpdate::Add(rc.stuck_opponent_reward),
                outcome: Self::loss_for(agent.role, config.variant),
            };
            return ShapingOutcome::Terminal { shaped, event };
        }

        // 6. Step limit.
        if config.has_step_limit() && agent.step_count >= config.max_steps {
            let event = match config.variant {
                Variant::Goal => TerminalEvent {
                    cause: TerminalCause::StepLimit,
                    own: RewardUpdate::Set(rc.goal_timeout_reward),
                    other: RewardUpdate::Add(0.0),
                    outcome: Outcome::GoalFailed,
                },
                Variant::Tag if agent.role == Role::Tagger => TerminalEvent {
                    cause: TerminalCause::StepLimit,
                    own: RewardUpdate::Set(rc.tagger_timeout_reward),
                    other: RewardUpdate::Add(rc.runner_survive_reward),
                    outcome: Outcome::RunnerWon,
                },
                Variant::Tag => TerminalEvent {
                    cause: TerminalCause::StepLimit,
                    own: RewardUpdate::Add(rc.runner_survive_reward),
                    other: RewardUpdate::Set(rc.tagger_timeout_reward),
                    outcome: Outcome::RunnerWon,
                },
            };
            return ShapingOutcome::Terminal { shaped, event };
        }

        ShapingOutcome::Continue(shaped)
    }

    /// Whether `position` has fallen below the floor or left the arena disc.
    ///
    /// Unlike the leash to the opponent, this depends on the agent alone.
    pub fn breaches_bounds(position: Vec3, config: &ArenaConfig) -> bool {
        position.y < config.fall_height
            || horizontal(position - config.arena_center).length() > config.arena_radius
    }

    /// Outcome when the agent holding `role` fails the episode.
    fn loss_for(role: Role, variant: Variant) -> Outcome {
        match (variant, role) {
            (Variant::Goal, _) => Outcome::GoalFailed,
            (Variant::Tag, Role::Tagger) => Outcome::RunnerWon,
            (Variant::Tag, Role::Runner | Role::None) => Outcome::TaggerWon,
        }
    }
}
