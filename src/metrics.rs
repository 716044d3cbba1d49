//! Evaluation metrics.
//!
//! Rolls a policy through many episodes of an arena and aggregates win rates,
//! episode lengths and per-role returns.

use std::fmt;

use crate::action::ActionRecord;
use crate::arena::{GoalArena, TagArena};
use crate::error::ArenaError;
use crate::physics::PhysicsWorld;
use crate::policy::Policy;
use crate::scoreboard::Outcome;
use crate::types::Role;

/// Episodes still running after this many ticks are cut off and counted as
/// truncated.
pub const EPISODE_TICK_CAP: u32 = 10_000;

/// Aggregated evaluation metrics over multiple episodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationMetrics {
    /// Percentage of episodes won by the tagger.
    pub tagger_win_rate: f32,
    pub runner_win_rate: f32,
    /// Percentage of tag episodes both agents failed on the same tick.
    pub draw_rate: f32,
    /// Percentage of goal episodes that reached the target.
    pub goal_success_rate: f32,
    /// Mean ticks per episode.
    pub mean_episode_length: f32,
    /// Mean return of the tagger (or goal seeker).
    pub mean_tagger_reward: f32,
    pub mean_runner_reward: f32,
    /// Episodes cut off at [`EPISODE_TICK_CAP`].
    pub truncated: usize,
    pub n_episodes: usize,
}

/// Statistics of one finished episode.
#[derive(Debug, Default)]
struct EpisodeStats {
    outcome: Option<Outcome>,
    length: u32,
    tagger_reward: f32,
    runner_reward: f32,
}

impl EvaluationMetrics {
    /// Evaluates `policy` on the tag game for `n_episodes` episodes.
    pub fn evaluate_tag<P: PhysicsWorld>(
        arena: &mut TagArena<P>,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Result<Self, ArenaError> {
        let mut all_stats = Vec::with_capacity(n_episodes);

        for _ in 0..n_episodes {
            let mut obs = arena.reset();
            let mut stats = EpisodeStats::default();

            while stats.length < EPISODE_TICK_CAP {
                let actions: [ActionRecord; 2] = policy
                    .select_actions(&obs)
                    .try_into()
                    .map_err(|got: Vec<ActionRecord>| ArenaError::AgentCount {
                        expected: 2,
                        got: got.len(),
                    })?;
                let result = arena.step(actions)?;
                stats.length = result.step;
                obs = result.observations;
                if result.done {
                    stats.outcome = result.outcome;
                    break;
                }
            }

            let reward_of = |role| {
                arena
                    .index_of(role)
                    .map_or(0.0, |i| arena.agents()[i].cumulative_reward)
            };
            stats.tagger_reward = reward_of(Role::Tagger);
            stats.runner_reward = reward_of(Role::Runner);
            all_stats.push(stats);
        }

        Ok(Self::aggregate(&all_stats))
    }

    /// Evaluates `policy` on the goal task for `n_episodes` episodes.
    pub fn evaluate_goal<P: PhysicsWorld>(
        arena: &mut GoalArena<P>,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Result<Self, ArenaError> {
        let mut all_stats = Vec::with_capacity(n_episodes);

        for _ in 0..n_episodes {
            let mut obs = vec![arena.reset()];
            let mut stats = EpisodeStats::default();

            while stats.length < EPISODE_TICK_CAP {
                let actions = policy.select_actions(&obs);
                let action = match actions.as_slice() {
                    [action] => *action,
                    other => {
                        return Err(ArenaError::AgentCount {
                            expected: 1,
                            got: other.len(),
                        })
                    }
                };
                let result = arena.step(action)?;
                stats.length = result.step;
                obs = vec![result.observation];
                if result.done {
                    stats.outcome = result.outcome;
                    break;
                }
            }

            stats.tagger_reward = arena.agent().cumulative_reward;
            all_stats.push(stats);
        }

        Ok(Self::aggregate(&all_stats))
    }

    fn aggregate(all_stats: &[EpisodeStats]) -> Self {
        if all_stats.is_empty() {
            return Self::default();
        }
        let n = all_stats.len() as f32;
        let rate = |outcome: Outcome| {
            all_stats
                .iter()
                .filter(|s| s.outcome == Some(outcome))
                .count() as f32
                / n
                * 100.0
        };

        Self {
            tagger_win_rate: rate(Outcome::TaggerWon),
            runner_win_rate: rate(Outcome::RunnerWon),
            draw_rate: rate(Outcome::Draw),
            goal_success_rate: rate(Outcome::GoalReached),
            mean_episode_length: mean(all_stats, |s| s.length as f32),
            mean_tagger_reward: mean(all_stats, |s| s.tagger_reward),
            mean_runner_reward: mean(all_stats, |s| s.runner_reward),
            truncated: all_stats.iter().filter(|s| s.outcome.is_none()).count(),
            n_episodes: all_stats.len(),
        }
    }
}

fn mean(stats: &[EpisodeStats], f: impl Fn(&EpisodeStats) -> f32) -> f32 {
    stats.iter().map(f).sum::<f32>() / stats.len() as f32
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes
        )?;
        writeln!(f, "  Tagger win rate:      {:.1}%", self.tagger_win_rate)?;
        writeln!(f, "  Runner win rate:      {:.1}%", self.runner_win_rate)?;
        writeln!(f, "  Draw rate:            {:.1}%", self.draw_rate)?;
        writeln!(f, "  Goal success rate:    {:.1}%", self.goal_success_rate)?;
        writeln!(
            f,
            "  Mean episode length:  {:.1}",
            self.mean_episode_length
        )?;
        writeln!(f, "  Mean tagger reward:   {:.3}", self.mean_tagger_reward)?;
        writeln!(f, "  Mean runner reward:   {:.3}", self.mean_runner_reward)?;
        write!(f, "  Truncated episodes:   {}", self.truncated)
    }
}
