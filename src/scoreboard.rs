//! Process-wide score aggregate.
//!
//! The [`Scoreboard`] is a cloneable handle created once at startup and
//! injected into every arena that should report to it. Arenas record one
//! [`Outcome`] per episode and push the running reward pair every tick; a
//! display reads [`Scoreboard::snapshot`]. Nothing in the simulation reads it
//! back.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Winner of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    TaggerWon,
    RunnerWon,
    GoalReached,
    GoalFailed,
    /// Both agents failed on the same tick.
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::TaggerWon => write!(f, "tagger_won"),
            Outcome::RunnerWon => write!(f, "runner_won"),
            Outcome::GoalReached => write!(f, "goal_reached"),
            Outcome::GoalFailed => write!(f, "goal_failed"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Counters held by the scoreboard.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreSnapshot {
    pub tagger_wins: u32,
    pub runner_wins: u32,
    pub goals_reached: u32,
    pub goals_failed: u32,
    pub draws: u32,
    pub total_rounds: u32,
    /// Latest cumulative episode reward of the tagger (or goal seeker).
    pub tagger_reward: f32,
    /// Latest cumulative episode reward of the runner.
    pub runner_reward: f32,
}

impl ScoreSnapshot {
    fn rate(count: u32, total: u32) -> f32 {
        if total > 0 {
            count as f32 / total as f32 * 100.0
        } else {
            0.0
        }
    }

    /// Percentage of rounds won by the tagger.
    pub fn tagger_win_rate(&self) -> f32 {
        Self::rate(self.tagger_wins, self.total_rounds)
    }

    pub fn runner_win_rate(&self) -> f32 {
        Self::rate(self.runner_wins, self.total_rounds)
    }

    pub fn goal_success_rate(&self) -> f32 {
        Self::rate(self.goals_reached, self.total_rounds)
    }
}

impl fmt::Display for ScoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tagger Wins: {}", self.tagger_wins)?;
        writeln!(f, "Runner Wins: {}", self.runner_wins)?;
        if self.goals_reached + self.goals_failed > 0 {
            writeln!(
                f,
                "Goals: {} reached / {} failed",
                self.goals_reached, self.goals_failed
            )?;
        }
        if self.draws > 0 {
            writeln!(f, "Draws: {}", self.draws)?;
        }
        writeln!(f, "Total Rounds: {}", self.total_rounds)?;
        writeln!(f, "Tagger Win Rate: {:.1}%", self.tagger_win_rate())?;
        write!(f, "Runner Win Rate: {:.1}%", self.runner_win_rate())
    }
}

/// Shared handle to the score aggregate.
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    inner: Arc<Mutex<ScoreSnapshot>>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScoreSnapshot> {
        // A poisoned lock still guards consistent counters.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the result of one episode.
    pub fn record_outcome(&self, outcome: Outcome) {
        let mut s = self.lock();
        match outcome {
            Outcome::TaggerWon => s.tagger_wins += 1,
            Outcome::RunnerWon => s.runner_wins += 1,
            Outcome::GoalReached => s.goals_reached += 1,
            Outcome::GoalFailed => s.goals_failed += 1,
            Outcome::Draw => s.draws += 1,
        }
        s.total_rounds += 1;
        tracing::info!(
            %outcome,
            tagger_wins = s.tagger_wins,
            runner_wins = s.runner_wins,
            draws = s.draws,
            total = s.total_rounds,
            "round recorded"
        );
    }

    /// Publishes the running episode rewards.
    pub fn update_rewards(&self, tagger: f32, runner: f32) {
        let mut s = self.lock();
        s.tagger_reward = tagger;
        s.runner_reward = runner;
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        *self.lock()
    }

    /// Clears every counter.
    pub fn reset(&self) {
        *self.lock() = ScoreSnapshot::default();
    }
}
