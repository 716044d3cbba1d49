//! Stuck watchdog.
//!
//! Converts an agent wedged against geometry into a recoverable episode
//! failure instead of an episode that never ends.

use glam::Vec3;

use crate::config::StuckConfig;

/// Result of feeding one tick's position into a [`StuckTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StuckStatus {
    /// Displacement above threshold this tick.
    Moving,
    /// Still, but not for long enough to be flagged.
    Settling { still_frames: u32 },
    /// Flagged stuck for `elapsed` simulated seconds.
    Stuck { elapsed: f32 },
    /// Stuck longer than the configured timeout.
    TimedOut { elapsed: f32 },
}

impl StuckStatus {
    /// Whether the per-tick stuck penalty applies.
    pub fn is_stuck(&self) -> bool {
        matches!(self, StuckStatus::Stuck { .. } | StuckStatus::TimedOut { .. })
    }
}

/// Per-agent stuck detection state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StuckTracker {
    last_position: Option<Vec3>,
    still_frames: u32,
    /// Simulated time at which the agent was first flagged stuck.
    stuck_since: Option<f32>,
}

impl StuckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn still_frames(&self) -> u32 {
        self.still_frames
    }

    pub fn stuck_since(&self) -> Option<f32> {
        self.stuck_since
    }

    /// Records `position` at simulated time `now` and classifies the agent.
    ///
    /// The timeout is measured from the tick the agent was first flagged
    /// stuck, not from the start of the episode. Any tick with enough
    /// displacement clears the whole state.
    pub fn observe(&mut self, position: Vec3, now: f32, config: &StuckConfig) -> StuckStatus {
        let Some(last) = self.last_position.replace(position) else {
            return StuckStatus::Moving;
        };

        if position.distance(last) >= config.displacement_threshold {
            self.still_frames = 0;
            self.stuck_since = None;
            return StuckStatus::Moving;
        }

        self.still_frames += 1;
        if self.still_frames <= config.frames {
            return StuckStatus::Settling {
                still_frames: self.still_frames,
            };
        }

        let since = *self.stuck_since.get_or_insert(now);
        let elapsed = now - since;
        if elapsed > config.timeout_secs {
            StuckStatus::TimedOut { elapsed }
        } else {
            StuckStatus::Stuck { elapsed }
        }
    }
}
