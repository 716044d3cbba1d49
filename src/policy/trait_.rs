//! Policy trait for the arenas.

use crate::action::ActionRecord;

/// Something that picks actions from observations: a trained network, a
/// scripted baseline or a human at the keyboard.
///
/// The call is synchronous; the arena waits for it.
pub trait Policy: Send + Sync {
    /// Selects one action per agent given their observations.
    ///
    /// # Arguments
    ///
    /// * `observations` - Per-agent observation vectors, in agent order
    ///
    /// # Returns
    ///
    /// One [`ActionRecord`] per observation.
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<ActionRecord>;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
