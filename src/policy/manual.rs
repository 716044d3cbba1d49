//! Manual control.
//!
//! Maps keyboard-axis state onto the same [`ActionRecord`] a trained policy
//! would produce, so a human can drive either agent for testing.

use super::trait_::Policy;
use crate::action::ActionRecord;
use crate::config::MovementScheme;

/// Keyboard-axis state for one frame.
///
/// `vertical` is W/S or Up/Down, `horizontal` is A/D or Left/Right, each in
/// `[-1, 1]`; `jump` is the space bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualInput {
    pub vertical: f32,
    pub horizontal: f32,
    pub jump: bool,
}

impl ManualInput {
    /// Maps the axes onto action channels for `scheme`.
    ///
    /// Forward/turn: vertical drives forward, horizontal turns.
    /// Planar: horizontal is world X, vertical is world Z.
    pub fn to_action(&self, scheme: MovementScheme) -> ActionRecord {
        match scheme {
            MovementScheme::ForwardTurn => {
                ActionRecord::new(self.vertical, self.horizontal, self.jump)
            }
            MovementScheme::Planar => ActionRecord::new(self.horizontal, self.vertical, self.jump),
        }
    }
}

/// Policy fed from an input device.
///
/// Drives one agent (or every agent) with the latest [`ManualInput`]; agents
/// it does not control receive idle actions.
pub struct ManualPolicy {
    scheme: MovementScheme,
    controlled: Option<usize>,
    input: ManualInput,
}

impl ManualPolicy {
    /// Controls every agent.
    pub fn new(scheme: MovementScheme) -> Self {
        Self {
            scheme,
            controlled: None,
            input: ManualInput::default(),
        }
    }

    /// Controls only the agent at `index`.
    pub fn controlling(scheme: MovementScheme, index: usize) -> Self {
        Self {
            controlled: Some(index),
            ..Self::new(scheme)
        }
    }

    /// Latches the input used by the next `select_actions`.
    pub fn set_input(&mut self, input: ManualInput) {
        self.input = input;
    }

    pub fn input(&self) -> ManualInput {
        self.input
    }
}

impl Policy for ManualPolicy {
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<ActionRecord> {
        let action = self.input.to_action(self.scheme);
        (0..observations.len())
            .map(|i| match self.controlled {
                Some(index) if index != i => ActionRecord::idle(),
                _ => action,
            })
            .collect()
    }

    fn name(&self) -> &str {
        "manual"
    }
}
