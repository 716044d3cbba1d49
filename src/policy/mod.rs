//! Decision sources: the [`Policy`] trait and baseline implementations.

pub mod heuristic;
pub mod manual;
pub mod random;
pub mod trait_;

pub use heuristic::HeuristicPolicy;
pub use manual::{ManualInput, ManualPolicy};
pub use random::RandomPolicy;
pub use trait_::Policy;
