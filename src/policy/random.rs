//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::Policy;
use crate::action::ActionRecord;

/// Uniformly random continuous actions.
///
/// Each agent independently draws both movement channels from `[-1, 1]` and
/// jumps with probability `jump_probability`. Used for sanity checks and as a
/// lower-bound baseline.
pub struct RandomPolicy {
    rng: StdRng,
    jump_probability: f64,
}

impl RandomPolicy {
    /// Creates a seeded random policy.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            jump_probability: 0.05,
        }
    }

    pub fn with_jump_probability(mut self, p: f64) -> Self {
        self.jump_probability = p.clamp(0.0, 1.0);
        self
    }
}

impl Policy for RandomPolicy {
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<ActionRecord> {
        (0..observations.len())
            .map(|_| {
                ActionRecord::new(
                    self.rng.gen_range(-1.0..=1.0),
                    self.rng.gen_range(-1.0..=1.0),
                    self.rng.gen_bool(self.jump_probability),
                )
            })
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_policy_returns_correct_count() {
        let mut policy = RandomPolicy::new(0);
        let obs = vec![vec![0.0; 25]; 2];
        assert_eq!(policy.select_actions(&obs).len(), 2);
    }

    #[test]
    fn random_policy_actions_in_range() {
        let mut policy = RandomPolicy::new(3);
        let obs = vec![vec![0.0; 25]; 100];
        for a in policy.select_actions(&obs) {
            assert!((-1.0..=1.0).contains(&a.primary));
            assert!((-1.0..=1.0).contains(&a.secondary));
        }
    }

    #[test]
    fn same_seed_same_actions() {
        let obs = vec![vec![0.0; 21]; 4];
        let a = RandomPolicy::new(8).select_actions(&obs);
        let b = RandomPolicy::new(8).select_actions(&obs);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_jump_probability_never_jumps() {
        let mut policy = RandomPolicy::new(1).with_jump_probability(0.0);
        let obs = vec![vec![0.0; 21]; 50];
        assert!(policy.select_actions(&obs).iter().all(|a| !a.jump));
    }
}
