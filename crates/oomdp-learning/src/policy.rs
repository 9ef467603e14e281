//! Behavior policies for action selection

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use oomdp_core::{GroundedAction, OomdpError, Result, State};

use crate::{QComputable, QValue};

/// Chooses actions from the values a learner exposes
///
/// The learner lends its table for the duration of the call; a policy never
/// keeps a reference to it.
pub trait Policy: Send {
    /// Select an action for `state`
    fn select_action(&mut self, state: &State, q: &mut dyn QComputable) -> Result<GroundedAction>;
}

fn no_action(state: &State) -> OomdpError {
    OomdpError::NoApplicableAction(state.to_string())
}

/// First action with the largest value; ties go to the earliest action
fn greedy(values: &[QValue]) -> Option<&QValue> {
    values.iter().fold(None, |best: Option<&QValue>, qv| match best {
        Some(b) if b.q >= qv.q => Some(b),
        _ => Some(qv),
    })
}

/// Epsilon-greedy policy over the learner's values
pub struct EpsilonGreedy {
    /// Exploration rate
    epsilon: f64,
    rng: StdRng,
}

impl EpsilonGreedy {
    /// Create a new epsilon-greedy policy seeded from entropy
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self::with_rng(epsilon, StdRng::from_entropy())
    }

    /// Create a policy with a fixed seed
    #[must_use]
    pub fn with_seed(epsilon: f64, seed: u64) -> Self {
        Self::with_rng(epsilon, StdRng::seed_from_u64(seed))
    }

    fn with_rng(epsilon: f64, rng: StdRng) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
            rng,
        }
    }

    /// Current exploration rate
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Set the exploration rate
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }
}

impl Policy for EpsilonGreedy {
    fn select_action(&mut self, state: &State, q: &mut dyn QComputable) -> Result<GroundedAction> {
        let values = q.q_values(state)?;
        let chosen = if self.rng.gen::<f64>() < self.epsilon {
            // Explore: random action
            values.choose(&mut self.rng)
        } else {
            // Exploit: greedy action
            greedy(&values)
        };
        chosen.map(|qv| qv.action.clone()).ok_or_else(|| no_action(state))
    }
}

/// Always takes the highest-valued action
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyQPolicy;

impl Policy for GreedyQPolicy {
    fn select_action(&mut self, state: &State, q: &mut dyn QComputable) -> Result<GroundedAction> {
        let values = q.q_values(state)?;
        greedy(&values)
            .map(|qv| qv.action.clone())
            .ok_or_else(|| no_action(state))
    }
}

/// Random policy that always selects uniformly among applicable actions
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Create a new random policy
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a random policy with a fixed seed
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, state: &State, q: &mut dyn QComputable) -> Result<GroundedAction> {
        let values = q.q_values(state)?;
        values
            .choose(&mut self.rng)
            .map(|qv| qv.action.clone())
            .ok_or_else(|| no_action(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oomdp_core::{Action, ActionSignature};
    use std::collections::HashSet;
    use std::sync::Arc;

    struct Named(ActionSignature);

    impl Action for Named {
        fn signature(&self) -> &ActionSignature {
            &self.0
        }

        fn perform(&self, state: State, _params: &[String]) -> Result<State> {
            Ok(state)
        }
    }

    /// Fixed values regardless of state
    struct Fixed(Vec<QValue>);

    impl QComputable for Fixed {
        fn q_values(&mut self, _state: &State) -> Result<Vec<QValue>> {
            Ok(self.0.clone())
        }

        fn q_value(&mut self, state: &State, action: &GroundedAction) -> Result<QValue> {
            self.0
                .iter()
                .find(|qv| qv.action == *action)
                .cloned()
                .ok_or_else(|| OomdpError::MissingActionValue {
                    action: action.to_string(),
                    state: state.to_string(),
                })
        }
    }

    fn values(qs: &[(&str, f64)]) -> Fixed {
        Fixed(
            qs.iter()
                .map(|(name, q)| QValue {
                    action: GroundedAction::new(
                        Arc::new(Named(ActionSignature::new(*name, &[] as &[&str]))),
                        Vec::new(),
                    ),
                    q: *q,
                })
                .collect(),
        )
    }

    #[test]
    fn greedy_breaks_ties_by_order() {
        let mut q = values(&[("a", 1.0), ("b", 2.0), ("c", 2.0)]);
        let action = GreedyQPolicy.select_action(&State::new(), &mut q).unwrap();
        assert_eq!(action.name(), "b");
    }

    #[test]
    fn zero_epsilon_is_greedy() {
        let mut q = values(&[("a", 0.0), ("b", 5.0)]);
        let mut policy = EpsilonGreedy::with_seed(0.0, 3);
        for _ in 0..20 {
            assert_eq!(policy.select_action(&State::new(), &mut q).unwrap().name(), "b");
        }
    }

    #[test]
    fn full_epsilon_explores_every_action() {
        let mut q = values(&[("a", 0.0), ("b", 5.0), ("c", 1.0)]);
        let mut policy = EpsilonGreedy::with_seed(1.0, 11);
        let seen: HashSet<String> = (0..200)
            .map(|_| {
                policy
                    .select_action(&State::new(), &mut q)
                    .unwrap()
                    .name()
                    .to_string()
            })
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn empty_action_set_is_an_error() {
        let mut q = values(&[]);
        assert!(matches!(
            RandomPolicy::with_seed(1).select_action(&State::new(), &mut q),
            Err(OomdpError::NoApplicableAction(_))
        ));
    }

    #[test]
    fn epsilon_is_clamped() {
        let mut policy = EpsilonGreedy::new(2.0);
        assert_eq!(policy.epsilon(), 1.0);
        policy.set_epsilon(-0.5);
        assert_eq!(policy.epsilon(), 0.0);
    }
}
