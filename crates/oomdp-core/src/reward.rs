//! Reward signals, reward functions and terminal functions

use serde::{Deserialize, Serialize};

use crate::{GroundedAction, State};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::Mul<f64> for Reward {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

/// Reward for a state, action, next-state transition
pub trait RewardFunction: Send + Sync {
    /// Compute reward for a transition
    fn reward(&self, state: &State, action: &GroundedAction, next_state: &State) -> Reward;
}

impl<F> RewardFunction for F
where
    F: Fn(&State, &GroundedAction, &State) -> f64 + Send + Sync,
{
    fn reward(&self, state: &State, action: &GroundedAction, next_state: &State) -> Reward {
        Reward(self(state, action, next_state))
    }
}

/// Decides whether a state ends the episode
pub trait TerminalFunction: Send + Sync {
    /// Whether `state` is terminal
    fn is_terminal(&self, state: &State) -> bool;
}

impl<F> TerminalFunction for F
where
    F: Fn(&State) -> bool + Send + Sync,
{
    fn is_terminal(&self, state: &State) -> bool {
        self(state)
    }
}

/// Terminal function for continuing tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTermination;

impl TerminalFunction for NullTermination {
    fn is_terminal(&self, _state: &State) -> bool {
        false
    }
}

/// Constant reward on every transition
#[derive(Debug, Clone, Copy)]
pub struct UniformCostReward(pub f64);

impl RewardFunction for UniformCostReward {
    fn reward(&self, _state: &State, _action: &GroundedAction, _next_state: &State) -> Reward {
        Reward(self.0)
    }
}

/// Shaped reward function that adds a potential-based shaping term
pub struct ShapedReward<R, F> {
    /// Base reward function
    pub base: R,
    /// Potential function
    pub potential: F,
    /// Discount used by the shaping term
    pub gamma: f64,
}

impl<R, F> ShapedReward<R, F> {
    /// Wrap `base` with potential `potential`
    pub fn new(base: R, potential: F, gamma: f64) -> Self {
        Self {
            base,
            potential,
            gamma,
        }
    }
}

impl<R, F> RewardFunction for ShapedReward<R, F>
where
    R: RewardFunction,
    F: Fn(&State) -> f64 + Send + Sync,
{
    fn reward(&self, state: &State, action: &GroundedAction, next_state: &State) -> Reward {
        let base_reward = self.base.reward(state, action, next_state);
        let shaping = self.gamma * (self.potential)(next_state) - (self.potential)(state);
        Reward(base_reward.0 + shaping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, ActionSignature, ObjectClass, ObjectInstance, Result};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn tokens(n: usize) -> State {
        let class = Arc::new(ObjectClass::new("token", Vec::new()));
        let mut state = State::new();
        for i in 0..n {
            state
                .add_object(ObjectInstance::new(format!("t{i}"), Arc::clone(&class)))
                .unwrap();
        }
        state
    }

    struct Wait(ActionSignature);

    impl Action for Wait {
        fn signature(&self) -> &ActionSignature {
            &self.0
        }

        fn perform(&self, state: State, _params: &[String]) -> Result<State> {
            Ok(state)
        }
    }

    #[test]
    fn shaping_adds_potential_difference() {
        let action = GroundedAction::new(
            Arc::new(Wait(ActionSignature::new("wait", &[] as &[&str]))),
            Vec::new(),
        );
        let shaped = ShapedReward::new(UniformCostReward(-1.0), |s: &State| s.len() as f64, 0.5);
        let state = tokens(1);
        let next = tokens(3);
        // -1 + 0.5 * 3 - 1
        assert_relative_eq!(shaped.reward(&state, &action, &next).value(), -0.5);
        // -1 + 0.5 * 3 - 3
        assert_relative_eq!(shaped.reward(&next, &action, &next).value(), -2.5);
    }

    #[test]
    fn rewards_scale_and_sum() {
        let total = Reward(1.0) + Reward(2.0) * 0.5;
        assert_relative_eq!(total.value(), 2.0);
    }

    #[test]
    fn closures_are_terminal_functions() {
        let tf = |s: &State| s.is_empty();
        assert!(tf.is_terminal(&State::new()));
        assert!(!NullTermination.is_terminal(&State::new()));
    }
}
