//! Episode records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{GroundedAction, State};

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    /// Still being recorded
    Running,
    /// A terminal state was reached
    Terminal,
    /// The step cap was hit first
    StepBudgetExhausted,
}

impl EpisodeStatus {
    /// Whether the episode is over
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One recorded step of an episode
#[derive(Debug, Clone)]
pub struct EpisodeTransition {
    /// Action taken
    pub action: GroundedAction,
    /// State the action led to
    pub state: State,
    /// Reward received (cumulative discounted reward for options)
    pub reward: f64,
}

/// An initial state followed by the transitions of one run
#[derive(Debug, Clone)]
pub struct EpisodeAnalysis {
    /// Episode ID
    pub id: Uuid,
    /// Starting state
    pub initial_state: State,
    /// Ordered transitions
    pub transitions: Vec<EpisodeTransition>,
    /// Outcome of the run
    pub status: EpisodeStatus,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time
    pub end_time: Option<DateTime<Utc>>,
}

impl EpisodeAnalysis {
    /// Start recording from `initial_state`
    #[must_use]
    pub fn new(initial_state: State) -> Self {
        Self {
            id: Uuid::new_v4(),
            initial_state,
            transitions: Vec::new(),
            status: EpisodeStatus::Running,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Record a transition into `state`
    pub fn record_transition_to(&mut self, state: State, action: GroundedAction, reward: f64) {
        self.transitions.push(EpisodeTransition {
            action,
            state,
            reward,
        });
    }

    /// Close the record
    pub fn finish(&mut self, status: EpisodeStatus) {
        self.status = status;
        self.end_time = Some(Utc::now());
    }

    /// Every visited state, starting with the initial one
    #[must_use]
    pub fn states(&self) -> Vec<&State> {
        std::iter::once(&self.initial_state)
            .chain(self.transitions.iter().map(|t| &t.state))
            .collect()
    }

    /// Actions in the order taken
    #[must_use]
    pub fn actions(&self) -> Vec<&GroundedAction> {
        self.transitions.iter().map(|t| &t.action).collect()
    }

    /// Rewards in the order received
    #[must_use]
    pub fn rewards(&self) -> Vec<f64> {
        self.transitions.iter().map(|t| t.reward).collect()
    }

    /// Last visited state
    #[must_use]
    pub fn last_state(&self) -> &State {
        self.transitions
            .last()
            .map_or(&self.initial_state, |t| &t.state)
    }

    /// Number of recorded states (transitions plus one)
    #[must_use]
    pub fn num_time_steps(&self) -> usize {
        self.transitions.len() + 1
    }

    /// Number of recorded transitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if no transition was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Sum of rewards
    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.transitions.iter().map(|t| t.reward).sum()
    }

    /// Discounted return from the initial state
    #[must_use]
    pub fn discounted_return(&self, gamma: f64) -> f64 {
        self.returns(gamma).first().copied().unwrap_or(0.0)
    }

    /// Discounted return from each recorded step onward
    #[must_use]
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut running_return = 0.0;

        for i in (0..self.len()).rev() {
            running_return = self.transitions[i].reward + gamma * running_return;
            returns[i] = running_return;
        }

        returns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, ActionSignature, Result};
    use approx::assert_relative_eq;
    use std::sync::Arc;

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
    fn returns_are_discounted_backwards() {
        let wait = GroundedAction::new(
            Arc::new(Wait(ActionSignature::new("wait", &[] as &[&str]))),
            Vec::new(),
        );
        let mut episode = EpisodeAnalysis::new(State::new());
        episode.record_transition_to(State::new(), wait.clone(), 0.0);
        episode.record_transition_to(State::new(), wait, 1.0);
        episode.finish(EpisodeStatus::Terminal);

        assert_eq!(episode.num_time_steps(), 3);
        assert_eq!(episode.actions().len(), 2);
        assert_relative_eq!(episode.discounted_return(0.9), 0.9);
        assert_relative_eq!(episode.total_reward(), 1.0);
        assert!(episode.status.is_finished());
        assert!(episode.end_time.is_some());
    }
}
