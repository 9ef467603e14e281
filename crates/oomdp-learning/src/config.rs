//! Engine configuration

use oomdp_core::{OomdpError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::QLearning`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Discount factor, in `[0, 1)`
    pub gamma: f64,
    /// Learning rate, in `(0, 1]`
    pub learning_rate: f64,
    /// Value given to every state-action pair on first visit
    pub q_init: f64,
    /// Step cap per learning episode
    pub max_episode_size: usize,
    /// Exploration rate of the default epsilon-greedy policy
    pub epsilon: f64,
    /// Episode budget of one planning call
    pub max_episodes_for_planning: usize,
    /// Planning stops once an episode's largest value change is at or
    /// below this; 0 disables early stopping
    pub max_delta_for_termination: f64,
    /// Capacity of the rolling episode history
    pub episodes_to_store: usize,
    /// Seed for the default policy's random number generator
    pub seed: Option<u64>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            learning_rate: 0.1,
            q_init: 0.0,
            max_episode_size: 1000,
            epsilon: 0.1,
            max_episodes_for_planning: 1,
            max_delta_for_termination: 0.0,
            episodes_to_store: 1,
            seed: None,
        }
    }
}

impl QLearningConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the construction-time ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(OomdpError::InvalidConfig(format!(
                "gamma must be in [0, 1), got {}",
                self.gamma
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(OomdpError::InvalidConfig(format!(
                "learning rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(OomdpError::InvalidConfig(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        if !self.q_init.is_finite() {
            return Err(OomdpError::InvalidConfig("initial value must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_takes_defaults() {
        let config = QLearningConfig::from_json_str(r#"{"gamma": 0.9, "seed": 7}"#).unwrap();
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.learning_rate, QLearningConfig::default().learning_rate);
    }

    #[test]
    fn gamma_of_one_is_rejected() {
        let config = QLearningConfig {
            gamma: 1.0,
            ..QLearningConfig::default()
        };
        assert!(matches!(config.validate(), Err(OomdpError::InvalidConfig(_))));
    }

    #[test]
    fn zero_learning_rate_is_rejected() {
        let config = QLearningConfig {
            learning_rate: 0.0,
            ..QLearningConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip_keeps_values() {
        let config = QLearningConfig {
            epsilon: 0.25,
            episodes_to_store: 4,
            ..QLearningConfig::default()
        };
        let parsed = QLearningConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
