//! Tabular learning over object-oriented MDPs
//!
//! This crate provides:
//! - A value table keyed by order-invariant state keys
//! - Epsilon-greedy, greedy and random behavior policies
//! - A Q-learning engine whose update handles both primitive actions and options

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod history;
pub mod policy;
pub mod qlearning;
pub mod table;

pub use config::QLearningConfig;
pub use history::EpisodeHistory;
pub use policy::{EpsilonGreedy, GreedyQPolicy, Policy, RandomPolicy};
pub use qlearning::{PlanningReport, QLearning};
pub use table::{QComputable, QSlot, QTable, QValue};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EpsilonGreedy, GreedyQPolicy, Policy, QComputable, QLearning, QLearningConfig, QValue,
    };
    pub use oomdp_core::prelude::*;
}
