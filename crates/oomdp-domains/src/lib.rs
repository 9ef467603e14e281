//! Reference object-oriented MDP domains
//!
//! This crate provides:
//! - A grid world with walls and optional slip
//! - An N-state chain with an optional multi-step option

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chain;
pub mod gridworld;

pub use chain::{Chain, ChainEnd, ChainReward};
pub use gridworld::{GoalReached, GoalReward, GridWorld};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Chain, GoalReached, GoalReward, GridWorld};
    pub use oomdp_core::prelude::*;
}
