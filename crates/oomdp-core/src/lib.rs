//! Core object-oriented MDP types
//!
//! States are collections of typed, classed objects. This crate provides
//! the schema (attributes, classes, actions), grounded actions and options,
//! and the order-invariant state keys that let a tabular learner treat
//! structurally identical states as one.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod attribute;
pub mod domain;
pub mod episode;
pub mod error;
pub mod hashing;
pub mod object;
pub mod option;
pub mod reward;
pub mod state;

// Re-export core traits and types
pub use action::{
    ground_action, sample_transition, validate_transitions, Action, ActionKind, ActionOutcome,
    ActionSignature, GroundedAction, TransitionProbability,
};
pub use attribute::{Attribute, AttributeKind, Value};
pub use domain::{Domain, DomainBuilder};
pub use episode::{EpisodeAnalysis, EpisodeStatus, EpisodeTransition};
pub use error::{OomdpError, Result};
pub use hashing::{AttributeSelection, HashedState, StateHashFactory, StateKey};
pub use object::{ObjectClass, ObjectInstance};
pub use option::MacroOption;
pub use reward::{
    NullTermination, Reward, RewardFunction, ShapedReward, TerminalFunction, UniformCostReward,
};
pub use state::{ObjectMatching, State};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionKind, ActionSignature, Attribute, AttributeSelection, Domain,
        GroundedAction, ObjectInstance, Result, Reward, RewardFunction, State,
        TerminalFunction, Value,
    };
}
