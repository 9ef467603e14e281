//! Error types for the OO-MDP core library

use thiserror::Error;

/// Core error type for OO-MDP operations
#[derive(Error, Debug)]
pub enum OomdpError {
    /// Schema violation: bad declarations or bindings that disagree with them
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Object identifier not present in a state
    #[error("Unknown object: {0}")]
    UnknownObject(String),

    /// Attribute not declared on an object class
    #[error("Unknown attribute {attribute} for class {class}")]
    UnknownAttribute {
        /// Class that was searched
        class: String,
        /// Attribute that was asked for
        attribute: String,
    },

    /// Object class not declared in the domain
    #[error("Unknown object class: {0}")]
    UnknownClass(String),

    /// Action not registered in the domain
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Two objects in one state share an identifier
    #[error("Duplicate object identifier: {0}")]
    DuplicateObject(String),

    /// An action was queried that the state's action set does not contain
    #[error("No value for action {action} in state {state}")]
    MissingActionValue {
        /// Action that was looked up
        action: String,
        /// State it was looked up in
        state: String,
    },

    /// A policy was asked to act in a state without applicable actions
    #[error("No applicable action in state {0}")]
    NoApplicableAction(String),

    /// Two states could not be put in object correspondence
    #[error("No object matching: {0}")]
    NoMatching(String),

    /// Outcome distribution is malformed
    #[error("Invalid transition distribution: {0}")]
    InvalidTransitions(String),

    /// Configuration value out of its legal range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for OO-MDP operations
pub type Result<T> = std::result::Result<T, OomdpError>;
