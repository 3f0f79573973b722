//! Error types for Agent Studio.

use uuid::Uuid;

use crate::wizard::schema::StepValidation;
use crate::wizard::state::{WizardStatus, WizardStep};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Agent store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store refused the request (e.g. a simulated backend failure).
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Draft persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Draft storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize draft: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Wizard flow errors. None of these are fatal: the session stays usable.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Step {step} has {} invalid field(s)", errors.len())]
    StepInvalid {
        step: WizardStep,
        errors: StepValidation,
    },

    #[error("Cannot jump ahead from step {current} to step {target}")]
    JumpAhead { current: u8, target: u8 },

    #[error("Invalid step number: {0}")]
    InvalidStep(u8),

    #[error("Submission is only allowed from the final step (currently at {current})")]
    NotAtFinalStep { current: WizardStep },

    #[error("Wizard is closed ({status})")]
    Closed { status: WizardStatus },

    #[error("Wizard session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Failed to save draft: {0}")]
    Draft(#[from] DraftError),

    #[error("Agent creation failed: {0}")]
    Submission(#[from] StoreError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
