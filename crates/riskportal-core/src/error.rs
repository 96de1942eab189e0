//! Core error types for riskportal-core.
//!
//! Each concern has its own thiserror enum; [`CoreError`] aggregates them
//! so action boundaries (save, submit, upload) can convert everything into
//! one user-visible message.

use std::path::PathBuf;
use thiserror::Error;

use crate::questionnaire::QuestionId;
use crate::questionnaire::validator::ValidationFailure;

/// Core error type for riskportal-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Question normalization errors
    #[error("Question error: {0}")]
    Question(#[from] QuestionError),

    /// Backend request errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// File upload errors
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Wizard state-machine errors
    #[error("{0}")]
    Wizard(#[from] WizardError),

    /// RA-team scoring errors
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential / role errors
    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A raw question record that cannot be turned into a [`crate::Question`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuestionError {
    #[error("Question {id}: {reason}")]
    Malformed { id: QuestionId, reason: String },
}

/// Errors raised by a [`crate::gateway::SubmissionGateway`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport failure before a status was received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Endpoint URL could not be built from the configured base
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Local file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials do not allow the request; nothing was sent
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
}

impl GatewayError {
    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// File upload errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    /// The questionnaire has not been created/fetched yet.
    #[error("Questionnaire not initialized properly: questionnaire id missing")]
    PrerequisiteMissing,

    #[error("Question {0} is not a file-upload question")]
    NotFileQuestion(QuestionId),

    #[error("No upload in progress for question {0}")]
    NoActiveUpload(QuestionId),

    #[error("File {file_name} is {size_mb:.1} MB, limit is {limit_mb} MB")]
    TooLarge {
        file_name: String,
        size_mb: f64,
        limit_mb: u64,
    },

    #[error("Upload failed: {0}")]
    Failed(String),
}

/// Wizard transition errors.
#[derive(Error, Debug)]
pub enum WizardError {
    /// The section being left has unanswered or invalid questions.
    #[error("Please complete all questions in the current section before proceeding ({} issue(s))", failures.len())]
    ValidationFailed { failures: Vec<ValidationFailure> },

    /// Submit found required questions unanswered somewhere in the questionnaire.
    #[error("Please answer all questions. Missing answers for: {}", missing.join(", "))]
    IncompleteSubmission {
        missing: Vec<String>,
        failures: Vec<ValidationFailure>,
    },

    #[error("Submit is only available from the last section")]
    NotOnLastSection,

    #[error("No section at position {0}")]
    InvalidPosition(String),

    #[error("Questionnaire has no questions")]
    EmptyQuestionnaire,

    /// Another save/submit is still in flight.
    #[error("A {action} is already in progress")]
    Busy { action: &'static str },

    #[error("Unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("Answer does not fit question {id}: expected {expected}")]
    AnswerMismatch { id: QuestionId, expected: &'static str },

    #[error("Questionnaire already submitted; answers can no longer be modified")]
    AlreadySubmitted,

    #[error("Action cancelled")]
    Cancelled,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// RA-team scoring errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    #[error("Score for question {id} must be between 0 and 10, got {score}")]
    ScoreOutOfRange { id: QuestionId, score: f64 },

    #[error("Question {0} does not require scoring")]
    NotScoreable(QuestionId),

    #[error("Scores missing for questions: {}", join_ids(.0))]
    MissingScores(Vec<QuestionId>),
}

fn join_ids(ids: &[QuestionId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration schema
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Configuration directory could not be resolved or created
    #[error("Configuration directory unavailable: {0}")]
    DataDir(String),
}

/// Credential and role errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("No bearer token configured; set auth.token or pass --token")]
    MissingToken,

    #[error("Unknown role '{0}' (expected Vendor or RA_Team)")]
    UnknownRole(String),

    #[error("Role {actual} may not perform this action (requires {required})")]
    Forbidden {
        required: crate::auth::Role,
        actual: crate::auth::Role,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
