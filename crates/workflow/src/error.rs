use crate::committer::PendingCommit;
use thiserror::Error;
use wtsplit_matrix::{MatrixError, ValidationError};
use wtsplit_session::SessionError;

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Failures talking to the computation service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("Service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected JSON
    #[error("Failed to decode service response: {0}")]
    Decode(#[from] serde_json::Error),

    /// JSON decoded but does not make sense for the request
    #[error("Malformed service response: {0}")]
    Malformed(String),
}

impl ServiceError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Errors surfaced by the workflow orchestrator
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Computation service error: {0}")]
    Service(#[from] ServiceError),

    /// Split applied but the new rows have no codes yet
    #[error("Split applied but code derivation failed: {source}")]
    CodeDerivation {
        pending: Box<PendingCommit>,
        #[source]
        source: ServiceError,
    },

    /// Diagnostics export needs confirmed breakpoints in automatic mode
    #[error("Nothing to export: {0}")]
    NothingToExport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for WorkflowError {
    fn from(err: ValidationError) -> Self {
        Self::Session(SessionError::Validation(err))
    }
}

impl WorkflowError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Stable snake_case classification for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            Self::Matrix(err) => match err {
                MatrixError::InvalidSplitValue { .. } => "invalid_split_value",
                MatrixError::RowOutOfRange { .. } | MatrixError::LevelOutOfRange { .. } => {
                    "out_of_range"
                }
                _ => "invalid_matrix",
            },
            Self::Session(err) => match err {
                SessionError::Validation(_) => "validation_error",
                SessionError::StaleResponse { .. } => "stale_response",
                SessionError::RequestPending => "request_pending",
                SessionError::NotOpen => "session_not_open",
                _ => "invalid_session_event",
            },
            Self::Service(_) => "remote_failure",
            Self::CodeDerivation { .. } => "code_derivation_failed",
            Self::NothingToExport(_) => "nothing_to_export",
            Self::InvalidConfig(_) | Self::ConfigParse(_) => "invalid_config",
            Self::Io(_) => "io_error",
        }
    }
}
