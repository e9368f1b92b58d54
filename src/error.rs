//! Error types for the template scan-and-fill engine.
//!
//! Every failure surfaced to a caller carries a stable machine-readable
//! code (see [`FillerError::code`]) so that transports can map errors
//! without parsing messages.

use crate::domain::ValidationFailure;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations.
pub type FillerResult<T> = Result<T, FillerError>;

/// Boxed source error carried by backend failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all scan, query and fill operations.
#[derive(Debug, Error)]
pub enum FillerError {
    /// Referenced document identity is unknown to the document store
    #[error("Document '{id}' not found")]
    NotFound { id: String },

    /// Document has no recorded placeholders, so a fill is meaningless
    #[error("Document '{id}' has no recorded placeholders")]
    NoLocations { id: String },

    /// Fill request key set or values rejected
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Underlying document bytes are unreadable or corrupt
    #[error("Failed to read document: {reason}")]
    ReadFailure {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Output conversion failed after a successful fill
    #[error("Format conversion failed: {reason}")]
    ConversionFailed { reason: String },

    /// Document is a generated output and cannot be scanned or filled
    #[error("Document '{id}' is not a template")]
    NotTemplate { id: String },

    /// Invalid request parameter
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Storage backend I/O failure
    #[error("Storage error for path '{}': {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Persisted metadata could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be loaded
    #[error("Configuration error for '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl FillerError {
    /// Builds a [`FillerError::ReadFailure`] wrapping a backend error.
    pub fn read_failure<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ReadFailure {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub fn invalid_input(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code for transports and the CLI.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NoLocations { .. } => "NO_LOCATIONS",
            Self::Validation(failure) => failure.code(),
            Self::ReadFailure { .. } => "READ_FAILURE",
            Self::ConversionFailed { .. } => "CONVERSION_FAILED",
            Self::NotTemplate { .. } => "NOT_TEMPLATE",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Returns true when the caller must correct the request before retrying.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NoLocations { .. }
                | Self::Validation(_)
                | Self::NotTemplate { .. }
                | Self::InvalidInput { .. }
        )
    }
}

impl From<zip::result::ZipError> for FillerError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::read_failure("invalid document package", err)
    }
}

impl From<quick_xml::Error> for FillerError {
    fn from(err: quick_xml::Error) -> Self {
        Self::read_failure("malformed document markup", err)
    }
}
