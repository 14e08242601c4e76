//! Error types for annotator agreement

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AgreementError>;

/// Errors that can occur while loading, normalizing or comparing ratings
#[derive(Debug, Error)]
pub enum AgreementError {
    #[error("Failed to load ratings for '{annotator}': {reason}")]
    Load { annotator: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Invalid normalization policy '{0}' (expected 'binary' or 'intensity')")]
    InvalidPolicy(String),

    #[error("Annotator '{0}' has not been normalized")]
    NotNormalized(String),

    #[error("No valid dimensions for agreement between {0} and {1}")]
    NoValidDimensions(String, String),

    #[error("Row count mismatch: {left} has {left_rows} items, {right} has {right_rows}")]
    RowCountMismatch {
        left: String,
        left_rows: usize,
        right: String,
        right_rows: usize,
    },

    #[error("Dimension sets differ between {0} and {1}")]
    DimensionMismatch(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AgreementError {
    pub(crate) fn load(annotator: &str, reason: impl Into<String>) -> Self {
        AgreementError::Load {
            annotator: annotator.to_string(),
            reason: reason.into(),
        }
    }
}
