//! Error types for concept editing

use thiserror::Error;

/// Result type for concept editing operations
pub type Result<T> = std::result::Result<T, ConceptError>;

/// Errors that can occur while resolving prompts or computing guided losses
#[derive(Debug, Error)]
pub enum ConceptError {
    /// A required field is absent from a raw prompt record
    #[error("Record {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// A present field has the wrong type or an out-of-range value
    #[error("Record {index}: invalid field '{field}': {reason}")]
    Schema {
        index: usize,
        field: String,
        reason: String,
    },

    /// No prompt records were supplied
    #[error("prompts file is empty")]
    EmptyConfig,

    /// Action literal outside {erase, enhance}
    #[error("Unknown action '{0}': expected 'erase' or 'enhance'")]
    UnknownAction(String),

    /// Latent shapes disagree
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Embedding unavailable or encoder failure
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Prompts document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConceptError {
    /// Schema error for a field of a record
    pub(crate) fn schema(index: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            index,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ConceptError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<serde_yaml::Error> for ConceptError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
