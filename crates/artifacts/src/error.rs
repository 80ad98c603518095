//! Artifact error types

use contracts::ContractError;
use thiserror::Error;

/// Artifact-specific errors
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Directory or file could not be created or written
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized
    #[error("failed to serialize '{path}': {message}")]
    Serialize { path: String, message: String },

    /// Missing or malformed input artifact (from contract)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ArtifactError {
    /// Create a write error
    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

impl From<ArtifactError> for ContractError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::Contract(e) => e,
            ArtifactError::Write { path, source } => {
                ContractError::Io(std::io::Error::new(source.kind(), format!("{path}: {source}")))
            }
            other => ContractError::Other(other.to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ArtifactError>;
