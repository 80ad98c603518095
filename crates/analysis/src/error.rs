//! Analysis error types

use artifacts::ArtifactError;
use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
