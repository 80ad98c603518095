//! Persona Factory error types

use contracts::ContractError;
use thiserror::Error;

/// Persona Factory specific error
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Every name in a pool, including middle-initial variants, is taken
    #[error("name pool exhausted for persona '{persona_id}'")]
    NamePoolExhausted { persona_id: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Result alias
pub type Result<T> = std::result::Result<T, FactoryError>;
