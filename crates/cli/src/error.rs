//! Error types for CLI operations.

use std::path::PathBuf;

use contracts::Role;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file given on the command line does not exist
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// `run --role` names a role the blueprint does not audit
    #[error("role '{role}' is not listed in resumes.roles")]
    RoleNotConfigured { role: Role },

    /// No role has analysis output to plot
    #[error("no analysis output under {}; run `audit analyze` first", dir.display())]
    NothingToPlot { dir: PathBuf },
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}
