//! Resolved configuration plus the artifact store it points at.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use artifacts::ArtifactStore;
use config_loader::ConfigLoader;
use contracts::{AuditBlueprint, Role};
use tracing::info;

use crate::error::CliError;

/// Blueprint looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "audit.toml";

/// Everything a command needs
pub struct AuditContext {
    pub blueprint: AuditBlueprint,
    /// File the blueprint came from; None for the built-in design
    pub config_path: Option<PathBuf>,
    pub store: ArtifactStore,
}

/// `--config` when given (must exist), else `./audit.toml` if present
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>, CliError> {
    match explicit {
        Some(path) if !path.exists() => Err(CliError::config_not_found(path)),
        Some(path) => Ok(Some(path.to_path_buf())),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG);
            Ok(fallback.exists().then(|| fallback.to_path_buf()))
        }
    }
}

impl AuditContext {
    pub fn load(config: Option<&Path>, output_dir: Option<&Path>) -> Result<Self> {
        let config_path = resolve_config_path(config)?;
        let mut blueprint = ConfigLoader::load_or_default(config_path.as_deref())
            .with_context(|| match &config_path {
                Some(path) => format!("Failed to load config from {}", path.display()),
                None => "Built-in audit design is invalid".to_string(),
            })?;

        if let Some(dir) = output_dir {
            info!(dir = %dir.display(), "Overriding output directory from CLI");
            blueprint.output.dir = dir.to_path_buf();
        }

        info!(
            config = %config_path
                .as_deref()
                .map_or_else(|| "built-in".to_string(), |p| p.display().to_string()),
            output = %blueprint.output.dir.display(),
            personas = blueprint.personas.persona_count(),
            batch_size = blueprint.batches.batch_size,
            "Configuration loaded"
        );

        let store = ArtifactStore::new(&blueprint.output.dir);
        Ok(Self {
            blueprint,
            config_path,
            store,
        })
    }

    /// Re-check the blueprint after command-line overrides
    pub fn revalidate(&self) -> Result<()> {
        ConfigLoader::revalidate(&self.blueprint)
            .context("Configuration is invalid after command-line overrides")
    }

    pub fn roles(&self) -> Vec<Role> {
        self.blueprint.resumes.roles.clone()
    }

    /// Fail when `role` is not audited by this blueprint
    pub fn require_role(&self, role: Role) -> Result<(), CliError> {
        if self.blueprint.resumes.roles.contains(&role) {
            Ok(())
        } else {
            Err(CliError::RoleNotConfigured { role })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_config() {
        let err = resolve_config_path(Some(Path::new("/nonexistent/audit.toml"))).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("pilot.toml");
        std::fs::write(
            &config,
            "[resumes]\nroles = [\"swe\"]\n\n[model]\nprovider = \"mock\"\n",
        )
        .unwrap();
        let out = dir.path().join("out");

        let ctx = AuditContext::load(Some(&config), Some(&out)).unwrap();
        assert_eq!(ctx.blueprint.output.dir, out);
        assert_eq!(ctx.store.layout().root(), out.as_path());
        assert_eq!(ctx.config_path.as_deref(), Some(config.as_path()));
        assert!(ctx.require_role(Role::Swe).is_ok());
        assert!(matches!(
            ctx.require_role(Role::Hr),
            Err(CliError::RoleNotConfigured { role: Role::Hr })
        ));
    }

    #[test]
    fn test_revalidate_catches_bad_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("pilot.toml");
        std::fs::write(&config, "[model]\nprovider = \"mock\"\n").unwrap();

        let mut ctx = AuditContext::load(Some(&config), Some(dir.path())).unwrap();
        assert!(ctx.revalidate().is_ok());
        ctx.blueprint.batches.batch_size = 7;
        assert!(ctx.revalidate().is_err());
    }
}
