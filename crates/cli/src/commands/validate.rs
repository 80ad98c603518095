//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{AuditBlueprint, ModelProvider, PromptStyle};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::pipeline::resolve_config_path;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    attributes: usize,
    personas: usize,
    neutral_personas: usize,
    batch_size: usize,
    batch_variants: usize,
    prompts_per_role: usize,
    roles: Vec<String>,
    provider: String,
    model: String,
}

/// Execute the `validate` command
pub fn run_validate(config: Option<&Path>, args: &ValidateArgs) -> Result<()> {
    let result = validate_config(config);
    info!(config = %result.config_path, valid = result.valid, "Validated configuration");

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn invalid(config_path: String, error: String) -> ValidationResult {
    ValidationResult {
        valid: false,
        config_path,
        error: Some(error),
        warnings: None,
        summary: None,
    }
}

fn validate_config(config: Option<&Path>) -> ValidationResult {
    let fallback = config.map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
    let path = match resolve_config_path(config) {
        Ok(path) => path,
        Err(e) => return invalid(fallback, e.to_string()),
    };
    let config_path = path
        .as_deref()
        .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());

    match ConfigLoader::load_or_default(path.as_deref()) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint, |name| std::env::var(name).ok());
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => invalid(config_path, e.to_string()),
    }
}

/// Number of batch variants the composer will produce
pub fn batch_variants(blueprint: &AuditBlueprint) -> usize {
    let batches = &blueprint.batches;
    (blueprint.personas.persona_count() / batches.batch_size)
        * batches.shuffles
        * batches.permutations
}

fn summarize(blueprint: &AuditBlueprint) -> ConfigSummary {
    let variants = batch_variants(blueprint);
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        attributes: blueprint.personas.attributes.len(),
        personas: blueprint.personas.persona_count(),
        neutral_personas: blueprint.personas.neutral_count,
        batch_size: blueprint.batches.batch_size,
        batch_variants: variants,
        prompts_per_role: variants * PromptStyle::ALL.len(),
        roles: blueprint
            .resumes
            .roles
            .iter()
            .map(|r| r.to_string())
            .collect(),
        provider: format!("{:?}", blueprint.model.provider),
        model: blueprint.model.model_name.clone(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(
    blueprint: &AuditBlueprint,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.model.provider == ModelProvider::Gemini {
        let keys = env(&blueprint.model.api_keys_env).unwrap_or_default();
        if keys.split(',').all(|k| k.trim().is_empty()) {
            warnings.push(format!(
                "{} is empty - `run` needs at least one API key for the gemini provider",
                blueprint.model.api_keys_env
            ));
        }
    }

    if blueprint.personas.neutral_count == 0 {
        warnings.push("No neutral personas - the 'unspecified' level will be absent".to_string());
    }

    let flaggable = blueprint
        .personas
        .attributes
        .iter()
        .filter(|a| !a.marginalized.is_empty())
        .count();
    if flaggable < blueprint.personas.marginalized_threshold {
        warnings.push(format!(
            "marginalized_threshold ({}) exceeds the {} attribute(s) with marginalized values - \
             no persona will be flagged",
            blueprint.personas.marginalized_threshold, flaggable
        ));
    }

    if blueprint.batches.permutations == 1 {
        warnings.push(
            "batches.permutations = 1 - position effects cannot be separated from batch effects"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Attributes: {}", summary.attributes);
            println!(
                "  Personas: {} ({} neutral)",
                summary.personas, summary.neutral_personas
            );
            println!(
                "  Batches: {} variants of {} candidates",
                summary.batch_variants, summary.batch_size
            );
            println!(
                "  Prompts: {} per role ({})",
                summary.prompts_per_role,
                summary.roles.join(", ")
            );
            println!("  Model: {} ({})", summary.model, summary.provider);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
