//! `info` command implementation.

use anyhow::{Context, Result};
use artifacts::ArtifactStore;
use contracts::{AuditBlueprint, Role};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::validate::batch_variants;
use crate::pipeline::AuditContext;

/// Design and artifact status for JSON output
#[derive(Serialize)]
struct AuditInfo {
    config: String,
    output_dir: String,
    personas: PersonaInfo,
    batches: BatchInfo,
    model: ModelInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<AttributeInfo>,
    artifacts: Vec<StageStatus>,
    roles: Vec<RoleStatus>,
}

#[derive(Serialize)]
struct PersonaInfo {
    total: usize,
    neutral: usize,
    seed: u64,
    marginalized_threshold: usize,
}

#[derive(Serialize)]
struct BatchInfo {
    batch_size: usize,
    shuffles: usize,
    permutations: usize,
    variants: usize,
    shortlist_size: usize,
    seed: u64,
}

#[derive(Serialize)]
struct ModelInfo {
    provider: String,
    model_name: String,
    max_retries: u32,
    request_delay_secs: f64,
    prompts_per_key: usize,
}

#[derive(Serialize)]
struct AttributeInfo {
    name: String,
    values: Vec<String>,
    reference: String,
    marginalized: Vec<String>,
}

#[derive(Serialize)]
struct StageStatus {
    stage: &'static str,
    path: String,
    present: bool,
}

#[derive(Serialize)]
struct RoleStatus {
    role: Role,
    prompts: bool,
    run_logs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    checkpoint: Option<usize>,
    analysis: bool,
}

/// Execute the `info` command
pub fn run_info(ctx: &AuditContext, args: &InfoArgs) -> Result<()> {
    info!("Collecting audit information");
    let audit_info = build_info(ctx, args);

    if args.json {
        let json =
            serde_json::to_string_pretty(&audit_info).context("Failed to serialize audit info")?;
        println!("{}", json);
    } else {
        print_info(&audit_info);
    }
    Ok(())
}

fn build_info(ctx: &AuditContext, args: &InfoArgs) -> AuditInfo {
    let bp = &ctx.blueprint;
    let layout = ctx.store.layout();

    let artifacts = [
        ("personas", layout.personas()),
        ("resumes", layout.resumes()),
        ("batches", layout.batches()),
    ]
    .into_iter()
    .map(|(stage, path)| StageStatus {
        stage,
        present: path.exists(),
        path: path.display().to_string(),
    })
    .collect();

    AuditInfo {
        config: ctx
            .config_path
            .as_deref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string()),
        output_dir: layout.root().display().to_string(),
        personas: PersonaInfo {
            total: bp.personas.persona_count(),
            neutral: bp.personas.neutral_count,
            seed: bp.personas.seed,
            marginalized_threshold: bp.personas.marginalized_threshold,
        },
        batches: BatchInfo {
            batch_size: bp.batches.batch_size,
            shuffles: bp.batches.shuffles,
            permutations: bp.batches.permutations,
            variants: batch_variants(bp),
            shortlist_size: bp.prompts.shortlist_size,
            seed: bp.batches.seed,
        },
        model: ModelInfo {
            provider: format!("{:?}", bp.model.provider),
            model_name: bp.model.model_name.clone(),
            max_retries: bp.model.max_retries,
            request_delay_secs: bp.model.request_delay_secs,
            prompts_per_key: bp.model.prompts_per_key,
        },
        attributes: if args.attributes {
            attribute_info(bp)
        } else {
            Vec::new()
        },
        artifacts,
        roles: bp
            .resumes
            .roles
            .iter()
            .map(|&role| role_status(&ctx.store, role))
            .collect(),
    }
}

fn attribute_info(bp: &AuditBlueprint) -> Vec<AttributeInfo> {
    bp.personas
        .attributes
        .iter()
        .map(|a| AttributeInfo {
            name: a.name.clone(),
            values: a.values.clone(),
            reference: a.reference.clone(),
            marginalized: a.marginalized.clone(),
        })
        .collect()
}

fn role_status(store: &ArtifactStore, role: Role) -> RoleStatus {
    let layout = store.layout();
    RoleStatus {
        role,
        prompts: layout.prompts(role).exists(),
        run_logs: layout.run_logs(role).map(|logs| logs.len()).unwrap_or(0),
        checkpoint: store
            .load_checkpoint(role)
            .ok()
            .map(|c| c.done)
            .filter(|&done| done > 0),
        analysis: analysis::analysis_path(store, role).exists(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn print_info(info: &AuditInfo) {
    println!("\n=== Audit Design ===\n");
    println!("Config: {}", info.config);
    println!("Output: {}", info.output_dir);

    println!("\nPersonas:");
    println!(
        "  {} total ({} neutral), seed {}",
        info.personas.total, info.personas.neutral, info.personas.seed
    );
    println!(
        "  Marginalized when >= {} marginalized values",
        info.personas.marginalized_threshold
    );

    if !info.attributes.is_empty() {
        println!("\nAttributes ({}):", info.attributes.len());
        for attr in &info.attributes {
            println!(
                "  - {}: {} (reference: {}, marginalized: {})",
                attr.name,
                attr.values.join(", "),
                attr.reference,
                attr.marginalized.join(", ")
            );
        }
    }

    println!("\nBatches:");
    println!(
        "  {} candidates x {} shuffles x {} permutations = {} variants",
        info.batches.batch_size,
        info.batches.shuffles,
        info.batches.permutations,
        info.batches.variants
    );
    println!("  Shortlist size: {}", info.batches.shortlist_size);

    println!("\nModel:");
    println!(
        "  {} ({}), {} attempts, {:.1}s between requests, {} prompts per key",
        info.model.model_name,
        info.model.provider,
        info.model.max_retries,
        info.model.request_delay_secs,
        info.model.prompts_per_key
    );

    println!("\nArtifacts:");
    for stage in &info.artifacts {
        println!("  {:<9} {:<3} {}", stage.stage, yes_no(stage.present), stage.path);
    }
    for role in &info.roles {
        let checkpoint = role
            .checkpoint
            .map(|done| format!(", checkpoint at {done}"))
            .unwrap_or_default();
        println!(
            "  {:<9} prompts {}, {} run log(s){}, analysis {}",
            role.role.to_string(),
            yes_no(role.prompts),
            role.run_logs,
            checkpoint,
            yes_no(role.analysis)
        );
    }
    println!();
}
