//! One function per pipeline stage.
//!
//! Each stage reads its predecessor's artifact from the store and writes its
//! own, so stages can be re-run independently.

use std::path::PathBuf;

use analysis::{analysis_path, analyze_role, load_analysis, save_analysis};
use anyhow::{Context, Result};
use artifacts::ArtifactStore;
use composer::{eligible_personas, verify_references, BatchComposer, PromptBuilder};
use contracts::{AuditBlueprint, BatchSet, PersonaSet, PromptSet, ResumeSet, Role, RoleAnalysis};
use persona_factory::{PersonaFactory, ResumeRenderer, TemplateSet};
use plotting::{render_plots, PlotOptions};
use runner::{build_model, ModelRunner, RunOptions, RunReport};
use tracing::{info, warn};

use crate::error::CliError;

pub fn generate_personas(
    blueprint: &AuditBlueprint,
    store: &mut ArtifactStore,
) -> Result<PersonaSet> {
    let personas = PersonaFactory::new(&blueprint.personas)
        .generate()
        .context("Failed to generate personas")?;
    let path = store.save_personas(&personas)?;
    info!(count = personas.len(), path = %path.display(), "Personas saved");
    Ok(personas)
}

pub fn render_resumes(blueprint: &AuditBlueprint, store: &mut ArtifactStore) -> Result<ResumeSet> {
    let personas = store.load_personas()?;
    let roles = &blueprint.resumes.roles;
    let templates = TemplateSet::load(blueprint.resumes.template_dir.as_deref(), roles);
    let resumes = ResumeRenderer::new(templates, blueprint.personas.seed)
        .render_all(&personas)
        .context("Failed to render résumés")?;

    if !resumes.failures.is_empty() {
        warn!(
            failures = resumes.failures.len(),
            "some résumés could not be rendered; those personas are left out of batches"
        );
    }
    let path = store.save_resumes(&resumes)?;
    info!(
        resumes = resumes.resumes.len(),
        failures = resumes.failures.len(),
        path = %path.display(),
        "Résumés saved"
    );
    Ok(resumes)
}

pub fn compose_batches(blueprint: &AuditBlueprint, store: &mut ArtifactStore) -> Result<BatchSet> {
    let personas = store.load_personas()?;
    let resumes = store.load_resumes()?;
    let roles = &blueprint.resumes.roles;

    let ids = eligible_personas(&personas, &resumes, roles);
    let batches = BatchComposer::new(&blueprint.batches)
        .compose(&ids)
        .context("Failed to compose batches")?;
    verify_references(&batches, &resumes, roles)?;

    let path = store.save_batches(&batches)?;
    info!(
        variants = batches.len(),
        dropped = batches.dropped.len(),
        path = %path.display(),
        "Batches saved"
    );
    Ok(batches)
}

pub fn build_prompts(
    blueprint: &AuditBlueprint,
    store: &mut ArtifactStore,
) -> Result<Vec<PromptSet>> {
    let batches = store.load_batches()?;
    let resumes = store.load_resumes()?;

    let mut sets = Vec::with_capacity(blueprint.resumes.roles.len());
    for &role in &blueprint.resumes.roles {
        let prompts = PromptBuilder::new(role, blueprint.prompts.shortlist_size)
            .build(&batches, &resumes)
            .with_context(|| format!("Failed to build {role} prompts"))?;
        let path = store.save_prompts(&prompts)?;
        info!(role = %role, prompts = prompts.prompts.len(), path = %path.display(), "Prompts saved");
        sets.push(prompts);
    }
    Ok(sets)
}

pub async fn run_model(
    blueprint: &AuditBlueprint,
    store: &mut ArtifactStore,
    role: Role,
    options: RunOptions,
) -> Result<RunReport> {
    let model = build_model(&blueprint.model).context("Failed to set up the ranking model")?;
    let report = ModelRunner::new(model, options)
        .run(store, role)
        .await
        .with_context(|| format!("Model run for role '{role}' failed"))?;

    if !report.is_complete() {
        info!(
            role = %role,
            done = report.done,
            total = report.total,
            "Run stopped before the end of the prompt set; re-run to resume"
        );
    }
    Ok(report)
}

pub fn analyze(
    blueprint: &AuditBlueprint,
    store: &mut ArtifactStore,
    roles: &[Role],
) -> Result<Vec<RoleAnalysis>> {
    let mut analyses = Vec::with_capacity(roles.len());
    for &role in roles {
        let records = store.load_run_records(role)?;
        let analysis = analyze_role(role, &records, &blueprint.personas, &blueprint.analysis);
        save_analysis(store, &analysis)?;
        analyses.push(analysis);
    }
    Ok(analyses)
}

/// Charts for every role that has analysis output
pub fn plot(
    blueprint: &AuditBlueprint,
    store: &mut ArtifactStore,
    roles: &[Role],
) -> Result<Vec<PathBuf>> {
    let mut analyses = Vec::with_capacity(roles.len());
    for &role in roles {
        if !analysis_path(store, role).exists() {
            warn!(role = %role, "no analysis output, role skipped");
            continue;
        }
        analyses.push(load_analysis(store, role)?);
    }
    if analyses.is_empty() {
        return Err(CliError::NothingToPlot {
            dir: store.layout().metrics_dir(),
        }
        .into());
    }

    let written = render_plots(store, &analyses, PlotOptions::from_config(&blueprint.analysis))?;
    Ok(written)
}
