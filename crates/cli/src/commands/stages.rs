//! `personas`, `resumes`, `batches` and `prompts` command implementations.

use anyhow::Result;
use contracts::AuditBlueprint;
use tracing::info;

use crate::cli::{BatchesArgs, PersonasArgs, PromptsArgs, ResumesArgs};
use crate::pipeline::{self, AuditContext};

impl PersonasArgs {
    pub fn apply(&self, blueprint: &mut AuditBlueprint) {
        if let Some(seed) = self.seed {
            info!(seed, "Overriding persona seed from CLI");
            blueprint.personas.seed = seed;
        }
        if let Some(neutral) = self.neutral {
            info!(neutral, "Overriding neutral persona count from CLI");
            blueprint.personas.neutral_count = neutral;
        }
        if let Some(sample) = self.sample {
            info!(sample, "Sampling the attribute cross product");
            blueprint.personas.sample = Some(sample);
        }
    }
}

impl ResumesArgs {
    pub fn apply(&self, blueprint: &mut AuditBlueprint) {
        if let Some(dir) = &self.template_dir {
            info!(dir = %dir.display(), "Using résumé templates from CLI");
            blueprint.resumes.template_dir = Some(dir.clone());
        }
    }
}

impl BatchesArgs {
    pub fn apply(&self, blueprint: &mut AuditBlueprint) {
        let batches = &mut blueprint.batches;
        if let Some(size) = self.batch_size {
            batches.batch_size = size;
        }
        if let Some(shuffles) = self.shuffles {
            batches.shuffles = shuffles;
        }
        if let Some(permutations) = self.permutations {
            batches.permutations = permutations;
        }
        if let Some(seed) = self.seed {
            batches.seed = seed;
        }
    }
}

impl PromptsArgs {
    pub fn apply(&self, blueprint: &mut AuditBlueprint) {
        if let Some(size) = self.shortlist_size {
            blueprint.prompts.shortlist_size = size;
        }
    }
}

/// Execute the `personas` command
pub fn run_personas(ctx: &mut AuditContext, args: &PersonasArgs) -> Result<()> {
    args.apply(&mut ctx.blueprint);
    ctx.revalidate()?;
    let personas = pipeline::generate_personas(&ctx.blueprint, &mut ctx.store)?;
    println!(
        "Generated {} personas ({} neutral) -> {}",
        personas.len(),
        personas.neutral_count(),
        ctx.store.layout().personas().display()
    );
    Ok(())
}

/// Execute the `resumes` command
pub fn run_resumes(ctx: &mut AuditContext, args: &ResumesArgs) -> Result<()> {
    args.apply(&mut ctx.blueprint);
    let resumes = pipeline::render_resumes(&ctx.blueprint, &mut ctx.store)?;
    println!(
        "Rendered {} résumés ({} failures) -> {}",
        resumes.resumes.len(),
        resumes.failures.len(),
        ctx.store.layout().resumes().display()
    );
    Ok(())
}

/// Execute the `batches` command
pub fn run_batches(ctx: &mut AuditContext, args: &BatchesArgs) -> Result<()> {
    args.apply(&mut ctx.blueprint);
    ctx.revalidate()?;
    let batches = pipeline::compose_batches(&ctx.blueprint, &mut ctx.store)?;
    println!(
        "Composed {} batch variants -> {}",
        batches.len(),
        ctx.store.layout().batches().display()
    );
    Ok(())
}

/// Execute the `prompts` command
pub fn run_prompts(ctx: &mut AuditContext, args: &PromptsArgs) -> Result<()> {
    args.apply(&mut ctx.blueprint);
    ctx.revalidate()?;
    for set in pipeline::build_prompts(&ctx.blueprint, &mut ctx.store)? {
        println!(
            "Built {} {} prompts -> {}",
            set.prompts.len(),
            set.role,
            ctx.store.layout().prompts(set.role).display()
        );
    }
    Ok(())
}
