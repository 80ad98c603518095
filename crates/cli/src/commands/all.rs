//! `all` command implementation.

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::AllArgs;
use crate::pipeline::{self, AuditContext};

/// Execute every stage in order
///
/// Analysis and plots cover the roles whose run is complete; with `--limit`
/// every role is analysed on the records it has.
pub async fn run_all(ctx: &mut AuditContext, args: &AllArgs) -> Result<()> {
    args.model.apply(&mut ctx.blueprint.model);
    ctx.revalidate()?;
    let options = args.model.run_options(&ctx.blueprint.model)?;
    args.model.start_metrics()?;

    info!("[1/7] personas");
    pipeline::generate_personas(&ctx.blueprint, &mut ctx.store)?;
    info!("[2/7] résumés");
    pipeline::render_resumes(&ctx.blueprint, &mut ctx.store)?;
    info!("[3/7] batches");
    pipeline::compose_batches(&ctx.blueprint, &mut ctx.store)?;
    info!("[4/7] prompts");
    pipeline::build_prompts(&ctx.blueprint, &mut ctx.store)?;

    info!("[5/7] model runs");
    let mut analysable = Vec::new();
    for role in ctx.roles() {
        let report = pipeline::run_model(&ctx.blueprint, &mut ctx.store, role, options).await?;
        pipeline::print_run_report(&report);
        if report.is_complete() || options.limit.is_some() {
            analysable.push(role);
        } else {
            warn!(
                role = %role,
                done = report.done,
                total = report.total,
                "run incomplete, role left out of analysis"
            );
        }
    }
    if analysable.is_empty() {
        warn!("no role finished its run; skipping analysis and plots");
        return Ok(());
    }

    info!("[6/7] analysis");
    for analysis in pipeline::analyze(&ctx.blueprint, &mut ctx.store, &analysable)? {
        pipeline::print_analysis(&analysis);
    }

    info!("[7/7] plots");
    let written = pipeline::plot(&ctx.blueprint, &mut ctx.store, &analysable)?;
    println!(
        "Audit complete: {} charts under {}",
        written.len(),
        ctx.store.layout().plots_dir().display()
    );
    Ok(())
}
