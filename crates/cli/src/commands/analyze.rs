//! `analyze` and `plot` command implementations.

use anyhow::Result;
use contracts::Role;

use crate::cli::AnalyzeArgs;
use crate::pipeline::{self, AuditContext};

/// Execute the `analyze` command
pub fn run_analyze(ctx: &mut AuditContext, args: &AnalyzeArgs) -> Result<()> {
    let roles = match args.role {
        Some(role) => {
            let role = Role::from(role);
            ctx.require_role(role)?;
            vec![role]
        }
        None => ctx.roles(),
    };

    for analysis in pipeline::analyze(&ctx.blueprint, &mut ctx.store, &roles)? {
        pipeline::print_analysis(&analysis);
    }
    println!("Metrics written to {}", ctx.store.layout().metrics_dir().display());
    Ok(())
}

/// Execute the `plot` command
pub fn run_plot(ctx: &mut AuditContext) -> Result<()> {
    let roles = ctx.roles();
    let written = pipeline::plot(&ctx.blueprint, &mut ctx.store, &roles)?;
    println!(
        "Rendered {} charts -> {}",
        written.len(),
        ctx.store.layout().plots_dir().display()
    );
    Ok(())
}
