//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{ModelConfig, Role};
use runner::RunOptions;
use tracing::info;

use crate::cli::{ModelArgs, RunArgs};
use crate::pipeline::{self, AuditContext};

impl ModelArgs {
    pub fn apply(&self, model: &mut ModelConfig) {
        if let Some(provider) = self.provider {
            info!(provider = ?provider, "Overriding model provider from CLI");
            model.provider = provider.into();
        }
        if let Some(delay) = self.delay {
            model.request_delay_secs = delay;
        }
    }

    /// Runner options from the (already overridden) model section
    pub fn run_options(&self, model: &ModelConfig) -> Result<RunOptions> {
        let mut options = RunOptions::from_config(model);
        options.request_delay = Duration::try_from_secs_f64(model.request_delay_secs)
            .with_context(|| format!("Invalid request delay: {}", model.request_delay_secs))?;
        options.limit = self.limit;
        Ok(options)
    }

    /// Start the Prometheus endpoint when a port was given
    pub fn start_metrics(&self) -> Result<()> {
        if self.metrics_port != 0 {
            observability::init_metrics_only(self.metrics_port)?;
            info!("Metrics endpoint available on port {}", self.metrics_port);
        }
        Ok(())
    }
}

/// Execute the `run` command
pub async fn run_model(ctx: &mut AuditContext, args: &RunArgs) -> Result<()> {
    let role = Role::from(args.role);
    ctx.require_role(role)?;
    args.model.apply(&mut ctx.blueprint.model);
    ctx.revalidate()?;
    let options = args.model.run_options(&ctx.blueprint.model)?;
    args.model.start_metrics()?;

    info!(
        role = %role,
        provider = ?ctx.blueprint.model.provider,
        model = %ctx.blueprint.model.model_name,
        limit = ?options.limit,
        "Starting model run..."
    );

    let report = pipeline::run_model(&ctx.blueprint, &mut ctx.store, role, options).await?;
    pipeline::print_run_report(&report);
    Ok(())
}
