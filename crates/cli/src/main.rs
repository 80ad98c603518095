//! # Résumé Audit CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 按阶段执行审计管道（personas → résumés → batches → prompts → run → analyze → plot）
//! - 运行摘要与分析结果输出

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use pipeline::AuditContext;

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Résumé audit CLI starting"
    );

    let result = execute(&cli).await;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

async fn execute(cli: &Cli) -> Result<()> {
    if let Commands::Validate(args) = &cli.command {
        return commands::run_validate(cli.config.as_deref(), args);
    }

    let mut ctx = AuditContext::load(cli.config.as_deref(), cli.output_dir.as_deref())?;
    match &cli.command {
        Commands::Personas(args) => commands::run_personas(&mut ctx, args),
        Commands::Resumes(args) => commands::run_resumes(&mut ctx, args),
        Commands::Batches(args) => commands::run_batches(&mut ctx, args),
        Commands::Prompts(args) => commands::run_prompts(&mut ctx, args),
        Commands::Run(args) => commands::run_model(&mut ctx, args).await,
        Commands::Analyze(args) => commands::run_analyze(&mut ctx, args),
        Commands::Plot => commands::run_plot(&mut ctx),
        Commands::All(args) => commands::run_all(&mut ctx, args).await,
        Commands::Info(args) => commands::run_info(&ctx, args),
        Commands::Validate(args) => commands::run_validate(cli.config.as_deref(), args),
    }
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let config = ObservabilityConfig {
        log_format: cli.log_format.into(),
        ..ObservabilityConfig::default()
    }
    .with_verbosity(cli.verbose, cli.quiet);

    observability::init_with_config(config)
}
