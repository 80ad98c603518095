//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::{ModelProvider, Role};

/// Résumé audit - fairness audit of LLM résumé shortlisting
#[derive(Parser, Debug)]
#[command(
    name = "audit",
    author,
    version,
    about = "Fairness audit of LLM résumé shortlisting",
    long_about = "Generates synthetic personas and résumés, composes candidate batches, \n\
                  asks a language model to shortlist each batch, and measures selection \n\
                  rate disparities (AIR, Fisher exact, GEE) per protected attribute.\n\n\
                  Every stage reads its predecessor's artifact from the output directory, \n\
                  so any stage can be re-run on its own."
)]
pub struct Cli {
    /// Audit blueprint (TOML or JSON); defaults to ./audit.toml, then built-in design
    #[arg(short, long, global = true, env = "AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the artifact output directory
    #[arg(short, long, global = true, env = "AUDIT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "AUDIT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "AUDIT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the persona set
    Personas(PersonasArgs),

    /// Render one résumé per persona and role
    Resumes(ResumesArgs),

    /// Compose shuffled candidate batches and their permutations
    Batches(BatchesArgs),

    /// Build the ranking prompts for every role
    Prompts(PromptsArgs),

    /// Submit one role's prompts to the ranking model
    Run(RunArgs),

    /// Compute selection rates, AIR, Fisher tests and GEE
    Analyze(AnalyzeArgs),

    /// Render SVG charts from the analysis output
    Plot,

    /// Run every stage in order
    All(AllArgs),

    /// Validate the audit blueprint without running anything
    Validate(ValidateArgs),

    /// Display the audit design and artifact status
    Info(InfoArgs),
}

/// Arguments for the `personas` command
#[derive(Args, Debug, Clone, Default)]
pub struct PersonasArgs {
    /// Override personas.seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override personas.neutral_count
    #[arg(long)]
    pub neutral: Option<usize>,

    /// Keep only a seeded sample of the attribute cross product
    #[arg(long)]
    pub sample: Option<usize>,
}

/// Arguments for the `resumes` command
#[derive(Args, Debug, Clone, Default)]
pub struct ResumesArgs {
    /// Directory with software_engineer.tmpl / hr_generalist.tmpl
    #[arg(long)]
    pub template_dir: Option<PathBuf>,
}

/// Arguments for the `batches` command
#[derive(Args, Debug, Clone, Default)]
pub struct BatchesArgs {
    /// Override batches.batch_size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override batches.shuffles
    #[arg(long)]
    pub shuffles: Option<usize>,

    /// Override batches.permutations
    #[arg(long)]
    pub permutations: Option<usize>,

    /// Override batches.seed
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the `prompts` command
#[derive(Args, Debug, Clone, Default)]
pub struct PromptsArgs {
    /// Override prompts.shortlist_size
    #[arg(long)]
    pub shortlist_size: Option<usize>,
}

/// Model invocation options shared by `run` and `all`
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Process only the first N prompts of the set
    #[arg(long, env = "AUDIT_LIMIT")]
    pub limit: Option<usize>,

    /// Override the pause between requests, in seconds
    #[arg(long)]
    pub delay: Option<f64>,

    /// Override model.provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "AUDIT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Role whose prompts are submitted
    #[arg(long, value_enum)]
    pub role: RoleArg,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the `analyze` command
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Analyse only this role (default: every configured role)
    #[arg(long, value_enum)]
    pub role: Option<RoleArg>,
}

/// Arguments for the `all` command
#[derive(Args, Debug, Clone, Default)]
pub struct AllArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the `validate` command
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug, Clone, Default)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List attribute value pools
    #[arg(long)]
    pub attributes: bool,
}

/// Audited role
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleArg {
    /// Software engineer
    Swe,
    /// HR generalist
    Hr,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Swe => Role::Swe,
            RoleArg::Hr => Role::Hr,
        }
    }
}

/// Ranking model backend
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderArg {
    /// Google Generative Language API
    Gemini,
    /// Offline deterministic model
    Mock,
}

impl From<ProviderArg> for ModelProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gemini => ModelProvider::Gemini,
            ProviderArg::Mock => ModelProvider::Mock,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
