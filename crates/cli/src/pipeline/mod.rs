//! Pipeline orchestration module.

mod context;
mod stages;
mod summary;

pub use context::{resolve_config_path, AuditContext};
pub use stages::{
    analyze, build_prompts, compose_batches, generate_personas, plot, render_resumes, run_model,
};
pub use summary::{print_analysis, print_run_report};
