//! Command implementations.

mod all;
mod analyze;
mod info;
mod run;
mod stages;
mod validate;

pub use all::run_all;
pub use analyze::{run_analyze, run_plot};
pub use info::run_info;
pub use run::run_model;
pub use stages::{run_batches, run_personas, run_prompts, run_resumes};
pub use validate::run_validate;
