//! # Artifacts
//!
//! On-disk contract between pipeline stages.
//!
//! Responsibilities:
//! - Fixed directory layout under the output root
//! - JSON documents for personas, résumés, batches and prompts
//! - Append-only JSONL run logs, failure logs and per-role checkpoints
//! - CSV tables for metrics
//!
//! ```text
//! <root>/personas/all_personas.json
//! <root>/resumes/all_resumes.json
//! <root>/batches/batch_variants.json
//! <root>/prompts/{role}_prompts.json
//! <root>/runs/{role}_run_{timestamp}.jsonl
//! <root>/runs/{role}_failures.jsonl
//! <root>/runs/.last_checkpoint_{role}.json
//! <root>/metrics/{role}_*.csv|json
//! <root>/plots/*.svg
//! ```

mod csv;
mod error;
mod layout;
mod run_log;
mod store;

pub use csv::CsvTable;
pub use error::{ArtifactError, Result};
pub use layout::ArtifactLayout;
pub use run_log::{read_jsonl, JsonlWriter, RunLog};
pub use store::{ArtifactStore, Stage};
