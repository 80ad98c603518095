//! # Model Runner
//!
//! Submits every prompt of a role to the ranking model and appends the raw
//! answers to the run log.
//!
//! Responsibilities:
//! - Talk to the Gemini `generateContent` endpoint (or the offline mock)
//! - Rotate API keys every `prompts_per_key` prompts
//! - Bounded retry with exponential backoff, honouring `Retry-After`
//! - Checkpoint after every prompt so an interrupted run resumes
//! - Pace consecutive requests
//!
//! ## Usage
//!
//! ```ignore
//! use runner::{build_model, ModelRunner, RunOptions};
//!
//! let model = build_model(&blueprint.model)?;
//! let runner = ModelRunner::new(model, RunOptions::from_config(&blueprint.model));
//! let report = runner.run(&mut store, Role::Swe).await?;
//! println!("{}", report.summary);
//! ```

mod error;
mod gemini;
mod http;
mod keys;
mod mock;
mod retry;
mod runner;

pub use error::{Result, RunnerError};
pub use gemini::GeminiModel;
pub use keys::ApiKeys;
pub use mock::MockRankingModel;
pub use retry::RetryPolicy;
pub use runner::{build_model, ConfiguredModel, ModelRunner, RunOptions, RunReport};
