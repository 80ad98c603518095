//! # Composer
//!
//! 批次编排与 prompt 组装。
//!
//! 负责：
//! - 按 seed 可复现地打乱 persona，切分为固定大小的 base batch
//! - 每个 base batch 生成多个批内排列（variant）
//! - 校验批次只引用已存在的简历
//! - 为每个 (variant, style, role) 组装 prompt
//!
//! ## 使用示例
//!
//! ```ignore
//! use composer::{BatchComposer, PromptBuilder};
//!
//! let batches = BatchComposer::new(&blueprint.batches).compose(&persona_ids)?;
//! composer::verify_references(&batches, &resumes, &blueprint.resumes.roles)?;
//! let prompts = PromptBuilder::new(Role::Swe, 3).build(&batches, &resumes)?;
//! ```

mod batch;
mod prompt;

pub use batch::{eligible_personas, verify_references, BatchComposer};
pub use prompt::{instruction_header, job_description, response_format, PromptBuilder};

pub use contracts::{BatchSet, BatchVariant, Prompt, PromptSet, PromptStyle};
