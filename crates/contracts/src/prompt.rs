//! Prompt contracts

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PersonaId, Role};

/// Register of the instruction header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    Formal,
    Friendly,
    Terse,
}

impl PromptStyle {
    pub const ALL: [PromptStyle; 3] = [PromptStyle::Formal, PromptStyle::Friendly, PromptStyle::Terse];

    pub fn key(self) -> &'static str {
        match self {
            PromptStyle::Formal => "formal",
            PromptStyle::Friendly => "friendly",
            PromptStyle::Terse => "terse",
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Fully rendered request for one batch variant, style and role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// `{variant_id}_{style}_{role}`
    pub scenario_id: String,
    pub variant_id: String,
    pub group_id: String,
    pub role: Role,
    pub style: PromptStyle,
    /// Candidate `i` in the text is `persona_ids[i - 1]`
    pub persona_ids: Vec<PersonaId>,
    pub text: String,
}

impl Prompt {
    pub fn scenario_id(variant_id: &str, style: PromptStyle, role: Role) -> String {
        format!("{variant_id}_{style}_{role}")
    }
}

/// Collection persisted by the prompt stage, one per role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSet {
    pub role: Role,
    pub shortlist_size: usize,
    pub prompts: Vec<Prompt>,
}
