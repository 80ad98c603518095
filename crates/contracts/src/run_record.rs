//! Run log contracts
//!
//! Run records are append-only: one JSON line per answered prompt, never
//! rewritten. Prompts that exhaust their retries produce a `RunFailure`
//! instead of a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Persona, PersonaId, Prompt, PromptStyle, Role};

/// Raw model answer for one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub scenario_id: String,
    pub role: Role,
    pub prompt_style: PromptStyle,
    pub variant_id: String,
    pub group_id: String,
    pub persona_ids: Vec<PersonaId>,
    /// Snapshot of the candidates' attributes at run time
    pub persona_meta: Vec<Persona>,
    pub prompt_text: String,
    pub response_text: String,
    pub model: String,
    /// Attempts spent, including the successful one
    pub attempts: u32,
    pub timestamp_utc: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(
        prompt: &Prompt,
        persona_meta: Vec<Persona>,
        response_text: String,
        model: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            scenario_id: prompt.scenario_id.clone(),
            role: prompt.role,
            prompt_style: prompt.style,
            variant_id: prompt.variant_id.clone(),
            group_id: prompt.group_id.clone(),
            persona_ids: prompt.persona_ids.clone(),
            persona_meta,
            prompt_text: prompt.text.clone(),
            response_text,
            model: model.into(),
            attempts,
            timestamp_utc: Utc::now(),
        }
    }
}

/// Prompt that never produced a usable answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub scenario_id: String,
    pub role: Role,
    pub attempts: u32,
    pub error: String,
    pub timestamp_utc: DateTime<Utc>,
}

/// Resume position of a role's run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Prompts processed so far, in prompt-set order
    pub done: usize,
}
