//! Résumé and candidate profile

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{PersonaId, Role};

/// Identity details rendered into every role's résumé for one persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub persona_id: PersonaId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub education_block: String,
    pub activities_block: String,
}

impl CandidateProfile {
    /// Template context; keys are the placeholders templates may use
    pub fn context(&self) -> HashMap<String, String> {
        [
            ("persona_id", self.persona_id.as_str()),
            ("full_name", self.full_name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("education_block", self.education_block.as_str()),
            ("activities_block", self.activities_block.as_str()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }
}

/// Rendered résumé. Identified by `(persona_id, role)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub persona_id: PersonaId,
    pub role: Role,
    pub text: String,
}

/// A persona/role pair whose résumé could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFailure {
    pub persona_id: PersonaId,
    pub role: Role,
    pub error: String,
}

/// Collection persisted by the résumé stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeSet {
    pub profiles: Vec<CandidateProfile>,
    pub resumes: Vec<Resume>,
    #[serde(default)]
    pub failures: Vec<RenderFailure>,
}

impl ResumeSet {
    pub fn get(&self, persona_id: &str, role: Role) -> Option<&Resume> {
        self.resumes
            .iter()
            .find(|r| r.role == role && r.persona_id == persona_id)
    }

    /// Résumé text per persona for one role
    pub fn index(&self, role: Role) -> HashMap<&str, &str> {
        self.resumes
            .iter()
            .filter(|r| r.role == role)
            .map(|r| (r.persona_id.as_str(), r.text.as_str()))
            .collect()
    }

    pub fn count(&self, role: Role) -> usize {
        self.resumes.iter().filter(|r| r.role == role).count()
    }
}
