//! Résumé rendering
//!
//! Each persona gets one candidate profile; the profile plus the persona's
//! attribute values form the render context for every role template.
//! Failures are recorded per (persona, role) and never stop the batch.

use std::collections::HashMap;
use std::path::Path;

use contracts::{
    CandidateProfile, ContractError, Persona, PersonaSet, RenderFailure, Resume, ResumeSet, Role,
};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::profile::ProfileBuilder;
use crate::template::Template;

const SOFTWARE_ENGINEER_TEMPLATE: &str = include_str!("../templates/software_engineer.tmpl");
const HR_GENERALIST_TEMPLATE: &str = include_str!("../templates/hr_generalist.tmpl");

/// Template file name looked up in a template directory
pub fn template_file(role: Role) -> &'static str {
    match role {
        Role::Swe => "software_engineer.tmpl",
        Role::Hr => "hr_generalist.tmpl",
    }
}

fn builtin_source(role: Role) -> &'static str {
    match role {
        Role::Swe => SOFTWARE_ENGINEER_TEMPLATE,
        Role::Hr => HR_GENERALIST_TEMPLATE,
    }
}

/// Templates for the audited roles
///
/// A role whose template failed to load keeps the error message so every
/// persona can record it as its render failure.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    roles: Vec<Role>,
    templates: HashMap<Role, Template>,
    unavailable: HashMap<Role, String>,
}

impl TemplateSet {
    /// Built-in templates
    pub fn builtin(roles: &[Role]) -> Self {
        Self::collect(roles, |role| {
            Template::parse(template_file(role), builtin_source(role))
        })
    }

    /// Templates from `dir`, or the built-in ones when `dir` is None
    pub fn load(dir: Option<&Path>, roles: &[Role]) -> Self {
        let Some(dir) = dir else {
            return Self::builtin(roles);
        };
        Self::collect(roles, |role| {
            let path = dir.join(template_file(role));
            let source = std::fs::read_to_string(&path).map_err(|e| {
                ContractError::template(path.display().to_string(), format!("cannot read: {e}"))
            })?;
            Template::parse(path.display().to_string(), &source)
        })
    }

    /// Templates from in-memory sources
    pub fn from_sources(sources: &[(Role, &str)]) -> Self {
        let roles: Vec<Role> = sources.iter().map(|(r, _)| *r).collect();
        Self::collect(&roles, |role| {
            let source = sources
                .iter()
                .find(|(r, _)| *r == role)
                .map(|(_, s)| *s)
                .unwrap_or_default();
            Template::parse(template_file(role), source)
        })
    }

    fn collect(
        roles: &[Role],
        mut load: impl FnMut(Role) -> std::result::Result<Template, ContractError>,
    ) -> Self {
        let mut templates = HashMap::new();
        let mut unavailable = HashMap::new();
        for &role in roles {
            match load(role) {
                Ok(template) => {
                    templates.insert(role, template);
                }
                Err(e) => {
                    warn!(role = %role, error = %e, "template unavailable");
                    unavailable.insert(role, e.to_string());
                }
            }
        }
        Self {
            roles: roles.to_vec(),
            templates,
            unavailable,
        }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    fn render(
        &self,
        role: Role,
        context: &HashMap<String, String>,
    ) -> std::result::Result<String, String> {
        match self.templates.get(&role) {
            Some(template) => template.render(context).map_err(|e| e.to_string()),
            None => Err(self
                .unavailable
                .get(&role)
                .cloned()
                .unwrap_or_else(|| format!("no template for role '{role}'"))),
        }
    }
}

/// Renders one résumé per (persona, role)
pub struct ResumeRenderer {
    templates: TemplateSet,
    seed: u64,
}

impl ResumeRenderer {
    /// `seed` drives the candidate-profile choices
    pub fn new(templates: TemplateSet, seed: u64) -> Self {
        Self { templates, seed }
    }

    #[instrument(
        name = "resume_renderer_render_all",
        skip(self, personas),
        fields(personas = personas.len(), roles = self.templates.roles().len())
    )]
    pub fn render_all(&self, personas: &PersonaSet) -> Result<ResumeSet> {
        let profiles = ProfileBuilder::new(self.seed).build_all(personas)?;
        let mut resumes = Vec::with_capacity(profiles.len() * self.templates.roles().len());
        let mut failures = Vec::new();

        for (persona, profile) in personas.personas.iter().zip(&profiles) {
            let context = render_context(persona, profile);
            for &role in self.templates.roles() {
                match self.templates.render(role, &context) {
                    Ok(text) => resumes.push(Resume {
                        persona_id: persona.persona_id.clone(),
                        role,
                        text,
                    }),
                    Err(error) => {
                        warn!(
                            persona_id = %persona.persona_id,
                            role = %role,
                            error = %error,
                            "résumé render failed, skipping"
                        );
                        failures.push(RenderFailure {
                            persona_id: persona.persona_id.clone(),
                            role,
                            error,
                        });
                    }
                }
            }
        }

        info!(
            resumes = resumes.len(),
            failures = failures.len(),
            "résumés rendered"
        );

        Ok(ResumeSet {
            profiles,
            resumes,
            failures,
        })
    }
}

/// Persona attributes overlaid with the profile fields
fn render_context(persona: &Persona, profile: &CandidateProfile) -> HashMap<String, String> {
    let mut context: HashMap<String, String> = persona
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    context.extend(profile.context());
    context
}
