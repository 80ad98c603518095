//! Candidate profiles
//!
//! One profile per persona, shared by every role's résumé. Random choices
//! come from a single `ChaCha8Rng` consumed in persona order.

use std::collections::HashSet;

use contracts::{CandidateProfile, Persona, PersonaSet};
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::cues::{
    self, ACTIVITY_COUNT, CUE_PHONE, DEGREE_SUFFIX, ELITE_SCHOOLS, EMAIL_DOMAIN, GENERIC_SCHOOL,
    LGBTQ_ACTIVITY, NEUTRAL_ACTIVITIES, NEUTRAL_EMAIL, NEUTRAL_FIRST_NAMES, NEUTRAL_LAST_NAMES,
    NEUTRAL_PHONE, REGIONAL_SCHOOLS,
};
use crate::error::{FactoryError, Result};

/// Draws per name shape before falling back to the next middle initial
const MAX_DRAWS: usize = 64;

/// Builds candidate profiles with names unique across the run
pub struct ProfileBuilder {
    rng: ChaCha8Rng,
    used_names: HashSet<String>,
}

impl ProfileBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            used_names: HashSet::new(),
        }
    }

    /// Profiles for every persona, in persona order
    pub fn build_all(&mut self, set: &PersonaSet) -> Result<Vec<CandidateProfile>> {
        set.personas.iter().map(|p| self.build(p)).collect()
    }

    pub fn build(&mut self, persona: &Persona) -> Result<CandidateProfile> {
        if persona.is_neutral() {
            return Ok(neutral_profile(persona));
        }

        let full_name = self.unique_name(persona)?;
        let email = email_for(&full_name);
        let education_block = self.education(persona.attribute("class"));
        let activities_block = activities(persona);
        debug!(persona_id = %persona.persona_id, name = %full_name, "profile built");

        Ok(CandidateProfile {
            persona_id: persona.persona_id.clone(),
            full_name,
            email,
            phone: CUE_PHONE.to_string(),
            education_block,
            activities_block,
        })
    }

    fn unique_name(&mut self, persona: &Persona) -> Result<String> {
        let race = persona.attribute("race").unwrap_or_default();
        let gender = persona.attribute("gender").unwrap_or_default();
        let firsts = cues::first_names(race, gender).unwrap_or(NEUTRAL_FIRST_NAMES);
        let lasts = cues::last_names(race).unwrap_or(NEUTRAL_LAST_NAMES);

        let initials = std::iter::once(None).chain(('A'..='Z').map(Some));
        for initial in initials {
            for _ in 0..MAX_DRAWS {
                let (Some(first), Some(last)) =
                    (firsts.choose(&mut self.rng), lasts.choose(&mut self.rng))
                else {
                    break;
                };
                let name = match initial {
                    None => format!("{first} {last}"),
                    Some(i) => format!("{first} {i}. {last}"),
                };
                if self.used_names.insert(name.clone()) {
                    return Ok(name);
                }
            }
        }

        Err(FactoryError::NamePoolExhausted {
            persona_id: persona.persona_id.to_string(),
        })
    }

    fn education(&mut self, class: Option<&str>) -> String {
        let pool = match class {
            Some("higher") => ELITE_SCHOOLS,
            Some("lower") => REGIONAL_SCHOOLS,
            _ => return education_line(GENERIC_SCHOOL),
        };
        let school = pool.choose(&mut self.rng).copied().unwrap_or(GENERIC_SCHOOL);
        education_line(school)
    }
}

fn neutral_profile(persona: &Persona) -> CandidateProfile {
    CandidateProfile {
        persona_id: persona.persona_id.clone(),
        full_name: String::new(),
        email: NEUTRAL_EMAIL.to_string(),
        phone: NEUTRAL_PHONE.to_string(),
        education_block: education_line(GENERIC_SCHOOL),
        activities_block: activity_lines(&NEUTRAL_ACTIVITIES[..ACTIVITY_COUNT]),
    }
}

fn education_line(school: &str) -> String {
    format!("- {school}, {DEGREE_SUFFIX}")
}

/// "Miguel Ángel A. Torres" -> "miguel.ángel.a.torres@example.com"
fn email_for(full_name: &str) -> String {
    let local = full_name
        .to_lowercase()
        .replace('.', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@{EMAIL_DOMAIN}")
}

fn activities(persona: &Persona) -> String {
    let mut chosen: Vec<&str> = Vec::with_capacity(ACTIVITY_COUNT);
    if let Some(activity) = persona.attribute("religion").and_then(cues::religion_activity) {
        chosen.push(activity);
    }
    if persona.attribute("lgbtq") == Some("yes") {
        chosen.push(LGBTQ_ACTIVITY);
    }
    for &filler in NEUTRAL_ACTIVITIES {
        if chosen.len() >= ACTIVITY_COUNT {
            break;
        }
        chosen.push(filler);
    }
    activity_lines(&chosen)
}

fn activity_lines(activities: &[&str]) -> String {
    activities
        .iter()
        .map(|a| format!("- {a}"))
        .collect::<Vec<_>>()
        .join("\n")
}
