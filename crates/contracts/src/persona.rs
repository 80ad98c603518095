//! Persona - synthetic candidate identity

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::PersonaId;

/// Group label for personas that carry no value for an attribute
pub const UNSPECIFIED: &str = "unspecified";

/// Name of the derived attribute aggregated alongside the configured ones
pub const MARGINALIZED_ATTRIBUTE: &str = "marginalized";

/// Synthetic candidate identity. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub persona_id: PersonaId,

    /// Attribute name -> value; empty for neutral personas
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// At least `marginalized_threshold` marginalized attribute values
    pub marginalized: bool,
}

impl Persona {
    /// Persona with no identity cues
    pub fn neutral(persona_id: PersonaId) -> Self {
        Self {
            persona_id,
            attributes: BTreeMap::new(),
            marginalized: false,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Group this persona falls in for `attribute`, including the derived
    /// `marginalized` attribute and the `unspecified` level.
    pub fn group_value(&self, attribute: &str) -> String {
        if attribute == MARGINALIZED_ATTRIBUTE {
            return self.marginalized.to_string();
        }
        self.attribute(attribute).unwrap_or(UNSPECIFIED).to_string()
    }
}

/// Collection persisted by the persona stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaSet {
    /// Attribute names in configuration order
    pub attributes: Vec<String>,
    pub personas: Vec<Persona>,
}

impl PersonaSet {
    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.persona_id == id)
    }

    pub fn ids(&self) -> Vec<PersonaId> {
        self.personas.iter().map(|p| p.persona_id.clone()).collect()
    }

    pub fn neutral_count(&self) -> usize {
        self.personas.iter().filter(|p| p.is_neutral()).count()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
