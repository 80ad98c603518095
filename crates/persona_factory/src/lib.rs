//! # Persona Factory
//!
//! Synthetic candidate generation module.
//!
//! Responsibilities:
//! - Expand attribute pools into the persona cross product
//! - Derive one candidate profile (name, contact, education, activities) per persona
//! - Render role-specific résumés from `{{ field }}` templates
//!
//! All random choices are driven by a seeded `ChaCha8Rng`, so the same
//! configuration always produces the same personas and résumés.

pub mod cues;
pub mod error;
pub mod factory;
pub mod profile;
pub mod resume;
pub mod template;

pub use contracts::{Persona, PersonaSet, ResumeSet};
pub use error::{FactoryError, Result};
pub use factory::PersonaFactory;
pub use profile::ProfileBuilder;
pub use resume::{ResumeRenderer, TemplateSet};
pub use template::Template;
