//! # Contracts
//!
//! Frozen interface contracts between pipeline stages.
//! Every business crate depends on this crate; reverse dependencies are prohibited.
//!
//! ## Artifact flow
//! personas → résumés → batches → prompts → run records → metrics → plots.
//! Each arrow is a persisted artifact whose shape is defined here, so any
//! stage can be re-run from its predecessor's output.

mod batch;
mod blueprint;
mod error;
mod metric;
mod persona;
mod persona_id;
mod prompt;
mod ranking_model;
mod resume;
mod role;
mod run_record;
mod shortlist;

pub use batch::*;
pub use blueprint::*;
pub use error::*;
pub use metric::*;
pub use persona::*;
pub use persona_id::PersonaId;
pub use prompt::*;
pub use ranking_model::*;
pub use resume::*;
pub use role::Role;
pub use run_record::*;
pub use shortlist::*;
