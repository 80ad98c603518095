//! Batch composition contracts

use serde::{Deserialize, Serialize};

use crate::PersonaId;

/// One ordered group of candidates presented in a single ranking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchVariant {
    /// `sh{S}_b{B}_p{P}`
    pub variant_id: String,
    /// `sh{S}_b{B}`; shared by every ordering of the same membership
    pub group_id: String,
    pub shuffle: usize,
    pub base_batch: usize,
    pub permutation: usize,
    /// Candidate order as presented to the model
    pub persona_ids: Vec<PersonaId>,
}

impl BatchVariant {
    pub fn variant_id(shuffle: usize, base_batch: usize, permutation: usize) -> String {
        format!("sh{shuffle}_b{base_batch}_p{permutation}")
    }

    pub fn group_id(shuffle: usize, base_batch: usize) -> String {
        format!("sh{shuffle}_b{base_batch}")
    }

    pub fn len(&self) -> usize {
        self.persona_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persona_ids.is_empty()
    }
}

/// Collection persisted by the batch stage, with the design that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSet {
    pub seed: u64,
    pub batch_size: usize,
    pub shuffles: usize,
    pub permutations: usize,
    pub variants: Vec<BatchVariant>,
    /// Eligible personas left over after filling whole batches
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<PersonaId>,
}

impl BatchSet {
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
