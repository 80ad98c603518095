//! Seeded batch composition

use std::collections::HashSet;

use contracts::{
    BatchConfig, BatchSet, BatchVariant, ContractError, PersonaId, PersonaSet, ResumeSet, Role,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument, warn};

/// Batch composer
///
/// One RNG, seeded once, consumed in a fixed order: each global shuffle,
/// then every in-batch permutation of every base batch of that shuffle.
pub struct BatchComposer {
    config: BatchConfig,
}

impl BatchComposer {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Compose every batch variant
    ///
    /// When the pool is not a multiple of the batch size (résumé rendering
    /// failed for some personas) the trailing remainder, in pool order, sits
    /// out and is listed in [`BatchSet::dropped`].
    #[instrument(
        name = "batch_composer_compose",
        skip(self, persona_ids),
        fields(
            personas = persona_ids.len(),
            batch_size = self.config.batch_size,
            seed = self.config.seed
        )
    )]
    pub fn compose(&self, persona_ids: &[PersonaId]) -> Result<BatchSet, ContractError> {
        let size = self.config.batch_size;
        let usable = if size == 0 {
            0
        } else {
            persona_ids.len() - persona_ids.len() % size
        };
        if usable == 0 {
            return Err(ContractError::batch_composition(format!(
                "{} personas cannot fill a batch of {size}",
                persona_ids.len()
            )));
        }

        let mut seen = HashSet::with_capacity(persona_ids.len());
        if let Some(dup) = persona_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(ContractError::batch_composition(format!(
                "persona '{dup}' listed twice"
            )));
        }

        let (pool, dropped) = persona_ids.split_at(usable);
        if !dropped.is_empty() {
            warn!(
                dropped = dropped.len(),
                personas = ?dropped.iter().map(PersonaId::as_str).collect::<Vec<_>>(),
                "persona pool is not a multiple of the batch size; remainder left out"
            );
        }
        let count = pool.len();

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut variants =
            Vec::with_capacity(self.config.shuffles * (count / size) * self.config.permutations);

        for shuffle in 0..self.config.shuffles {
            let mut ids = pool.to_vec();
            ids.shuffle(&mut rng);

            for (base_batch, members) in ids.chunks(size).enumerate() {
                for permutation in 0..self.config.permutations {
                    let mut ordered = members.to_vec();
                    ordered.shuffle(&mut rng);
                    variants.push(BatchVariant {
                        variant_id: BatchVariant::variant_id(shuffle, base_batch, permutation),
                        group_id: BatchVariant::group_id(shuffle, base_batch),
                        shuffle,
                        base_batch,
                        permutation,
                        persona_ids: ordered,
                    });
                }
            }
        }

        info!(
            variants = variants.len(),
            base_batches = count / size,
            "batch variants composed"
        );

        Ok(BatchSet {
            seed: self.config.seed,
            batch_size: size,
            shuffles: self.config.shuffles,
            permutations: self.config.permutations,
            variants,
            dropped: dropped.to_vec(),
        })
    }
}

/// Personas with a rendered résumé for every role, in persona order
pub fn eligible_personas(personas: &PersonaSet, resumes: &ResumeSet, roles: &[Role]) -> Vec<PersonaId> {
    let eligible: Vec<PersonaId> = personas
        .personas
        .iter()
        .filter(|p| {
            roles
                .iter()
                .all(|&role| resumes.get(p.persona_id.as_str(), role).is_some())
        })
        .map(|p| p.persona_id.clone())
        .collect();

    if eligible.len() < personas.len() {
        warn!(
            excluded = personas.len() - eligible.len(),
            "personas without a résumé for every role are left out of batches"
        );
    }
    eligible
}

/// Every batch member must have a résumé for every audited role
pub fn verify_references(
    batches: &BatchSet,
    resumes: &ResumeSet,
    roles: &[Role],
) -> Result<(), ContractError> {
    for &role in roles {
        let index = resumes.index(role);
        for variant in &batches.variants {
            if let Some(missing) = variant
                .persona_ids
                .iter()
                .find(|id| !index.contains_key(id.as_str()))
            {
                return Err(ContractError::unknown_persona(
                    missing.as_str(),
                    format!("batch {} ({role} résumés)", variant.variant_id),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Persona, Resume};
    use std::collections::HashMap;

    fn ids(n: usize) -> Vec<PersonaId> {
        (1..=n).map(PersonaId::numbered).collect()
    }

    fn config(batch_size: usize, shuffles: usize, permutations: usize, seed: u64) -> BatchConfig {
        BatchConfig {
            batch_size,
            shuffles,
            permutations,
            seed,
        }
    }

    #[test]
    fn test_default_design_counts() {
        let set = BatchComposer::new(&BatchConfig::default())
            .compose(&ids(110))
            .unwrap();
        assert_eq!(set.len(), 10 * 10 * 3);
        assert!(set.variants.iter().all(|v| v.len() == 11));
        assert_eq!(set.variants[0].variant_id, "sh0_b0_p0");
        assert_eq!(set.variants[299].variant_id, "sh9_b9_p2");
        assert_eq!(set.variants[299].group_id, "sh9_b9");
    }

    #[test]
    fn test_reproducible_with_same_seed() {
        let composer = BatchComposer::new(&config(4, 5, 2, 42));
        let a = composer.compose(&ids(12)).unwrap();
        let b = composer.compose(&ids(12)).unwrap();
        assert_eq!(a, b);

        let c = BatchComposer::new(&config(4, 5, 2, 43))
            .compose(&ids(12))
            .unwrap();
        assert_ne!(a.variants, c.variants);
    }

    #[test]
    fn test_every_persona_appears_once_per_shuffle_and_permutation() {
        let set = BatchComposer::new(&config(4, 3, 2, 1))
            .compose(&ids(8))
            .unwrap();
        let mut appearances: HashMap<&str, usize> = HashMap::new();
        for v in &set.variants {
            for id in &v.persona_ids {
                *appearances.entry(id.as_str()).or_default() += 1;
            }
        }
        assert_eq!(appearances.len(), 8);
        assert!(appearances.values().all(|&n| n == 3 * 2));
    }

    #[test]
    fn test_permutations_share_membership() {
        let set = BatchComposer::new(&config(4, 2, 3, 9))
            .compose(&ids(8))
            .unwrap();
        for group in set.variants.chunks(3) {
            let mut first = group[0].persona_ids.clone();
            first.sort();
            for v in group {
                let mut members = v.persona_ids.clone();
                members.sort();
                assert_eq!(members, first);
                assert_eq!(v.group_id, group[0].group_id);
            }
        }
    }

    #[test]
    fn test_uneven_pool_drops_the_remainder() {
        let set = BatchComposer::new(&config(4, 3, 2, 7))
            .compose(&ids(10))
            .unwrap();
        assert_eq!(set.dropped, vec![PersonaId::numbered(9), PersonaId::numbered(10)]);
        assert_eq!(set.len(), 3 * 2 * 2);
        assert!(set
            .variants
            .iter()
            .flat_map(|v| &v.persona_ids)
            .all(|id| id.ordinal().is_some_and(|n| n <= 8)));
    }

    #[test]
    fn test_rejects_short_pool_and_duplicates() {
        let composer = BatchComposer::new(&config(4, 1, 1, 0));
        assert!(matches!(
            composer.compose(&ids(3)),
            Err(ContractError::BatchComposition { .. })
        ));
        assert!(composer.compose(&[]).is_err());
        assert!(composer.compose(&ids(8)).unwrap().dropped.is_empty());

        let mut dup = ids(3);
        dup.push(PersonaId::numbered(1));
        let err = composer.compose(&dup).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    fn resumes_for(ids: &[PersonaId], roles: &[Role]) -> ResumeSet {
        ResumeSet {
            profiles: Vec::new(),
            resumes: ids
                .iter()
                .flat_map(|id| {
                    roles.iter().map(move |&role| Resume {
                        persona_id: id.clone(),
                        role,
                        text: format!("résumé of {id}"),
                    })
                })
                .collect(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_referential_integrity() {
        let all = ids(8);
        let set = BatchComposer::new(&config(4, 2, 1, 5))
            .compose(&all)
            .unwrap();

        let resumes = resumes_for(&all, &Role::ALL);
        assert!(verify_references(&set, &resumes, &Role::ALL).is_ok());

        let partial = resumes_for(&all[..7], &Role::ALL);
        let err = verify_references(&set, &partial, &Role::ALL).unwrap_err();
        assert!(matches!(err, ContractError::UnknownPersona { ref persona_id, .. } if persona_id == "pers_008"));
    }

    #[test]
    fn test_eligible_personas() {
        let personas = PersonaSet {
            attributes: Vec::new(),
            personas: ids(3).into_iter().map(Persona::neutral).collect(),
        };
        let mut resumes = resumes_for(&ids(3), &Role::ALL);
        resumes
            .resumes
            .retain(|r| !(r.persona_id == "pers_002" && r.role == Role::Hr));

        let eligible = eligible_personas(&personas, &resumes, &Role::ALL);
        assert_eq!(eligible, vec![PersonaId::numbered(1), PersonaId::numbered(3)]);
        assert_eq!(eligible_personas(&personas, &resumes, &[Role::Swe]).len(), 3);
    }
}
