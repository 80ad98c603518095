//! PersonaFactory 核心实现
//!
//! 从 PersonaConfig 展开属性笛卡尔积，生成带稳定编号的 persona。

use std::collections::BTreeMap;

use contracts::{Persona, PersonaConfig, PersonaId, PersonaSet};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Persona Factory
///
/// 按配置顺序展开属性组合（最后一个属性变化最快），
/// 可选地按 seed 抽样，再追加 neutral personas。
pub struct PersonaFactory<'a> {
    config: &'a PersonaConfig,
}

impl<'a> PersonaFactory<'a> {
    /// 创建新的 PersonaFactory
    pub fn new(config: &'a PersonaConfig) -> Self {
        Self { config }
    }

    /// 生成全部 personas
    ///
    /// 编号从 `pers_001` 开始连续分配：先是带身份线索的组合，
    /// 再是 neutral personas。
    #[instrument(
        name = "persona_factory_generate",
        skip(self),
        fields(
            attributes = self.config.attributes.len(),
            neutral = self.config.neutral_count
        )
    )]
    pub fn generate(&self) -> Result<PersonaSet> {
        let combinations = self.sampled(self.cross_product());
        let mut personas = Vec::with_capacity(combinations.len() + self.config.neutral_count);

        for values in combinations {
            let id = PersonaId::numbered(personas.len() + 1);
            personas.push(self.build_persona(id, &values));
        }

        let cue_count = personas.len();
        for _ in 0..self.config.neutral_count {
            personas.push(Persona::neutral(PersonaId::numbered(personas.len() + 1)));
        }

        let marginalized = personas.iter().filter(|p| p.marginalized).count();
        info!(
            cue = cue_count,
            neutral = self.config.neutral_count,
            marginalized,
            "personas generated"
        );

        Ok(PersonaSet {
            attributes: self
                .config
                .attributes
                .iter()
                .map(|a| a.name.clone())
                .collect(),
            personas,
        })
    }

    /// 属性值笛卡尔积，保持配置顺序
    fn cross_product(&self) -> Vec<Vec<&'a str>> {
        let config = self.config;
        let mut combinations: Vec<Vec<&'a str>> = vec![Vec::new()];

        for attr in &config.attributes {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    attr.values.iter().map(move |value| {
                        let mut next = prefix.clone();
                        next.push(value.as_str());
                        next
                    })
                })
                .collect();
        }
        combinations
    }

    /// 按 seed 抽样，保留原有顺序
    fn sampled(&self, combinations: Vec<Vec<&'a str>>) -> Vec<Vec<&'a str>> {
        let Some(sample) = self.config.sample else {
            return combinations;
        };
        if sample >= combinations.len() {
            return combinations;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut keep = rand::seq::index::sample(&mut rng, combinations.len(), sample).into_vec();
        keep.sort_unstable();
        debug!(available = combinations.len(), sample, "sampling personas");

        let mut keep = keep.into_iter().peekable();
        combinations
            .into_iter()
            .enumerate()
            .filter_map(|(i, values)| {
                (keep.peek() == Some(&i)).then(|| {
                    keep.next();
                    values
                })
            })
            .collect()
    }

    fn build_persona(&self, persona_id: PersonaId, values: &[&str]) -> Persona {
        let mut attributes = BTreeMap::new();
        let mut marginalized_values = 0;

        for (spec, value) in self.config.attributes.iter().zip(values) {
            if spec.marginalized.iter().any(|m| m == value) {
                marginalized_values += 1;
            }
            attributes.insert(spec.name.clone(), (*value).to_string());
        }

        Persona {
            persona_id,
            attributes,
            marginalized: marginalized_values >= self.config.marginalized_threshold,
        }
    }
}
