//! Selection rates per attribute value

use std::collections::HashMap;

use contracts::{GroupRate, PersonaConfig, MARGINALIZED_ATTRIBUTE, UNSPECIFIED};

use crate::observations::Observation;

/// One attribute as aggregated: its levels in report order and the
/// reference level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub attribute: String,
    pub values: Vec<String>,
    pub reference: String,
}

impl GroupSpec {
    /// Configured attributes followed by the derived `marginalized` flag
    pub fn from_config(config: &PersonaConfig) -> Vec<GroupSpec> {
        let mut specs: Vec<GroupSpec> = config
            .attributes
            .iter()
            .map(|attr| GroupSpec {
                attribute: attr.name.clone(),
                values: attr.values.clone(),
                reference: attr.reference.clone(),
            })
            .collect();
        specs.push(GroupSpec {
            attribute: MARGINALIZED_ATTRIBUTE.to_string(),
            values: vec!["true".to_string(), "false".to_string()],
            reference: "false".to_string(),
        });
        specs
    }
}

/// Count appearances and selections of every group.
///
/// Configured values are always listed, with `selection_rate = None` when
/// they never appeared. Levels seen in the data but not configured
/// (`unspecified`, values of an older configuration) follow the configured
/// ones, `unspecified` last.
pub fn selection_rates(specs: &[GroupSpec], rows: &[Observation]) -> Vec<GroupRate> {
    let mut rates = Vec::new();
    for spec in specs {
        let mut counts: HashMap<String, (u64, u64)> = HashMap::new();
        for row in rows {
            let entry = counts
                .entry(row.persona.group_value(&spec.attribute))
                .or_default();
            entry.0 += 1;
            if row.selected {
                entry.1 += 1;
            }
        }

        let mut extra: Vec<&String> = counts
            .keys()
            .filter(|v| !spec.values.contains(v))
            .collect();
        extra.sort_by(|a, b| {
            (a.as_str() == UNSPECIFIED)
                .cmp(&(b.as_str() == UNSPECIFIED))
                .then_with(|| a.cmp(b))
        });

        for value in spec.values.iter().chain(extra) {
            let (appearances, selections) = counts.get(value).copied().unwrap_or_default();
            rates.push(GroupRate {
                attribute: spec.attribute.clone(),
                value: value.clone(),
                appearances,
                selections,
                selection_rate: rate(selections, appearances),
            });
        }
    }
    rates
}

pub(crate) fn rate(selections: u64, appearances: u64) -> Option<f64> {
    (appearances > 0).then(|| selections as f64 / appearances as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::test_support::persona;
    use contracts::AttributeSpec;

    fn group_config() -> PersonaConfig {
        PersonaConfig {
            attributes: vec![AttributeSpec::new(
                "group",
                &["reference", "minority", "other"],
                "reference",
                &["minority"],
            )],
            ..PersonaConfig::default()
        }
    }

    fn obs(n: usize, group: &str, selected: bool) -> Observation {
        Observation {
            persona: persona(n, group, group == "minority"),
            selected,
            cluster: "c".into(),
        }
    }

    #[test]
    fn test_specs_include_marginalized() {
        let specs = GroupSpec::from_config(&group_config());
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].attribute, MARGINALIZED_ATTRIBUTE);
        assert_eq!(specs[1].reference, "false");
    }

    #[test]
    fn test_rates_and_zero_appearances() {
        let specs = GroupSpec::from_config(&group_config());
        let rows = vec![
            obs(1, "reference", true),
            obs(1, "reference", false),
            obs(2, "minority", false),
            obs(2, "minority", false),
        ];
        let rates = selection_rates(&specs, &rows);

        let find = |attr: &str, value: &str| {
            rates
                .iter()
                .find(|r| r.attribute == attr && r.value == value)
                .unwrap()
        };
        assert_eq!(find("group", "reference").selection_rate, Some(0.5));
        assert_eq!(find("group", "minority").selection_rate, Some(0.0));
        let other = find("group", "other");
        assert_eq!(other.appearances, 0);
        assert_eq!(other.selection_rate, None);
        assert_eq!(find(MARGINALIZED_ATTRIBUTE, "true").appearances, 2);
    }

    #[test]
    fn test_neutral_personas_form_unspecified_level() {
        let specs = GroupSpec::from_config(&group_config());
        let neutral = Observation {
            persona: contracts::Persona::neutral(contracts::PersonaId::numbered(9)),
            selected: true,
            cluster: "c".into(),
        };
        let rates = selection_rates(&specs, &[obs(1, "reference", false), neutral]);
        let group: Vec<&str> = rates
            .iter()
            .filter(|r| r.attribute == "group")
            .map(|r| r.value.as_str())
            .collect();
        assert_eq!(group, vec!["reference", "minority", "other", UNSPECIFIED]);
    }
}
