//! Per-value colours shared by every chart
//!
//! Each attribute's values are collected across all analysed roles, sorted,
//! and assigned the tab10 colours by position. The same value therefore gets
//! the same colour in the SWE and HR charts.

use std::collections::{BTreeMap, BTreeSet};

use contracts::RoleAnalysis;

/// matplotlib "tab10"
pub const TAB10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Fallback for values the palette was not built from
pub const UNKNOWN_COLOR: &str = "#999999";

#[derive(Debug, Clone, Default)]
pub struct Palette {
    values: BTreeMap<String, Vec<String>>,
}

impl Palette {
    pub fn from_analyses(analyses: &[RoleAnalysis]) -> Self {
        let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for analysis in analyses {
            let rate_keys = analysis.rates.iter().map(|r| (&r.attribute, &r.value));
            let air_keys = analysis.air.iter().map(|a| (&a.attribute, &a.value));
            for (attribute, value) in rate_keys.chain(air_keys) {
                sets.entry(attribute.clone())
                    .or_default()
                    .insert(value.clone());
            }
        }
        Self {
            values: sets
                .into_iter()
                .map(|(attr, values)| (attr, values.into_iter().collect()))
                .collect(),
        }
    }

    pub fn color(&self, attribute: &str, value: &str) -> &'static str {
        self.values
            .get(attribute)
            .and_then(|values| values.iter().position(|v| v == value))
            .map(|i| TAB10[i % TAB10.len()])
            .unwrap_or(UNKNOWN_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::analysis;
    use contracts::Role;

    #[test]
    fn test_colors_follow_sorted_values() {
        let palette = Palette::from_analyses(&[analysis(Role::Swe)]);
        // sorted: minority, reference, unspecified
        assert_eq!(palette.color("group", "minority"), TAB10[0]);
        assert_eq!(palette.color("group", "reference"), TAB10[1]);
        assert_eq!(palette.color("group", "unspecified"), TAB10[2]);
        assert_eq!(palette.color("group", "absent"), UNKNOWN_COLOR);
        assert_eq!(palette.color("height", "tall"), UNKNOWN_COLOR);
    }

    #[test]
    fn test_colors_consistent_across_roles() {
        let swe = analysis(Role::Swe);
        let mut hr = analysis(Role::Hr);
        // HR never saw the neutral level
        hr.rates.retain(|r| r.value != "unspecified");
        hr.air.retain(|a| a.value != "unspecified");

        let palette = Palette::from_analyses(&[swe, hr]);
        assert_eq!(palette.color("group", "unspecified"), TAB10[2]);
        assert_eq!(palette.color("marginalized", "false"), TAB10[0]);
        assert_eq!(palette.color("marginalized", "true"), TAB10[1]);
    }

    #[test]
    fn test_wraps_after_ten_values() {
        let mut a = analysis(Role::Swe);
        a.rates = (0..12)
            .map(|i| contracts::GroupRate {
                attribute: "many".into(),
                value: format!("v{i:02}"),
                appearances: 1,
                selections: 0,
                selection_rate: Some(0.0),
            })
            .collect();
        let palette = Palette::from_analyses(&[a]);
        assert_eq!(palette.color("many", "v10"), TAB10[0]);
        assert_eq!(palette.color("many", "v11"), TAB10[1]);
    }
}
