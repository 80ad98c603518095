//! Maps a role's analysis onto charts

use contracts::RoleAnalysis;

use crate::charts::{Bar, BarChart, ForestPlot, ForestRow, ReferenceLine};
use crate::palette::Palette;
use crate::svg::Stroke;

const INTERCEPT: &str = "Intercept";

/// Attributes in the order the rates table lists them
pub fn attributes(analysis: &RoleAnalysis) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for rate in &analysis.rates {
        if !seen.contains(&rate.attribute.as_str()) {
            seen.push(rate.attribute.as_str());
        }
    }
    seen
}

/// "race" -> "Race", "marginalized" -> "Marginalized"
fn display_name(attribute: &str) -> String {
    let spaced = attribute.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn role_title(analysis: &RoleAnalysis) -> String {
    analysis.role.key().to_ascii_uppercase()
}

pub fn selection_rate_chart(
    analysis: &RoleAnalysis,
    attribute: &str,
    palette: &Palette,
) -> BarChart {
    BarChart {
        title: format!(
            "{} Selection Rate by {}",
            role_title(analysis),
            display_name(attribute)
        ),
        y_label: "Selection rate".to_string(),
        bars: analysis
            .rates
            .iter()
            .filter(|r| r.attribute == attribute)
            .map(|r| Bar {
                label: r.value.clone(),
                value: r.selection_rate,
                color: palette.color(attribute, &r.value),
            })
            .collect(),
        reference_lines: Vec::new(),
    }
}

/// AIR per value; the reference group is drawn at exactly 1
pub fn air_chart(
    analysis: &RoleAnalysis,
    attribute: &str,
    palette: &Palette,
    four_fifths_threshold: f64,
) -> BarChart {
    BarChart {
        title: format!(
            "{} Adverse Impact Ratio by {}",
            role_title(analysis),
            display_name(attribute)
        ),
        y_label: "AIR (vs reference)".to_string(),
        bars: analysis
            .air
            .iter()
            .filter(|a| a.attribute == attribute)
            .map(|a| Bar {
                label: if a.is_reference {
                    format!("{} (ref)", a.value)
                } else {
                    a.value.clone()
                },
                value: a.air,
                color: palette.color(attribute, &a.value),
            })
            .collect(),
        reference_lines: vec![
            ReferenceLine {
                value: 1.0,
                stroke: Stroke::Dashed,
                label: "parity".to_string(),
            },
            ReferenceLine {
                value: four_fifths_threshold,
                stroke: Stroke::Dotted,
                label: format!("{four_fifths_threshold}"),
            },
        ],
    }
}

/// Odds ratios of every estimated, non-intercept GEE term
pub fn gee_forest(analysis: &RoleAnalysis) -> ForestPlot {
    let gee = &analysis.gee;
    let rows = gee
        .terms
        .iter()
        .filter(|t| !t.aliased && t.term != INTERCEPT)
        .filter_map(|t| {
            Some(ForestRow {
                label: t.term.clone(),
                estimate: t.odds_ratio?,
                low: t.ci_low?,
                high: t.ci_high?,
            })
        })
        .collect();

    let note = if gee.converged {
        let aliased = gee.terms.iter().filter(|t| t.aliased).count();
        (aliased > 0).then(|| format!("{aliased} aliased term(s) not estimated"))
    } else {
        Some(format!(
            "not converged after {} iteration(s): {}",
            gee.iterations,
            gee.message.as_deref().unwrap_or("unknown reason")
        ))
    };

    ForestPlot {
        title: format!(
            "{} GEE Odds Ratios ({} observations, {} clusters)",
            role_title(analysis),
            gee.observations,
            gee.clusters
        ),
        x_label: "Odds Ratio (95% CI)".to_string(),
        rows,
        note,
    }
}

/// File stem of every chart for one role, paired with its SVG
pub fn role_figures(
    analysis: &RoleAnalysis,
    palette: &Palette,
    four_fifths_threshold: f64,
) -> Vec<(String, String)> {
    let role = analysis.role.key();
    let mut figures = Vec::new();
    for attribute in attributes(analysis) {
        let stem = attribute.replace(|c: char| !c.is_ascii_alphanumeric() && c != '_', "_");
        figures.push((
            format!("{role}_{stem}_sr"),
            selection_rate_chart(analysis, attribute, palette).render(),
        ));
        figures.push((
            format!("{role}_{stem}_air"),
            air_chart(analysis, attribute, palette, four_fifths_threshold).render(),
        ));
    }
    figures.push((format!("{role}_gee_forest"), gee_forest(analysis).render()));
    figures
}
