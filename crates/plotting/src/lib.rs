//! # Plotting
//!
//! SVG charts rendered from the analysis stage's output.
//!
//! Per role and attribute:
//! - `plots/{role}_{attribute}_sr.svg`: selection rate per value
//! - `plots/{role}_{attribute}_air.svg`: AIR per value with the parity
//!   line (1.0, dashed) and the four-fifths line (dotted)
//!
//! Per role:
//! - `plots/{role}_gee_forest.svg`: GEE odds ratios with 95% CI and the
//!   null-effect line at OR = 1
//!
//! Colours are keyed by attribute value and shared across roles.

mod charts;
mod figures;
mod palette;
mod svg;

pub use charts::{Bar, BarChart, ForestPlot, ForestRow, ReferenceLine};
pub use figures::{air_chart, gee_forest, role_figures, selection_rate_chart};
pub use palette::{Palette, TAB10};
pub use svg::{escape, Stroke};

use std::path::PathBuf;

use artifacts::{ArtifactStore, Result};
use contracts::{AnalysisConfig, RoleAnalysis};
use tracing::{info, instrument};

/// Rendering options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotOptions {
    /// Height of the dotted line on AIR charts
    pub four_fifths_threshold: f64,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            four_fifths_threshold: 0.8,
        }
    }
}

impl PlotOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            four_fifths_threshold: config.four_fifths_threshold,
        }
    }
}

/// Render every chart for `analyses` and write them under `plots/`
///
/// Returns the written paths in rendering order.
#[instrument(name = "render_plots", skip_all, fields(roles = analyses.len()))]
pub fn render_plots(
    store: &mut ArtifactStore,
    analyses: &[RoleAnalysis],
    options: PlotOptions,
) -> Result<Vec<PathBuf>> {
    let palette = Palette::from_analyses(analyses);
    let mut written = Vec::new();
    for analysis in analyses {
        let figures = role_figures(analysis, &palette, options.four_fifths_threshold);
        for (stem, svg) in figures {
            let path = store.layout().plot(&format!("{stem}.svg"));
            store.write_text(&path, &svg)?;
            written.push(path);
        }
        info!(role = %analysis.role, "plots rendered");
    }
    info!(files = written.len(), "all plots written");
    Ok(written)
}
