//! Metric tables on disk
//!
//! Per role, under `metrics/`:
//! - `{role}_subgroup_rates.csv`
//! - `{role}_subgroup_air.csv`
//! - `{role}_fisher.csv`
//! - `{role}_gee.csv`
//! - `{role}_metrics.csv` (rate, AIR and p-values per group)
//! - `{role}_unparsed.csv`
//! - `{role}_analysis.json` (everything above, read back by plotting)

use std::path::PathBuf;

use artifacts::{ArtifactStore, CsvTable, Stage};
use contracts::{Role, RoleAnalysis};
use tracing::info;

use crate::error::Result;

const ANALYSIS_JSON: &str = "analysis.json";

pub fn rates_table(analysis: &RoleAnalysis) -> CsvTable {
    let mut table = CsvTable::new([
        "attribute",
        "value",
        "appearances",
        "selections",
        "selection_rate",
    ]);
    for r in &analysis.rates {
        table.push_row([
            r.attribute.clone(),
            r.value.clone(),
            r.appearances.to_string(),
            r.selections.to_string(),
            CsvTable::opt_f64(r.selection_rate),
        ]);
    }
    table
}

pub fn air_table(analysis: &RoleAnalysis) -> CsvTable {
    let mut table = CsvTable::new([
        "attribute",
        "value",
        "appearances",
        "selections",
        "selection_rate",
        "reference_rate",
        "AIR",
        "delta_SR",
        "below_four_fifths",
    ]);
    for r in &analysis.air {
        table.push_row([
            r.attribute.clone(),
            r.value.clone(),
            r.appearances.to_string(),
            r.selections.to_string(),
            CsvTable::opt_f64(r.selection_rate),
            CsvTable::opt_f64(r.reference_rate),
            CsvTable::opt_f64(r.air),
            CsvTable::opt_f64(r.delta_sr),
            CsvTable::opt_bool(r.below_four_fifths),
        ]);
    }
    table
}

pub fn fisher_table(analysis: &RoleAnalysis) -> CsvTable {
    let mut table = CsvTable::new(["attribute", "value", "p_raw", "p_holm", "significant"]);
    for r in &analysis.fisher {
        table.push_row([
            r.attribute.clone(),
            r.value.clone(),
            r.p_raw.to_string(),
            r.p_holm.to_string(),
            r.significant.to_string(),
        ]);
    }
    table
}

pub fn metrics_table(analysis: &RoleAnalysis) -> CsvTable {
    let mut table = CsvTable::new([
        "attribute",
        "value",
        "selection_rate",
        "AIR",
        "p_raw",
        "p_holm",
    ]);
    for r in &analysis.metrics {
        table.push_row([
            r.attribute.clone(),
            r.value.clone(),
            CsvTable::opt_f64(r.selection_rate),
            CsvTable::opt_f64(r.air),
            CsvTable::opt_f64(r.p_raw),
            CsvTable::opt_f64(r.p_holm),
        ]);
    }
    table
}

/// Coefficients plus fit diagnostics; a non-converged fit is visible in the
/// `converged` and `message` columns of every row.
pub fn gee_table(analysis: &RoleAnalysis) -> CsvTable {
    let gee = &analysis.gee;
    let mut table = CsvTable::new([
        "term",
        "aliased",
        "coef",
        "std_err",
        "z",
        "p_value",
        "odds_ratio",
        "ci_low",
        "ci_high",
        "converged",
        "iterations",
        "message",
    ]);
    for t in &gee.terms {
        table.push_row([
            t.term.clone(),
            t.aliased.to_string(),
            CsvTable::opt_f64(t.coef),
            CsvTable::opt_f64(t.std_err),
            CsvTable::opt_f64(t.z),
            CsvTable::opt_f64(t.p_value),
            CsvTable::opt_f64(t.odds_ratio),
            CsvTable::opt_f64(t.ci_low),
            CsvTable::opt_f64(t.ci_high),
            gee.converged.to_string(),
            gee.iterations.to_string(),
            gee.message.clone().unwrap_or_default(),
        ]);
    }
    table
}

pub fn unparsed_table(analysis: &RoleAnalysis) -> CsvTable {
    let mut table = CsvTable::new(["scenario_id", "reason"]);
    for u in &analysis.unparsed {
        table.push_row([u.scenario_id.clone(), u.reason.clone()]);
    }
    table
}

/// Write every table of one role; returns the written paths
pub fn save_analysis(
    store: &mut ArtifactStore,
    analysis: &RoleAnalysis,
) -> Result<Vec<PathBuf>> {
    let role = analysis.role;
    let tables = [
        ("subgroup_rates.csv", rates_table(analysis)),
        ("subgroup_air.csv", air_table(analysis)),
        ("fisher.csv", fisher_table(analysis)),
        ("gee.csv", gee_table(analysis)),
        ("metrics.csv", metrics_table(analysis)),
        ("unparsed.csv", unparsed_table(analysis)),
    ];

    let mut written = Vec::with_capacity(tables.len() + 1);
    for (name, table) in &tables {
        let path = store.layout().metric(role, name);
        store.write_csv(&path, table)?;
        written.push(path);
    }
    let path = analysis_path(store, role);
    store.write_json(&path, analysis)?;
    written.push(path);

    info!(role = %role, files = written.len(), "metrics written");
    Ok(written)
}

/// Analysis of `role` written by [`save_analysis`]
/// `metrics/{role}_analysis.json`
pub fn analysis_path(store: &ArtifactStore, role: Role) -> PathBuf {
    store.layout().metric(role, ANALYSIS_JSON)
}

pub fn load_analysis(store: &ArtifactStore, role: Role) -> Result<RoleAnalysis> {
    let path = analysis_path(store, role);
    Ok(store.read_json(&path, Stage::Analyze)?)
}
