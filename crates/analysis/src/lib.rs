//! # Analysis
//!
//! Turns a role's run records into fairness metrics.
//!
//! - Selection rate per attribute value (`selections / appearances`,
//!   undefined for groups that never appeared)
//! - Adverse impact ratio and ΔSR against each attribute's reference group
//! - One-sided Fisher exact tests with Holm correction
//! - Binomial GEE with batch-composition clusters
//!
//! The stage is deterministic: the same records give the same tables.

mod air;
mod error;
mod fisher;
mod gee;
mod observations;
mod rates;
mod report;

pub use air::adverse_impact;
pub use error::{AnalysisError, Result};
pub use fisher::{fisher_exact_less, fisher_tests, holm};
pub use gee::{fit_gee, GeeOptions};
pub use observations::{Observation, Observations};
pub use rates::{selection_rates, GroupSpec};
pub use report::{
    air_table, analysis_path, fisher_table, gee_table, load_analysis, metrics_table, rates_table,
    save_analysis, unparsed_table,
};

use contracts::{
    AirRecord, AnalysisConfig, FisherRecord, GroupRate, MetricRecord, PersonaConfig, Role,
    RoleAnalysis, RunRecord,
};
use tracing::{info, instrument, warn};

/// Full analysis of one role's run records
///
/// A role where no response parsed still gets a report: every rate is
/// undefined, the Fisher family is empty and the GEE report says why it
/// was not fitted.
#[instrument(name = "analyze_role", skip_all, fields(role = %role, records = records.len()))]
pub fn analyze_role(
    role: Role,
    records: &[RunRecord],
    personas: &PersonaConfig,
    config: &AnalysisConfig,
) -> RoleAnalysis {
    let observations = Observations::from_records(records);
    if observations.records_used == 0 {
        warn!(
            unparsed = observations.unparsed.len(),
            "no parseable responses; every rate is undefined"
        );
    }

    let specs = GroupSpec::from_config(personas);
    let rates = selection_rates(&specs, &observations.rows);
    let air = adverse_impact(&specs, &rates, config.four_fifths_threshold);
    let fisher = fisher_tests(&specs, &rates, config.alpha);
    let metrics = merge_metrics(&rates, &air, &fisher);
    let gee = fit_gee(
        role,
        &specs,
        &observations.rows,
        GeeOptions {
            max_iter: config.gee_max_iter,
            tolerance: config.gee_tolerance,
        },
    );

    let flagged = air
        .iter()
        .filter(|a| a.below_four_fifths == Some(true))
        .count();
    let significant = fisher.iter().filter(|f| f.significant).count();
    info!(
        used = observations.records_used,
        unparsed = observations.unparsed.len(),
        below_four_fifths = flagged,
        significant,
        gee_converged = gee.converged,
        "role analysed"
    );

    RoleAnalysis {
        role,
        records_total: observations.records_total,
        records_used: observations.records_used,
        unparsed: observations.unparsed,
        rates,
        air,
        fisher,
        metrics,
        gee,
    }
}

/// One row per group: rate, AIR and (for tested groups) p-values
fn merge_metrics(
    rates: &[GroupRate],
    air: &[AirRecord],
    fisher: &[FisherRecord],
) -> Vec<MetricRecord> {
    rates
        .iter()
        .zip(air)
        .map(|(rate, air)| {
            let test = fisher
                .iter()
                .find(|f| f.attribute == rate.attribute && f.value == rate.value);
            MetricRecord {
                attribute: rate.attribute.clone(),
                value: rate.value.clone(),
                selection_rate: rate.selection_rate,
                air: air.air,
                p_raw: test.map(|t| t.p_raw),
                p_holm: test.map(|t| t.p_holm),
            }
        })
        .collect()
}
