//! Metric contracts produced by the analysis stage and consumed by plotting.
//!
//! Undefined quantities are `None` and serialize as `null`, never as zero.

use serde::{Deserialize, Serialize};

use crate::Role;

/// Appearance and selection counts for one attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRate {
    pub attribute: String,
    pub value: String,
    pub appearances: u64,
    pub selections: u64,
    /// `selections / appearances`; None when the group never appeared
    pub selection_rate: Option<f64>,
}

/// Adverse impact of one group against its attribute's reference group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirRecord {
    pub attribute: String,
    pub value: String,
    pub is_reference: bool,
    pub appearances: u64,
    pub selections: u64,
    pub selection_rate: Option<f64>,
    pub reference_rate: Option<f64>,
    pub air: Option<f64>,
    pub delta_sr: Option<f64>,
    pub below_four_fifths: Option<bool>,
}

/// One-sided Fisher test of a group against its reference, Holm-adjusted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FisherRecord {
    pub attribute: String,
    pub value: String,
    pub p_raw: f64,
    pub p_holm: f64,
    pub significant: bool,
}

/// Combined per-group summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub attribute: String,
    pub value: String,
    pub selection_rate: Option<f64>,
    pub air: Option<f64>,
    pub p_raw: Option<f64>,
    pub p_holm: Option<f64>,
}

/// One GEE coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeeTerm {
    pub term: String,
    /// Column duplicated an earlier column and was not estimated
    pub aliased: bool,
    pub coef: Option<f64>,
    pub std_err: Option<f64>,
    pub z: Option<f64>,
    pub p_value: Option<f64>,
    pub odds_ratio: Option<f64>,
    pub ci_low: Option<f64>,
    pub ci_high: Option<f64>,
}

/// GEE fit for one role, including convergence diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeeReport {
    pub role: Role,
    pub converged: bool,
    pub iterations: usize,
    /// Reason for non-convergence
    pub message: Option<String>,
    pub observations: usize,
    pub clusters: usize,
    /// Estimated exchangeable working correlation
    pub working_correlation: Option<f64>,
    pub terms: Vec<GeeTerm>,
}

/// Response excluded from aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnparsedResponse {
    pub scenario_id: String,
    pub reason: String,
}

/// Everything the analysis stage derives for one role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAnalysis {
    pub role: Role,
    pub records_total: usize,
    pub records_used: usize,
    pub unparsed: Vec<UnparsedResponse>,
    pub rates: Vec<GroupRate>,
    pub air: Vec<AirRecord>,
    pub fisher: Vec<FisherRecord>,
    pub metrics: Vec<MetricRecord>,
    pub gee: GeeReport,
}
