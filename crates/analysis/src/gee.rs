//! Generalized estimating equations for the selection outcome
//!
//! Model: `logit P(selected) = Xβ`, binomial family with scale fixed at 1,
//! exchangeable working correlation within batch composition groups.
//! Categorical attributes use treatment coding against the reference level.
//!
//! Fitting is Fisher scoring on the GEE score
//!
//! ```text
//! U(β) = Σ_i D_iᵀ V_i⁻¹ (y_i − μ_i),   V_i = A_i^½ R(α) A_i^½
//! ```
//!
//! with α re-estimated from Pearson residuals before every step. Standard
//! errors come from the robust sandwich `H⁻¹ (Σ_i U_i U_iᵀ) H⁻¹`.

use std::collections::HashMap;

use contracts::{GeeReport, GeeTerm, Role, UNSPECIFIED};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::observations::Observation;
use crate::rates::GroupSpec;

const INTERCEPT: &str = "Intercept";
/// Column counts as aliased when its residual after projecting out the
/// earlier columns keeps less than this share of its squared norm
const ALIAS_TOLERANCE: f64 = 1e-10;
/// Fitted probabilities are kept inside `[MU_EPS, 1 - MU_EPS]`
const MU_EPS: f64 = 1e-10;
/// Two-sided 95% normal quantile
const Z_95: f64 = 1.959_963_984_540_054;

/// Iteration controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeeOptions {
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for GeeOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1e-8,
        }
    }
}

/// Design matrix column
#[derive(Debug, Clone)]
struct Column {
    name: String,
    values: Vec<f64>,
    aliased: bool,
}

/// Intercept plus one indicator per observed non-reference level, in
/// attribute order. Levels follow the configured order with unconfigured
/// ones (`unspecified` last) after them.
fn design_columns(specs: &[GroupSpec], rows: &[Observation]) -> Vec<Column> {
    let mut columns = vec![Column {
        name: INTERCEPT.to_string(),
        values: vec![1.0; rows.len()],
        aliased: false,
    }];

    for spec in specs {
        let labels: Vec<String> = rows
            .iter()
            .map(|r| r.persona.group_value(&spec.attribute))
            .collect();

        let mut levels: Vec<&str> = spec
            .values
            .iter()
            .map(String::as_str)
            .filter(|v| labels.iter().any(|l| l == v))
            .collect();
        let mut extra: Vec<&str> = labels
            .iter()
            .map(String::as_str)
            .filter(|l| !spec.values.iter().any(|v| v == l))
            .collect();
        extra.sort_by(|a, b| {
            (*a == UNSPECIFIED)
                .cmp(&(*b == UNSPECIFIED))
                .then(a.cmp(b))
        });
        extra.dedup();
        levels.extend(extra);

        for level in levels.into_iter().filter(|l| *l != spec.reference) {
            columns.push(Column {
                name: format!("{}[T.{level}]", spec.attribute),
                values: labels
                    .iter()
                    .map(|l| if l == level { 1.0 } else { 0.0 })
                    .collect(),
                aliased: false,
            });
        }
    }

    mark_aliased(&mut columns);
    columns
}

/// Flag columns lying in the span of the earlier kept columns
/// (sequential Gram-Schmidt).
fn mark_aliased(columns: &mut [Column]) {
    let mut basis: Vec<DVector<f64>> = Vec::new();
    for column in columns.iter_mut() {
        let x = DVector::from_column_slice(&column.values);
        let norm_sq = x.norm_squared();
        let mut residual = x;
        for q in &basis {
            let proj = q.dot(&residual);
            residual.axpy(-proj, q, 1.0);
        }
        let rest = residual.norm_squared();
        if norm_sq == 0.0 || rest <= ALIAS_TOLERANCE * norm_sq {
            column.aliased = true;
        } else {
            basis.push(residual / rest.sqrt());
        }
    }
}

/// Row indices of every cluster, clusters in order of first appearance
fn clusters(rows: &[Observation]) -> Vec<Vec<usize>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let slot = *index.entry(row.cluster.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

fn expit(eta: f64) -> f64 {
    1.0 / (1.0 + (-eta).exp())
}

/// Complementary error function (Numerical Recipes `erfcc`), relative
/// error below 1.2e-7
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Two-sided normal p-value of a Wald statistic
fn wald_p(z: f64) -> f64 {
    erfc(z.abs() / std::f64::consts::SQRT_2)
}

struct Problem<'a> {
    x: &'a DMatrix<f64>,
    y: &'a DVector<f64>,
    clusters: &'a [Vec<usize>],
}

/// Per-cluster pieces at the current β
struct ClusterTerms {
    /// `A^½ X` restricted to the cluster
    w: DMatrix<f64>,
    /// Pearson residuals
    r: DVector<f64>,
}

impl Problem<'_> {
    fn cluster_terms(&self, beta: &DVector<f64>, idx: &[usize]) -> ClusterTerms {
        let p = self.x.ncols();
        let mut w = DMatrix::zeros(idx.len(), p);
        let mut r = DVector::zeros(idx.len());
        for (k, &i) in idx.iter().enumerate() {
            let row = self.x.row(i);
            let mu = expit(row.dot(&beta.transpose())).clamp(MU_EPS, 1.0 - MU_EPS);
            let sd = (mu * (1.0 - mu)).sqrt();
            w.row_mut(k).copy_from(&(row * sd));
            r[k] = (self.y[i] - mu) / sd;
        }
        ClusterTerms { w, r }
    }

    /// Moment estimate of the exchangeable correlation
    fn estimate_alpha(&self, beta: &DVector<f64>) -> f64 {
        let p = self.x.ncols() as f64;
        let n = self.x.nrows() as f64;
        let mut pairs = 0.0;
        let mut cross = 0.0;
        let mut squares = 0.0;
        let mut largest = 1usize;

        for idx in self.clusters {
            let terms = self.cluster_terms(beta, idx);
            let sum = terms.r.sum();
            let sq = terms.r.norm_squared();
            squares += sq;
            cross += (sum * sum - sq) / 2.0;
            let m = idx.len() as f64;
            pairs += m * (m - 1.0) / 2.0;
            largest = largest.max(idx.len());
        }

        if pairs - p <= 0.0 || n - p <= 0.0 || squares <= 0.0 {
            return 0.0;
        }
        let scale = squares / (n - p);
        let alpha = cross / (scale * (pairs - p));
        // keep R(α) positive definite for the largest cluster
        let lower = if largest > 1 {
            -1.0 / (largest as f64 - 1.0) + 1e-6
        } else {
            0.0
        };
        if alpha.is_finite() {
            alpha.clamp(lower, 0.999)
        } else {
            0.0
        }
    }

    /// `R(α)⁻¹ M` for a cluster of size `m`, applied column-wise
    fn apply_r_inv(alpha: f64, m: &DMatrix<f64>) -> DMatrix<f64> {
        let size = m.nrows() as f64;
        let c = alpha / (1.0 + (size - 1.0) * alpha);
        let mut out = m.clone();
        for mut col in out.column_iter_mut() {
            let total = col.sum();
            col.add_scalar_mut(-c * total);
        }
        out / (1.0 - alpha)
    }

    /// Information matrix, score and per-cluster scores
    fn accumulate(
        &self,
        beta: &DVector<f64>,
        alpha: f64,
    ) -> (DMatrix<f64>, DVector<f64>, Vec<DVector<f64>>) {
        let p = self.x.ncols();
        let mut info = DMatrix::zeros(p, p);
        let mut score = DVector::zeros(p);
        let mut scores = Vec::with_capacity(self.clusters.len());

        for idx in self.clusters {
            let terms = self.cluster_terms(beta, idx);
            let rw = Self::apply_r_inv(alpha, &terms.w);
            let r = DMatrix::from_column_slice(idx.len(), 1, terms.r.as_slice());
            let rr = Self::apply_r_inv(alpha, &r);
            info += terms.w.transpose() * &rw;
            let u = (terms.w.transpose() * rr).column(0).into_owned();
            score += &u;
            scores.push(u);
        }
        (info, score, scores)
    }
}

/// Fit the model for one role and report estimates or the reason the fit
/// failed.
pub fn fit_gee(
    role: Role,
    specs: &[GroupSpec],
    rows: &[Observation],
    options: GeeOptions,
) -> GeeReport {
    let columns = design_columns(specs, rows);
    let groups = clusters(rows);
    let mut report = GeeReport {
        role,
        converged: false,
        iterations: 0,
        message: None,
        observations: rows.len(),
        clusters: groups.len(),
        working_correlation: None,
        terms: columns
            .iter()
            .map(|c| empty_term(&c.name, c.aliased))
            .collect(),
    };

    if rows.is_empty() {
        report.message = Some("no observations".to_string());
        return report;
    }
    let selected = rows.iter().filter(|r| r.selected).count();
    if selected == 0 || selected == rows.len() {
        report.message = Some("outcome is constant (all or no candidates selected)".into());
        return report;
    }

    let kept: Vec<&Column> = columns.iter().filter(|c| !c.aliased).collect();
    let x = DMatrix::from_fn(rows.len(), kept.len(), |i, j| kept[j].values[i]);
    let y = DVector::from_iterator(
        rows.len(),
        rows.iter().map(|r| if r.selected { 1.0 } else { 0.0 }),
    );
    let problem = Problem {
        x: &x,
        y: &y,
        clusters: &groups,
    };

    let mean = selected as f64 / rows.len() as f64;
    let mut beta = DVector::zeros(kept.len());
    beta[0] = (mean / (1.0 - mean)).ln();

    let mut failure: Option<String> = None;
    for iteration in 1..=options.max_iter {
        report.iterations = iteration;
        let alpha = problem.estimate_alpha(&beta);
        let (info, score, _) = problem.accumulate(&beta, alpha);
        let Some(inverse) = info.try_inverse() else {
            failure = Some("singular information matrix".to_string());
            break;
        };
        let step = inverse * score;
        beta += &step;

        if !beta.iter().all(|b| b.is_finite()) {
            failure = Some("non-finite coefficient estimates".to_string());
            break;
        }
        if step.amax() < options.tolerance {
            report.converged = true;
            break;
        }
    }

    if let Some(reason) = failure {
        warn!(
            role = %role,
            iterations = report.iterations,
            reason = %reason,
            "GEE fit failed"
        );
        report.message = Some(reason);
        return report;
    }
    if !report.converged {
        let reason = format!("iteration limit ({}) reached", options.max_iter);
        warn!(role = %role, reason = %reason, "GEE did not converge");
        report.message = Some(reason);
    }

    let alpha = problem.estimate_alpha(&beta);
    let (info, _, scores) = problem.accumulate(&beta, alpha);
    let Some(bread) = info.try_inverse() else {
        report.converged = false;
        report.message = Some("singular information matrix at the final estimate".to_string());
        return report;
    };
    let mut meat = DMatrix::zeros(kept.len(), kept.len());
    for u in &scores {
        meat += u * u.transpose();
    }
    let cov = &bread * meat * &bread;

    report.working_correlation = Some(alpha);
    let mut estimate = 0;
    for (term, column) in report.terms.iter_mut().zip(&columns) {
        if column.aliased {
            continue;
        }
        let coef = beta[estimate];
        let variance = cov[(estimate, estimate)];
        estimate += 1;

        let std_err = (variance > 0.0).then(|| variance.sqrt());
        let z = std_err.map(|se| coef / se);
        term.coef = Some(coef);
        term.std_err = std_err;
        term.z = z;
        term.p_value = z.map(wald_p);
        term.odds_ratio = Some(coef.exp());
        term.ci_low = std_err.map(|se| (coef - Z_95 * se).exp());
        term.ci_high = std_err.map(|se| (coef + Z_95 * se).exp());
    }

    debug!(
        role = %role,
        converged = report.converged,
        iterations = report.iterations,
        alpha,
        "GEE fitted"
    );
    report
}

fn empty_term(name: &str, aliased: bool) -> GeeTerm {
    GeeTerm {
        term: name.to_string(),
        aliased,
        coef: None,
        std_err: None,
        z: None,
        p_value: None,
        odds_ratio: None,
        ci_low: None,
        ci_high: None,
    }
}
