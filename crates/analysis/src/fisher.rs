//! One-sided Fisher exact test and Holm step-down correction

use contracts::{FisherRecord, GroupRate};

use crate::rates::GroupSpec;

/// P(X <= `sel_a`) for the 2x2 table
///
/// ```text
///             selected   not selected
/// group a     sel_a      app_a - sel_a
/// group b     sel_b      app_b - sel_b
/// ```
///
/// under the hypergeometric null with all margins fixed. This is the
/// one-sided (`less`) alternative: group a is selected less often than b.
pub fn fisher_exact_less(sel_a: u64, app_a: u64, sel_b: u64, app_b: u64) -> f64 {
    let n = app_a + app_b;
    let row = app_a;
    let col = sel_a + sel_b;
    if n == 0 {
        return 1.0;
    }

    let ln_fact = ln_factorials(n as usize);
    let ln_choose = |n: u64, k: u64| {
        ln_fact[n as usize] - ln_fact[k as usize] - ln_fact[(n - k) as usize]
    };
    let ln_total = ln_choose(n, row);

    let lo = (row + col).saturating_sub(n);
    let p: f64 = (lo..=sel_a)
        .map(|x| (ln_choose(col, x) + ln_choose(n - col, row - x) - ln_total).exp())
        .sum();
    p.min(1.0)
}

fn ln_factorials(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    table.push(0.0);
    let mut acc = 0.0;
    for k in 1..=n {
        acc += (k as f64).ln();
        table.push(acc);
    }
    table
}

/// Holm step-down adjusted p-values, in input order.
///
/// Sorted ascending, `p_holm(i) = min(1, max_{j <= i} (m - j + 1) * p(j))`
/// with 1-based ranks; every adjusted value is at least its raw value.
pub fn holm(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut adjusted = vec![0.0; m];
    let mut running = 0.0_f64;
    for (rank, &i) in order.iter().enumerate() {
        let scaled = ((m - rank) as f64 * p_values[i]).min(1.0);
        running = running.max(scaled);
        adjusted[i] = running;
    }
    adjusted
}

/// Test every non-reference group against its reference, then adjust the
/// whole family with Holm. Groups (or references) that never appeared are
/// left out of the family.
pub fn fisher_tests(specs: &[GroupSpec], rates: &[GroupRate], alpha: f64) -> Vec<FisherRecord> {
    let mut tested: Vec<(&GroupRate, f64)> = Vec::new();
    for spec in specs {
        let Some(reference) = rates
            .iter()
            .find(|r| r.attribute == spec.attribute && r.value == spec.reference)
            .filter(|r| r.appearances > 0)
        else {
            continue;
        };

        for row in rates.iter().filter(|r| {
            r.attribute == spec.attribute && r.value != spec.reference && r.appearances > 0
        }) {
            let p = fisher_exact_less(
                row.selections,
                row.appearances,
                reference.selections,
                reference.appearances,
            );
            tested.push((row, p));
        }
    }

    let raw: Vec<f64> = tested.iter().map(|(_, p)| *p).collect();
    let adjusted = holm(&raw);

    tested
        .into_iter()
        .zip(adjusted)
        .map(|((row, p_raw), p_holm)| FisherRecord {
            attribute: row.attribute.clone(),
            value: row.value.clone(),
            p_raw,
            p_holm,
            significant: p_holm < alpha,
        })
        .collect()
}
