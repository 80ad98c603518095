//! Human-readable stage summaries printed to stdout.

use contracts::RoleAnalysis;
use runner::RunReport;

/// Print the model-run summary and where its logs went
pub fn print_run_report(report: &RunReport) {
    println!();
    print!("{}", report.summary);
    println!("Progress: {}/{} prompts", report.done, report.total);
    println!(
        "Run log: {} ({} records)",
        report.run_log.display(),
        report.records_written
    );
    if report.failures_written > 0 {
        println!(
            "Failure log: {} ({} failures)",
            report.failure_log.display(),
            report.failures_written
        );
    }
    if !report.is_complete() {
        println!("Run is incomplete; re-run the same command to resume.");
    }
    println!();
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

/// Print the headline numbers of one role's analysis
pub fn print_analysis(analysis: &RoleAnalysis) {
    println!("\n=== Fairness Analysis ({}) ===", analysis.role);
    println!(
        "Records: {} used of {} ({} unparseable)",
        analysis.records_used,
        analysis.records_total,
        analysis.unparsed.len()
    );

    println!(
        "\n{:<14} {:<24} {:>6} {:>6} {:>8} {:>8} {:>9}",
        "attribute", "value", "n", "sel", "SR", "AIR", "p_holm"
    );
    for metric in &analysis.metrics {
        let counts = analysis
            .rates
            .iter()
            .find(|r| r.attribute == metric.attribute && r.value == metric.value);
        let flag = analysis
            .air
            .iter()
            .find(|a| a.attribute == metric.attribute && a.value == metric.value)
            .and_then(|a| a.below_four_fifths)
            .filter(|&below| below)
            .map_or("", |_| " *");
        println!(
            "{:<14} {:<24} {:>6} {:>6} {:>8} {:>8} {:>9}{flag}",
            metric.attribute,
            metric.value,
            counts.map_or(0, |c| c.appearances),
            counts.map_or(0, |c| c.selections),
            fmt_opt(metric.selection_rate),
            fmt_opt(metric.air),
            fmt_opt(metric.p_holm),
        );
    }
    println!("(* AIR below the four-fifths threshold)");

    let gee = &analysis.gee;
    if gee.converged {
        println!(
            "\nGEE: converged in {} iterations ({} observations, {} clusters, rho = {})",
            gee.iterations,
            gee.observations,
            gee.clusters,
            fmt_opt(gee.working_correlation)
        );
    } else {
        println!(
            "\nGEE: not converged after {} iterations: {}",
            gee.iterations,
            gee.message.as_deref().unwrap_or("unknown reason")
        );
    }
    for term in &gee.terms {
        if term.aliased {
            println!("   {:<32} aliased", term.term);
        } else {
            println!(
                "   {:<32} OR {} [{}, {}]  p = {}",
                term.term,
                fmt_opt(term.odds_ratio),
                fmt_opt(term.ci_low),
                fmt_opt(term.ci_high),
                fmt_opt(term.p_value)
            );
        }
    }
    println!();
}
