//! Chart layouts: vertical bar chart and horizontal forest plot

use crate::svg::{Anchor, Stroke, SvgCanvas, TextStyle};

const AXIS_COLOR: &str = "#333333";
const GRID_COLOR: &str = "#e5e5e5";
const REFERENCE_COLOR: &str = "#808080";
const ESTIMATE_COLOR: &str = "#1f77b4";
const NULL_EFFECT_COLOR: &str = "#d62728";

const TITLE_SIZE: f64 = 15.0;
const LABEL_SIZE: f64 = 12.0;
const TICK_SIZE: f64 = 10.0;

// ============================================================================
// Bar chart
// ============================================================================

/// One bar; `value == None` renders an "n/a" marker instead of a bar
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
    pub color: &'static str,
}

/// Horizontal line across the plot area (parity, four-fifths)
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub value: f64,
    pub stroke: Stroke,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
    pub reference_lines: Vec<ReferenceLine>,
}

impl BarChart {
    const LEFT: f64 = 70.0;
    const RIGHT: f64 = 40.0;
    const TOP: f64 = 50.0;
    const BOTTOM: f64 = 110.0;
    const SLOT: f64 = 64.0;
    const PLOT_HEIGHT: f64 = 260.0;
    const TICKS: usize = 5;

    /// Upper bound of the y axis: 10% headroom over the tallest bar or line
    pub fn y_max(&self) -> f64 {
        let tallest = self
            .bars
            .iter()
            .filter_map(|b| b.value)
            .chain(self.reference_lines.iter().map(|l| l.value))
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        if tallest > 0.0 {
            tallest * 1.1
        } else {
            1.0
        }
    }

    pub fn render(&self) -> String {
        let plot_width = (Self::SLOT * self.bars.len() as f64).max(4.0 * Self::SLOT);
        let width = Self::LEFT + plot_width + Self::RIGHT;
        let height = Self::TOP + Self::PLOT_HEIGHT + Self::BOTTOM;
        let baseline = Self::TOP + Self::PLOT_HEIGHT;
        let y_max = self.y_max();
        let y = |v: f64| baseline - Self::PLOT_HEIGHT * (v / y_max);

        let mut svg = SvgCanvas::new(width, height);
        svg.text(
            width / 2.0,
            28.0,
            &self.title,
            TextStyle::sized(TITLE_SIZE)
                .anchored(Anchor::Middle)
                .bold(),
        );

        for i in 0..=Self::TICKS {
            let v = y_max * i as f64 / Self::TICKS as f64;
            let ty = y(v);
            if i > 0 {
                svg.line(
                    (Self::LEFT, ty),
                    (Self::LEFT + plot_width, ty),
                    GRID_COLOR,
                    1.0,
                    Stroke::Solid,
                );
            }
            svg.line((Self::LEFT - 4.0, ty), (Self::LEFT, ty), AXIS_COLOR, 1.0, Stroke::Solid);
            svg.text(
                Self::LEFT - 7.0,
                ty + 3.5,
                &format!("{v:.2}"),
                TextStyle::sized(TICK_SIZE).anchored(Anchor::End),
            );
        }

        for (i, bar) in self.bars.iter().enumerate() {
            let center = Self::LEFT + Self::SLOT * (i as f64 + 0.5);
            match bar.value.filter(|v| v.is_finite()) {
                Some(v) => {
                    let top = y(v.max(0.0));
                    svg.rect(
                        center - Self::SLOT * 0.35,
                        top,
                        Self::SLOT * 0.7,
                        baseline - top,
                        bar.color,
                    );
                    svg.text(
                        center,
                        top - 4.0,
                        &format!("{v:.2}"),
                        TextStyle::sized(TICK_SIZE).anchored(Anchor::Middle),
                    );
                }
                None => svg.text(
                    center,
                    baseline - 4.0,
                    "n/a",
                    TextStyle::sized(TICK_SIZE).anchored(Anchor::Middle),
                ),
            }
            svg.text(
                center,
                baseline + 14.0,
                &bar.label,
                TextStyle::sized(LABEL_SIZE)
                    .anchored(Anchor::End)
                    .rotated(-35.0),
            );
        }

        for line in &self.reference_lines {
            let ly = y(line.value);
            svg.line(
                (Self::LEFT, ly),
                (Self::LEFT + plot_width, ly),
                REFERENCE_COLOR,
                1.2,
                line.stroke,
            );
            svg.text(
                Self::LEFT + plot_width + 3.0,
                ly + 3.5,
                &line.label,
                TextStyle::sized(TICK_SIZE),
            );
        }

        svg.line((Self::LEFT, Self::TOP), (Self::LEFT, baseline), AXIS_COLOR, 1.0, Stroke::Solid);
        svg.line(
            (Self::LEFT, baseline),
            (Self::LEFT + plot_width, baseline),
            AXIS_COLOR,
            1.0,
            Stroke::Solid,
        );
        svg.text(
            18.0,
            Self::TOP + Self::PLOT_HEIGHT / 2.0,
            &self.y_label,
            TextStyle::sized(LABEL_SIZE)
                .anchored(Anchor::Middle)
                .rotated(-90.0),
        );

        if self.bars.iter().any(|b| b.value.is_none()) {
            svg.text(
                Self::LEFT,
                height - 8.0,
                "n/a: group never appeared or reference rate is zero",
                TextStyle::sized(TICK_SIZE),
            );
        }

        svg.finish()
    }
}

// ============================================================================
// Forest plot
// ============================================================================

/// One estimate with its confidence interval, on the odds-ratio scale
#[derive(Debug, Clone, PartialEq)]
pub struct ForestRow {
    pub label: String,
    pub estimate: f64,
    pub low: f64,
    pub high: f64,
}

impl ForestRow {
    /// Drawable on a log axis
    fn is_drawable(&self) -> bool {
        [self.estimate, self.low, self.high]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForestPlot {
    pub title: String,
    pub x_label: String,
    pub rows: Vec<ForestRow>,
    /// Shown under the title, e.g. convergence problems
    pub note: Option<String>,
}

impl ForestPlot {
    const LEFT: f64 = 230.0;
    const RIGHT: f64 = 40.0;
    const TOP: f64 = 60.0;
    const BOTTOM: f64 = 60.0;
    const ROW: f64 = 26.0;
    const WIDTH: f64 = 700.0;
    const TICK_CANDIDATES: [f64; 13] = [
        0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0,
    ];

    /// Rows that can be placed on the log axis
    pub fn drawable_rows(&self) -> Vec<&ForestRow> {
        self.rows.iter().filter(|r| r.is_drawable()).collect()
    }

    /// ln-scale domain including OR = 1, padded by 5% per side
    fn log_domain(rows: &[&ForestRow]) -> (f64, f64) {
        let (mut lo, mut hi) = rows
            .iter()
            .fold((0.0_f64, 0.0_f64), |(lo, hi), r| (lo.min(r.low.ln()), hi.max(r.high.ln())));
        if hi - lo < 1e-9 {
            lo -= 0.1;
            hi += 0.1;
        }
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }

    pub fn render(&self) -> String {
        let rows = self.drawable_rows();
        let plot_width = Self::WIDTH - Self::LEFT - Self::RIGHT;
        let plot_height = Self::ROW * rows.len().max(2) as f64;
        let height = Self::TOP + plot_height + Self::BOTTOM;
        let bottom = Self::TOP + plot_height;

        let mut svg = SvgCanvas::new(Self::WIDTH, height);
        svg.text(
            Self::WIDTH / 2.0,
            26.0,
            &self.title,
            TextStyle::sized(TITLE_SIZE)
                .anchored(Anchor::Middle)
                .bold(),
        );
        if let Some(note) = &self.note {
            svg.text(
                Self::WIDTH / 2.0,
                44.0,
                note,
                TextStyle::sized(TICK_SIZE).anchored(Anchor::Middle),
            );
        }

        if rows.is_empty() {
            svg.text(
                Self::LEFT + plot_width / 2.0,
                Self::TOP + plot_height / 2.0,
                "no estimable terms",
                TextStyle::sized(LABEL_SIZE).anchored(Anchor::Middle),
            );
            return svg.finish();
        }

        let (lo, hi) = Self::log_domain(&rows);
        let x = |v: f64| Self::LEFT + plot_width * (v.ln() - lo) / (hi - lo);

        for tick in Self::TICK_CANDIDATES {
            let ln = tick.ln();
            if ln < lo || ln > hi {
                continue;
            }
            let tx = x(tick);
            svg.line((tx, Self::TOP), (tx, bottom), GRID_COLOR, 1.0, Stroke::Solid);
            svg.line((tx, bottom), (tx, bottom + 4.0), AXIS_COLOR, 1.0, Stroke::Solid);
            svg.text(
                tx,
                bottom + 16.0,
                &format!("{tick}"),
                TextStyle::sized(TICK_SIZE).anchored(Anchor::Middle),
            );
        }

        svg.line(
            (x(1.0), Self::TOP),
            (x(1.0), bottom),
            NULL_EFFECT_COLOR,
            1.2,
            Stroke::Dashed,
        );

        for (i, row) in rows.iter().enumerate() {
            let cy = Self::TOP + Self::ROW * (i as f64 + 0.5);
            svg.text(
                Self::LEFT - 10.0,
                cy + 4.0,
                &row.label,
                TextStyle::sized(LABEL_SIZE).anchored(Anchor::End),
            );
            svg.line((x(row.low), cy), (x(row.high), cy), ESTIMATE_COLOR, 2.0, Stroke::Solid);
            for end in [row.low, row.high] {
                svg.line(
                    (x(end), cy - 4.0),
                    (x(end), cy + 4.0),
                    ESTIMATE_COLOR,
                    2.0,
                    Stroke::Solid,
                );
            }
            svg.circle(x(row.estimate), cy, 4.0, ESTIMATE_COLOR);
        }

        svg.line(
            (Self::LEFT, bottom),
            (Self::LEFT + plot_width, bottom),
            AXIS_COLOR,
            1.0,
            Stroke::Solid,
        );
        svg.text(
            Self::LEFT + plot_width / 2.0,
            height - 14.0,
            &self.x_label,
            TextStyle::sized(LABEL_SIZE).anchored(Anchor::Middle),
        );

        svg.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(values: &[Option<f64>]) -> BarChart {
        BarChart {
            title: "SWE Selection Rate by Group".into(),
            y_label: "Selection rate".into(),
            bars: values
                .iter()
                .enumerate()
                .map(|(i, &value)| Bar {
                    label: format!("g{i}"),
                    value,
                    color: "#1f77b4",
                })
                .collect(),
            reference_lines: Vec::new(),
        }
    }

    #[test]
    fn test_bar_chart_draws_defined_bars() {
        let svg = bars(&[Some(0.4), Some(0.8), None]).render();
        // background + two bars
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains(">n/a</text>"));
        assert!(svg.contains(">0.80</text>"));
        assert!(svg.contains(">g2</text>"));
        assert!(svg.contains("group never appeared"));
    }

    #[test]
    fn test_y_max_headroom() {
        assert!((bars(&[Some(0.5), Some(0.25)]).y_max() - 0.55).abs() < 1e-12);
        assert_eq!(bars(&[None]).y_max(), 1.0);
        assert_eq!(bars(&[Some(0.0)]).y_max(), 1.0);

        let mut chart = bars(&[Some(0.5)]);
        chart.reference_lines.push(ReferenceLine {
            value: 1.0,
            stroke: Stroke::Dashed,
            label: "parity".into(),
        });
        assert!((chart.y_max() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_reference_lines_rendered() {
        let mut chart = bars(&[Some(0.5), Some(1.0)]);
        chart.reference_lines = vec![
            ReferenceLine {
                value: 1.0,
                stroke: Stroke::Dashed,
                label: "parity".into(),
            },
            ReferenceLine {
                value: 0.8,
                stroke: Stroke::Dotted,
                label: "4/5".into(),
            },
        ];
        let svg = chart.render();
        assert!(svg.contains(r#"stroke-dasharray="6,4""#));
        assert!(svg.contains(r#"stroke-dasharray="2,3""#));
        assert!(svg.contains(">4/5</text>"));
        assert!(!svg.contains("group never appeared"));
    }

    fn forest(rows: Vec<ForestRow>) -> ForestPlot {
        ForestPlot {
            title: "SWE GEE Odds Ratios".into(),
            x_label: "Odds Ratio (95% CI)".into(),
            rows,
            note: None,
        }
    }

    #[test]
    fn test_forest_plot_rows() {
        let plot = forest(vec![
            ForestRow {
                label: "group[T.minority]".into(),
                estimate: 0.17,
                low: 0.05,
                high: 0.6,
            },
            ForestRow {
                label: "tier[T.junior]".into(),
                estimate: 1.2,
                low: 0.7,
                high: 2.1,
            },
            ForestRow {
                label: "broken".into(),
                estimate: 1.0,
                low: 0.0,
                high: f64::INFINITY,
            },
        ]);
        assert_eq!(plot.drawable_rows().len(), 2);

        let svg = plot.render();
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains(">group[T.minority]</text>"));
        assert!(!svg.contains(">broken</text>"));
        assert!(svg.contains(r##"stroke="#d62728" stroke-width="1.2" stroke-dasharray="6,4""##));
        assert!(svg.contains(">1</text>"));
        assert!(svg.contains(">Odds Ratio (95% CI)</text>"));
    }

    #[test]
    fn test_forest_plot_without_rows() {
        let mut plot = forest(Vec::new());
        plot.note = Some("not converged: singular information matrix".into());
        let svg = plot.render();
        assert!(svg.contains("no estimable terms"));
        assert!(svg.contains("singular information matrix"));
        assert_eq!(svg.matches("<circle").count(), 0);
    }

    #[test]
    fn test_log_domain_contains_null_effect() {
        let row = ForestRow {
            label: "x".into(),
            estimate: 3.0,
            low: 2.0,
            high: 4.0,
        };
        let (lo, hi) = ForestPlot::log_domain(&[&row]);
        assert!(lo < 0.0);
        assert!(hi > 4.0_f64.ln());
    }
}
