//! Run summary and model comparison tables

use std::path::PathBuf;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::model::ModelScore;
use crate::pipeline::{ImputationPolicy, ImputationReport, ImputeStrategy};

/// Counts and timings collected while the pipeline runs
#[derive(Debug, Default)]
pub struct RunSummary {
    pub train_rows: usize,
    pub train_dropped_by_join: usize,
    pub test_rows: usize,
    pub test_dropped_by_join: usize,
    pub values_imputed_train: usize,
    pub values_imputed_test: usize,
    pub unseen_test_values: usize,
    pub n_features: usize,
    pub fit_rows: usize,
    pub valid_rows: usize,
    pub selected_model: Option<String>,
    pub output: Option<PathBuf>,
    pub step_times: Vec<(String, Duration)>,
}

fn indent(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn flag(count: usize) -> Color {
    if count == 0 {
        Color::White
    } else {
        Color::Yellow
    }
}

impl RunSummary {
    pub fn record_step(&mut self, name: &str, elapsed: Duration) {
        self.step_times.push((name.to_string(), elapsed));
    }

    pub fn total_time(&self) -> Duration {
        self.step_times.iter().map(|(_, d)| *d).sum()
    }

    pub fn display(&self) {
        section("📋", "RUN SUMMARY");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("🚆 Training rows (joined)"), Cell::new(self.train_rows)]);
        table.add_row(vec![
            Cell::new("🔗 Training rows dropped by join"),
            Cell::new(self.train_dropped_by_join).fg(flag(self.train_dropped_by_join)),
        ]);
        table.add_row(vec![Cell::new("🧪 Test rows (joined)"), Cell::new(self.test_rows)]);
        table.add_row(vec![
            Cell::new("🔗 Test rows dropped by join"),
            Cell::new(self.test_dropped_by_join).fg(flag(self.test_dropped_by_join)),
        ]);
        table.add_row(vec![
            Cell::new("🩹 Values imputed (train / test)"),
            Cell::new(format!("{} / {}", self.values_imputed_train, self.values_imputed_test)),
        ]);
        table.add_row(vec![
            Cell::new("❓ Unseen test categories"),
            Cell::new(self.unseen_test_values).fg(flag(self.unseen_test_values)),
        ]);
        table.add_row(vec![Cell::new("🔢 Encoded features"), Cell::new(self.n_features)]);
        table.add_row(vec![
            Cell::new("✂️  Fit / validation rows"),
            Cell::new(format!("{} / {}", self.fit_rows, self.valid_rows)),
        ]);
        if let Some(model) = &self.selected_model {
            table.add_row(vec![
                Cell::new("🏆 Selected model"),
                Cell::new(model).fg(Color::Green).add_attribute(Attribute::Bold),
            ]);
        }
        if let Some(output) = &self.output {
            table.add_row(vec![Cell::new("💾 Predictions"), Cell::new(output.display())]);
        }
        indent(&table);

        if !self.step_times.is_empty() {
            section("⏱", "TIMINGS");
            let mut timings = Table::new();
            timings.load_preset(UTF8_FULL_CONDENSED);
            timings.set_header(vec![
                Cell::new("Step").add_attribute(Attribute::Bold),
                Cell::new("Time").add_attribute(Attribute::Bold),
            ]);
            for (name, elapsed) in &self.step_times {
                timings.add_row(vec![
                    Cell::new(name),
                    Cell::new(format_duration(*elapsed)).set_alignment(CellAlignment::Right),
                ]);
            }
            timings.add_row(vec![
                Cell::new("Total").add_attribute(Attribute::Bold),
                Cell::new(format_duration(self.total_time()))
                    .set_alignment(CellAlignment::Right)
                    .add_attribute(Attribute::Bold),
            ]);
            indent(&timings);
        }
    }
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// Held-out scores of every candidate, with the winner highlighted
pub fn display_model_comparison(scores: &[ModelScore], selected: Option<usize>) {
    section("📊", "MODEL COMPARISON");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Model").add_attribute(Attribute::Bold),
        Cell::new("Log-loss").add_attribute(Attribute::Bold),
        Cell::new("Accuracy").add_attribute(Attribute::Bold),
        Cell::new("Precision").add_attribute(Attribute::Bold),
        Cell::new("Recall").add_attribute(Attribute::Bold),
        Cell::new("Trees").add_attribute(Attribute::Bold),
        Cell::new("Fit time").add_attribute(Attribute::Bold),
    ]);

    for (i, s) in scores.iter().enumerate() {
        let winner = selected == Some(i);
        let name = if winner {
            Cell::new(format!("★ {}", s.kind))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(s.kind.to_string())
        };
        let trees = match s.best_round {
            Some(best) => format!("{} (best {})", s.rounds, best + 1),
            None => s.rounds.to_string(),
        };
        table.add_row(vec![
            name,
            Cell::new(format!("{:.5}", s.log_loss)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.5}", s.accuracy)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", s.precision)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", s.recall)).set_alignment(CellAlignment::Right),
            Cell::new(trees).set_alignment(CellAlignment::Right),
            Cell::new(format_duration(s.fit_time)).set_alignment(CellAlignment::Right),
        ]);
    }
    indent(&table);
}

/// Fill values learned from the training split and how many were used
pub fn display_imputation(policy: &ImputationPolicy, report: &ImputationReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Strategy").add_attribute(Attribute::Bold),
        Cell::new("Fill value").add_attribute(Attribute::Bold),
        Cell::new("Filled").add_attribute(Attribute::Bold),
    ]);

    for rule in &policy.rules {
        let (strategy, value) = match &rule.strategy {
            ImputeStrategy::Mode(v) => ("mode", v.clone()),
            ImputeStrategy::Median(v) => ("median", format!("{}", v)),
            ImputeStrategy::FromColumn(source) => ("from column", source.clone()),
        };
        let filled = report
            .filled
            .iter()
            .find(|(name, _)| name == &rule.column)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        table.add_row(vec![
            Cell::new(&rule.column),
            Cell::new(strategy),
            Cell::new(value),
            Cell::new(filled)
                .fg(flag(filled))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    indent(&table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_total_time() {
        let mut summary = RunSummary::default();
        summary.record_step("Load", Duration::from_millis(100));
        summary.record_step("Train", Duration::from_millis(400));
        assert_eq!(summary.total_time(), Duration::from_millis(500));
    }
}
