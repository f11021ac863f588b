//! Tables printed by the `inspect` subcommand

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::OlsFit;

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

/// Columns with at least one missing value
pub fn display_missing_table(missing: &[(String, usize, f64)]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Missing").add_attribute(Attribute::Bold),
        Cell::new("Ratio").add_attribute(Attribute::Bold),
    ]);

    for (name, count, ratio) in missing.iter().filter(|m| m.1 > 0) {
        let color = if *ratio > 0.05 { Color::Red } else { Color::Yellow };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", ratio * 100.0))
                .fg(color)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);
}

/// Value counts of one categorical column, truncated to `max_rows`
pub fn display_category_counts(column: &str, counts: &[(String, usize)], max_rows: usize) {
    let total: usize = counts.iter().map(|c| c.1).sum();
    println!();
    println!(
        "    {} {}",
        style(column).white().bold(),
        style(format!("({} categories)", counts.len())).dim()
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    for (value, count) in counts.iter().take(max_rows) {
        let share = if total > 0 {
            *count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(value),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", share)).set_alignment(CellAlignment::Right),
        ]);
    }
    if counts.len() > max_rows {
        table.add_row(vec![
            Cell::new(format!("... {} more", counts.len() - max_rows)).fg(Color::DarkGrey),
            Cell::new(""),
            Cell::new(""),
        ]);
    }
    print_indented(&table);
}

pub fn display_regression(x: &str, y: &str, fit: &OlsFit) {
    println!(
        "      {} = {} × {} {} {}",
        style(y).cyan(),
        style(format!("{:.4}", fit.slope)).yellow().bold(),
        style(x).cyan(),
        if fit.intercept < 0.0 { "-" } else { "+" },
        style(format!("{:.4}", fit.intercept.abs())).yellow()
    );
    println!(
        "      R² = {}  over {} complete rows",
        style(format!("{:.4}", fit.r_squared)).yellow(),
        fit.n
    );
}
