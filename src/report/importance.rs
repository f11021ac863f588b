//! Feature importance ranking

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    pub rank: usize,
    pub feature: String,
    pub score: f64,
}

/// Sort by descending score, keeping feature order for ties, and keep `top_k`
pub fn rank_feature_importances(names: &[String], scores: &[f64], top_k: usize) -> Vec<RankedFeature> {
    let mut order: Vec<usize> = (0..names.len().min(scores.len())).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    order
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, idx)| RankedFeature {
            rank: i + 1,
            feature: names[idx].clone(),
            score: scores[idx],
        })
        .collect()
}

pub fn display_importances(model_name: &str, ranked: &[RankedFeature]) {
    println!();
    println!(
        "    {} {}",
        style("🌲").cyan(),
        style(format!("TOP {} FEATURES ({})", ranked.len(), model_name)).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let total: f64 = ranked.iter().map(|r| r.score).sum();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Splits").add_attribute(Attribute::Bold),
        Cell::new("Share").add_attribute(Attribute::Bold),
    ]);

    for r in ranked {
        let share = if total > 0.0 { r.score / total * 100.0 } else { 0.0 };
        table.add_row(vec![
            Cell::new(r.rank),
            Cell::new(&r.feature).fg(if r.rank <= 3 { Color::Green } else { Color::White }),
            Cell::new(format!("{:.0}", r.score)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", share)).set_alignment(CellAlignment::Right),
        ]);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_descending_with_stable_ties() {
        let ranked = rank_feature_importances(&names(4), &[3.0, 7.0, 3.0, 1.0], 10);
        let order: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(order, vec!["f1", "f0", "f2", "f3"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
    }

    #[test]
    fn test_top_k_truncates() {
        let scores: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let ranked = rank_feature_importances(&names(30), &scores, 20);
        assert_eq!(ranked.len(), 20);
        assert_eq!(ranked[0].feature, "f29");
        assert_eq!(ranked[19].feature, "f10");
    }
}
