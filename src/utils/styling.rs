//! Terminal styling for the pipeline's step-by-step output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::report::format_duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static TRAIN: Emoji<'_, '_> = Emoji("🚄 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");
pub static SCALE: Emoji<'_, '_> = Emoji("⚖️  ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ___  _  _  ___  _  _  _  __  ___  _  _  ___  ___  _  _
    / __|| || ||_ _|| \| || |/ / / _ \| \| |/ __|| __|| \| |
    \__ \| __ | | | | .` || ' < | (_) | .` |\__ \| _| | .` |
    |___/|_||_||___||_|\_||_|\_\ \__,_|_|\_||___/|___||_|\_|
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        TRAIN,
        style("Passenger satisfaction, one pass from CSV to predictions").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(58)).dim());
    println!();
}

/// Values shown in the configuration card
pub struct ConfigCard<'a> {
    pub data_dir: &'a Path,
    pub output: &'a Path,
    pub seed: u64,
    pub seed_generated: bool,
    pub valid_fraction: f64,
    pub models: &'a [String],
    pub selection: &'a str,
    pub tune: bool,
}

/// Print configuration card
pub fn print_config(card: &ConfigCard<'_>) {
    let box_width = 60;
    let line = "─".repeat(box_width - 2);
    let seed = if card.seed_generated {
        format!("{} (random)", card.seed)
    } else {
        card.seed.to_string()
    };

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Data:       {:<39}│", FOLDER, truncate_path(card.data_dir, 38));
    println!("    │  {} Output:     {:<39}│", SAVE, truncate_path(card.output, 38));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Seed:       {:<39}│",
        DICE,
        style(truncate_string(&seed, 38)).yellow()
    );
    println!(
        "    │  {} Validation: {:<39}│",
        SCALE,
        style(format!("{:.0}%", card.valid_fraction * 100.0)).yellow()
    );
    println!(
        "    │  {} Models:     {:<39}│",
        TREE,
        truncate_string(&card.models.join(", "), 38)
    );
    println!(
        "    │  {} Select by:  {:<39}│",
        TREE,
        truncate_string(
            &format!("{}{}", card.selection, if card.tune { " (tuned)" } else { "" }),
            38
        )
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning; used for rows dropped by joins and unseen categories
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!("    {}", style(format!("⏱  {}", format_duration(elapsed))).dim());
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", TRAIN, style(message).green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(info) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
