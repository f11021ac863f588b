//! Spinners and bars shown while splits load and models fit

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("    {spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap()
        .tick_chars(TICKS)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("    {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg:.dim} ({elapsed})")
        .unwrap()
        .progress_chars("█▓▒░")
}

/// Spinner for a stage of unknown length, such as reading and joining a split
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar over a known number of candidates or search trials. `prefix` names
/// the work; the trailing message is updated by [`advance`].
pub fn create_progress_bar(len: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(bar_style());
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}

/// Step the bar and show what just finished
pub fn advance(pb: &ProgressBar, detail: String) {
    pb.set_message(detail);
    pb.inc(1);
}

pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

pub fn finish_with_warning(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("⚠️  {}", message));
}
