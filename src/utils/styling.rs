//! Styled terminal output

use console::{style, Emoji};
use std::path::Path;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static LAYERS: Emoji<'_, '_> = Emoji("🧬 ", "");
pub static GROUPS: Emoji<'_, '_> = Emoji("🧪 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("▚▞ STRATIFY").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Layered randomization and variance rebalancing").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the run parameters as a boxed card
pub fn print_config(source: &str, layers: &[String], group_count: usize, seed: Option<u64>) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);
    let seed = seed.map_or_else(|| "entropy".to_string(), |s| s.to_string());

    println!("    ┌{}┐", line);
    println!("    │ {:<52} │", style("Configuration").cyan().bold());
    println!("    ├{}┤", line);
    println!("    │  {}Source: {:<42}│", FOLDER, truncate_string(source, 41));
    println!("    │  {}Layers: {:<42}│", LAYERS, truncate_string(&layers.join(", "), 41));
    println!("    │  {}Groups: {:<42}│", GROUPS, group_count);
    println!("    │  {}Seed:   {:<42}│", DICE, truncate_string(&seed, 41));
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
    println!("    {}{}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {}{}", WARN, style(message).yellow());
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {}{}", ROCKET, style(message).green().bold());
    println!();
}

/// Shorten a path for display in the configuration card
pub fn display_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

/// Keep the tail of `s` when it is longer than `max_len` characters.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(count + 3 - max_len).collect();
        format!("...{}", tail)
    }
}
