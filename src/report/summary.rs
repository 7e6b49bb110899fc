//! Terminal summaries of grouping and refinement results

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{FineTuneReport, GroupStatistics, Grouping, SamplingReport};

/// Print a titled section and an indented table.
fn print_table(icon: &str, title: &str, table: &Table) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn score_cell(score: f64) -> Cell {
    if score.is_finite() {
        Cell::new(format!("{:.4}", score)).set_alignment(CellAlignment::Right)
    } else {
        Cell::new("∞").fg(Color::Red).set_alignment(CellAlignment::Right)
    }
}

/// One row per group: size, then `mean ± sd` for each covariate.
pub fn statistics_table(grouping: &Grouping, stats: &GroupStatistics, covariates: &[String]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    let mut columns = vec!["Group", "N"];
    columns.extend(covariates.iter().map(String::as_str));
    table.set_header(header(&columns));

    for (label, members) in grouping.iter() {
        let mut row = vec![Cell::new(&label), Cell::new(members.len())];
        for covariate in covariates {
            let cell = match stats.get(&label, covariate) {
                Some(entry) => Cell::new(format!("{:.2} ± {:.2}", entry.mean, entry.variance.sqrt())),
                None => Cell::new("n/a").fg(Color::DarkGrey),
            };
            row.push(cell.set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }

    table
}

/// Display group statistics and the overall quality score.
pub fn display_statistics(grouping: &Grouping, stats: &GroupStatistics, covariates: &[String]) {
    let table = statistics_table(grouping, stats, covariates);
    print_table("📋", "GROUP STATISTICS", &table);
    println!();
    println!(
        "      Quality score: {}",
        style(format_score(stats.score())).yellow().bold()
    );
}

/// Extraction count, best score and improvement per sweep step.
pub fn trend_table(report: &FineTuneReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Extract", "Best score", "Improvement"]));

    for point in &report.trend {
        let improvement = Cell::new(format!("{:+.4}", point.improvement))
            .fg(if point.improvement > 0.0 { Color::Green } else { Color::White })
            .set_alignment(CellAlignment::Right);
        table.add_row(vec![
            Cell::new(point.extract_count),
            score_cell(point.best_score),
            improvement,
        ]);
    }

    table
}

/// Display a fine-tuning sweep and its outcome.
pub fn display_fine_tune(report: &FineTuneReport) {
    print_table("📈", "FINE-TUNE TREND", &trend_table(report));
    print_outcome(
        report.original_score,
        report.final_score,
        report.improvement,
        report.best_extract_count.map(|e| format!("extract count {}", e)),
    );
}

/// Sample size, best score and per-covariate aggregates per iteration.
pub fn sampling_table(report: &SamplingReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Sample size", "Best score", "Covariate means", "Covariate variances"]));

    for iteration in &report.iterations {
        let means = iteration
            .covariates
            .iter()
            .map(|c| format!("{}={:.2}", c.covariate, c.mean_of_means))
            .collect::<Vec<_>>()
            .join(", ");
        let variances = iteration
            .covariates
            .iter()
            .map(|c| format!("{}={:.2}", c.covariate, c.mean_of_variances))
            .collect::<Vec<_>>()
            .join(", ");

        let mut size = Cell::new(iteration.sample_size);
        if Some(iteration.sample_size) == report.best_sample_size {
            size = size.fg(Color::Green).add_attribute(Attribute::Bold);
        }
        table.add_row(vec![size, score_cell(iteration.best_score), Cell::new(means), Cell::new(variances)]);
    }

    table
}

/// Display a progressive sampling run and its outcome.
pub fn display_sampling(report: &SamplingReport) {
    print_table("🔬", "SAMPLING ITERATIONS", &sampling_table(report));
    let first = report
        .iterations
        .first()
        .map_or(f64::INFINITY, |it| it.best_score);
    print_outcome(
        first,
        report.min_variance,
        report.improvement,
        report.best_sample_size.map(|s| format!("sample size {}", s)),
    );
}

fn print_outcome(original: f64, best: f64, improvement: f64, winner: Option<String>) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Metric", "Value"]));
    table.add_row(vec![Cell::new("📁 Baseline score"), score_cell(original)]);
    table.add_row(vec![
        Cell::new("✅ Best score"),
        score_cell(best).fg(Color::Green).add_attribute(Attribute::Bold),
    ]);

    let color = if improvement > 0.0 { Color::Green } else { Color::Yellow };
    table.add_row(vec![
        Cell::new("📉 Improvement"),
        Cell::new(format!("{:.4}", improvement))
            .fg(color)
            .set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("🏆 Winner"),
        Cell::new(winner.unwrap_or_else(|| "no improvement".to_string())),
    ]);

    print_table("📋", "SUMMARY", &table);
}

/// Score formatted for display, `∞` for degenerate groupings.
pub fn format_score(score: f64) -> String {
    if score.is_finite() {
        format!("{:.4}", score)
    } else {
        "∞".to_string()
    }
}
