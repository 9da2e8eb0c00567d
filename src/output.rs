//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! the progress bar, per-file lines and the final summary table.

use crate::file_organizer::Outcome;
use crate::summary::RunReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for the file walk
/// - Per-file outcome lines and the summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::success("Organization complete!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` files.
    ///
    /// The bar draws to stderr and stays hidden when stderr is not a terminal.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let template = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Formats one outcome as a single line, with paths relative to `dest_root`.
    pub fn outcome_line(outcome: &Outcome, dest_root: &Path) -> String {
        let source = outcome.source().display();
        match outcome {
            Outcome::Moved(p) | Outcome::Copied(p) => format!(
                "{} {} {} → {}",
                "✓".green(),
                outcome.label().to_uppercase().green(),
                source,
                relative_to(&p.destination, dest_root)
            ),
            Outcome::WouldMove(p) | Outcome::WouldCopy(p) => format!(
                "{} {} → {}",
                format!("[DRY RUN] {}", outcome.label().to_uppercase()).yellow(),
                source,
                relative_to(&p.destination, dest_root)
            ),
            Outcome::SkippedDuplicate {
                hash, duplicate_of, ..
            } => format!(
                "{} {} {} (sha1 {}…, same as {})",
                "⚠".yellow(),
                "SKIP".yellow(),
                source,
                &hash[..hash.len().min(8)],
                duplicate_of.display()
            ),
            Outcome::SkippedError { reason, .. } => {
                format!("{} {} {}", "✗".red(), "ERROR".red(), reason)
            }
        }
    }

    /// Prints the per-category table followed by the outcome counts.
    pub fn summary_table(report: &RunReport) {
        Self::header("SUMMARY");

        let counts = report.category_counts();
        let max_category_len = counts
            .keys()
            .map(|category| category.dir_name().len())
            .max()
            .unwrap_or(0)
            .max(8);

        if !counts.is_empty() {
            println!(
                "{:<width$} | {}",
                "Category".bold(),
                "Files".bold(),
                width = max_category_len
            );
            println!("{}", "-".repeat(max_category_len + 10));
            for (category, count) in &counts {
                println!(
                    "{:<width$} | {} {}",
                    category.dir_name(),
                    count.to_string().green(),
                    plural(*count),
                    width = max_category_len
                );
            }
            println!("{}", "-".repeat(max_category_len + 10));
        }

        let summary = &report.summary;
        let mut rows = if report.options.dry_run {
            vec![
                ("Would move", summary.would_move),
                ("Would copy", summary.would_copy),
            ]
        } else {
            vec![("Moved", summary.moved), ("Copied", summary.copied)]
        };
        rows.push(("Skipped (duplicate)", summary.skipped_duplicate));
        rows.push(("Skipped (error)", summary.skipped_error));

        for (label, count) in rows {
            let value = if label == "Skipped (error)" && count > 0 {
                count.to_string().red().bold()
            } else {
                count.to_string().green()
            };
            println!("{:<20} {}", label, value);
        }
        println!(
            "{:<20} {}",
            "Total size".bold(),
            format_bytes(summary.total_bytes).bold()
        );
    }
}

/// Human-readable byte count using binary units.
///
/// # Example
///
/// ```
/// use dirsort::output::format_bytes;
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1536), "1.5 KiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn relative_to(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
