//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::OwoColorize;
use snapimg_batch::ItemFailure;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// One line per failed item: `name: reason`
pub fn failure_line(failure: &ItemFailure) -> String {
    format!("{}: {}", failure.name, failure.error)
}

/// Print the failure summary of a run
pub fn print_failures(failures: &[ItemFailure]) {
    if failures.is_empty() {
        return;
    }
    Status::warning(&format!(
        "{} could not be processed:",
        format_count(failures.len(), "file", "files")
    ));
    for failure in failures {
        eprintln!("  {} {}", "-".dimmed(), failure_line(failure));
    }
}

/// Relative size change, e.g. `-42.0%`
pub fn format_ratio(before: u64, after: u64) -> String {
    if before == 0 {
        return "n/a".to_string();
    }
    let change = (after as f64 - before as f64) / before as f64 * 100.0;
    format!("{:+.1}%", change)
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
