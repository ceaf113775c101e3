//! CLI UI utilities for terminal output.
//!
//! Colored status lines, provider icons, record cards and an `indicatif`
//! spinner that doubles as a [`ProgressSink`].

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::models::BookRecord;
use crate::utils::{truncate_with_ellipsis, ProgressSink};

/// Icons for the built-in providers.
pub fn provider_icon(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openlibrary" | "open library" => "📖",
        "google_books" | "google books" => "🔎",
        "isbndb" => "🗃",
        "loc" | "library of congress" => "🏛",
        "hathitrust" => "🐘",
        "combined" => "🔗",
        _ => "📚",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Render a status line with a colored icon.
pub fn status_line(status: Status, msg: &str) -> String {
    let icon = status_icon(status);
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Warning => format!("{} {}", icon.yellow().bold(), msg),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
        Status::Search => format!("{} {}", icon.yellow(), msg),
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    eprintln!("{}", status_line(status, msg));
}

/// Print search results header.
pub fn print_search_header(query: &str, count: usize, duration: Duration) {
    println!();
    println!(
        "{} Results for: \"{}\"",
        status_icon(Status::Search).yellow().bold(),
        query.cyan().bold()
    );
    println!(
        "{} Found {} books in {:.2}s",
        "─".repeat(30).dimmed(),
        count.to_string().green().bold(),
        duration.as_secs_f64()
    );
    println!();
}

/// Print a one-record summary card.
pub fn print_record_card(record: &BookRecord) {
    let source = record.source.as_deref().unwrap_or("unknown");
    let title = record.title.as_deref().unwrap_or("(untitled)");

    println!(
        "{} {}",
        provider_icon(source),
        truncate_with_ellipsis(title, 70).blue().bold()
    );
    if let Some(subtitle) = &record.subtitle {
        println!("   {}", truncate_with_ellipsis(subtitle, 70).dimmed());
    }
    if let Some(author) = &record.author {
        println!("   by {}", author.green());
    }
    let isbn = record.isbn().unwrap_or("-");
    let year = record.published_date.as_deref().unwrap_or("????");
    println!(
        "   ISBN {}  {}  via {}",
        isbn.yellow(),
        year,
        record.data_sources.join(", ").dimmed()
    );
}

/// Spinner showing resolution progress.
///
/// Hidden when stderr is not a terminal.
pub struct ProgressSpinner {
    pb: ProgressBar,
}

impl ProgressSpinner {
    /// Create a spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
        pb.set_style(style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    /// Remove the spinner from the terminal.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

impl ProgressSink for ProgressSpinner {
    fn report(&self, current: usize, total: usize, status: &str) {
        self.pb.set_length(total as u64);
        self.pb.set_position(current as u64);
        self.pb.set_message(status.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_icon() {
        assert_eq!(provider_icon("openlibrary"), "📖");
        assert_eq!(provider_icon("Library of Congress"), "🏛");
        assert_eq!(provider_icon("Combined"), "🔗");
        assert_eq!(provider_icon("unknown"), "📚");
    }

    #[test]
    fn test_status_line_contains_message() {
        let line = status_line(Status::Success, "found");
        assert!(line.contains("found"));
        assert!(line.contains(status_icon(Status::Success)));
    }

    #[test]
    fn test_hidden_spinner_accepts_progress() {
        let spinner = ProgressSpinner::hidden();
        spinner.report(2, 4, "enriching");
        spinner.clear();
    }
}
