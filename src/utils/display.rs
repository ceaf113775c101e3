//! Terminal display utilities for record tables.
//!
//! Handles terminal width detection and unicode-aware truncation so that
//! tables stay readable on narrow screens.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use std::io::{self, IsTerminal};
use std::sync::OnceLock;
use terminal_size::terminal_size;

use crate::models::{BookField, BookRecord, FieldSlot};

/// Default width when terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

/// Terminal information with cached size and capabilities.
#[derive(Debug, Clone)]
pub struct Terminal {
    width: usize,
    is_tty: bool,
}

static TERMINAL_INFO: OnceLock<Terminal> = OnceLock::new();

/// Get the global terminal information, initialized on first call.
pub fn terminal_info() -> &'static Terminal {
    TERMINAL_INFO.get_or_init(|| Terminal {
        width: terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(DEFAULT_WIDTH),
        is_tty: io::stdout().is_terminal(),
    })
}

/// Get the current terminal width in characters.
#[inline]
pub fn terminal_width() -> usize {
    terminal_info().width
}

/// Check if stdout is a terminal.
#[inline]
pub fn is_terminal() -> bool {
    terminal_info().is_tty
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
///
/// # Examples
///
/// ```
/// use book_resolver::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width.saturating_sub(3) {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Render a field value for display, if it is filled
pub fn field_value(record: &BookRecord, field: BookField) -> Option<String> {
    if !record.has(field) {
        return None;
    }
    match record.slot(field) {
        FieldSlot::Text(value) => value.clone(),
        FieldSlot::Count(value) => value.map(|n| n.to_string()),
        FieldSlot::List(value) => value.as_ref().map(|items| items.join("; ")),
    }
}

/// Summary table: one row per record
pub fn records_table(records: &[BookRecord]) -> Table {
    let title_width = terminal_width().saturating_sub(70).clamp(24, 60);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Author").add_attribute(Attribute::Bold),
            Cell::new("Published").add_attribute(Attribute::Bold),
            Cell::new("ISBN").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
        ]);

    for (i, record) in records.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate_with_ellipsis(
                record.title.as_deref().unwrap_or("-"),
                title_width,
            )),
            Cell::new(truncate_with_ellipsis(record.author.as_deref().unwrap_or("-"), 30)),
            Cell::new(record.published_date.as_deref().unwrap_or("-")),
            Cell::new(record.isbn().unwrap_or("-")),
            Cell::new(record.source.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

/// Detail table: one row per filled field of a single record
pub fn record_table(record: &BookRecord) -> Table {
    let value_width = terminal_width().saturating_sub(30).max(40);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Field").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

    for &field in BookField::ALL {
        if let Some(value) = field_value(record, field) {
            table.add_row(vec![
                Cell::new(field.name()),
                Cell::new(truncate_with_ellipsis(&value, value_width * 4)),
            ]);
        }
    }
    if !record.data_sources.is_empty() {
        table.add_row(vec![
            Cell::new("data_sources"),
            Cell::new(record.data_sources.join(", ")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookRecordBuilder;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 0), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
    }

    #[test]
    fn test_field_value() {
        let record = BookRecordBuilder::new("loc")
            .title("Dune")
            .page_count(412)
            .subjects(["Science fiction", "Arrakis"])
            .build();

        assert_eq!(field_value(&record, BookField::Title).as_deref(), Some("Dune"));
        assert_eq!(field_value(&record, BookField::PageCount).as_deref(), Some("412"));
        assert_eq!(
            field_value(&record, BookField::Subjects).as_deref(),
            Some("Science fiction; Arrakis")
        );
        assert_eq!(field_value(&record, BookField::Publisher), None);
    }

    #[test]
    fn test_tables_render() {
        let record = BookRecordBuilder::new("loc")
            .title("Dune")
            .author("Frank Herbert")
            .isbn13("9780441013593")
            .build();

        let summary = records_table(std::slice::from_ref(&record)).to_string();
        assert!(summary.contains("Dune"));
        assert!(summary.contains("9780441013593"));

        let detail = record_table(&record).to_string();
        assert!(detail.contains("author"));
        assert!(detail.contains("Frank Herbert"));
        assert!(detail.contains("data_sources"));
    }
}
