//! Field-level merging of partial book records.
//!
//! [`merge`] walks the declared field list ([`BookField::ALL`]) and combines a
//! primary record with a secondary one:
//!
//! - a missing primary value is filled from the secondary;
//! - list values are unioned, replacing the primary list only if the union
//!   actually grew;
//! - counts keep the larger value;
//! - any other conflict keeps the primary value.
//!
//! The result depends on argument order and never on which provider answered
//! first.

use std::collections::HashSet;

use crate::models::{BookField, BookRecord, FieldPair};

/// Fields that must all be filled before a cascade may stop early
pub const IMPORTANT_FIELDS: &[BookField] = &[
    BookField::Title,
    BookField::Author,
    BookField::CoverUrl,
    BookField::Description,
    BookField::Publisher,
    BookField::PublishedDate,
    BookField::PageCount,
    BookField::Language,
    BookField::CallNumber,
    BookField::Subjects,
    BookField::Classifications,
    BookField::Subtitle,
    BookField::Format,
];

/// Combine `primary` with `secondary`, primary taking precedence
pub fn merge(primary: &BookRecord, secondary: &BookRecord) -> BookRecord {
    let mut merged = primary.clone();

    for &field in BookField::ALL {
        match BookRecord::pair(&mut merged, secondary, field) {
            FieldPair::Text(dst, src) => merge_text(dst, src),
            FieldPair::Count(dst, src) => merge_count(dst, *src),
            FieldPair::List(dst, src) => merge_list(dst, src),
        }
    }

    for source in &secondary.data_sources {
        merged.add_data_source(source);
    }
    if merged.source.is_none() {
        merged.source = secondary.source.clone();
    }

    merged
}

/// Fill only the three gap fields the fast lookup takes from its second
/// provider: description, subjects and page count.
pub fn fill_gaps(primary: &BookRecord, secondary: &BookRecord) -> BookRecord {
    let mut merged = primary.clone();
    let mut contributed = false;

    if !merged.has(BookField::Description) && secondary.has(BookField::Description) {
        merged.description = secondary.description.clone();
        contributed = true;
    }
    if !merged.has(BookField::Subjects) && secondary.has(BookField::Subjects) {
        merged.subjects = secondary.subjects.clone();
        contributed = true;
    }
    if !merged.has(BookField::PageCount) && secondary.has(BookField::PageCount) {
        merged.page_count = secondary.page_count;
        contributed = true;
    }

    if contributed {
        for source in &secondary.data_sources {
            merged.add_data_source(source);
        }
    }
    merged
}

/// Checklist fields still empty in `record`
pub fn missing_important_fields(record: &BookRecord) -> Vec<BookField> {
    IMPORTANT_FIELDS
        .iter()
        .copied()
        .filter(|f| !record.has(*f))
        .collect()
}

/// Whether every checklist field is filled.
///
/// An empty list counts as missing, same as an empty string.
pub fn has_all_important_fields(record: &BookRecord) -> bool {
    IMPORTANT_FIELDS.iter().all(|f| record.has(*f))
}

fn merge_text(dst: &mut Option<String>, src: &Option<String>) {
    let dst_empty = dst.as_deref().map_or(true, |s| s.trim().is_empty());
    let src_filled = src.as_deref().is_some_and(|s| !s.trim().is_empty());
    if dst_empty && src_filled {
        *dst = src.clone();
    }
}

fn merge_count(dst: &mut Option<u32>, src: Option<u32>) {
    *dst = match (*dst, src) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (None, b) => b,
        (a, None) => a,
    };
}

fn merge_list(dst: &mut Option<Vec<String>>, src: &Option<Vec<String>>) {
    let Some(incoming) = src.as_ref().filter(|l| !l.is_empty()) else {
        return;
    };

    let current = match dst.as_ref().filter(|l| !l.is_empty()) {
        Some(current) => current,
        None => {
            *dst = Some(incoming.clone());
            return;
        }
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let union: Vec<String> = current
        .iter()
        .chain(incoming.iter())
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect();

    if union.len() > current.len() {
        *dst = Some(union);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookRecordBuilder;

    fn sorted(list: &Option<Vec<String>>) -> Vec<String> {
        let mut v = list.clone().unwrap_or_default();
        v.sort();
        v
    }

    #[test]
    fn test_primary_title_wins() {
        let a = BookRecordBuilder::new("a").title("Sapiens").build();
        let b = BookRecordBuilder::new("b").title("Sapiens: A Brief History").build();

        assert_eq!(merge(&a, &b).title.as_deref(), Some("Sapiens"));
    }

    #[test]
    fn test_secondary_fills_absent_title() {
        let a = BookRecordBuilder::new("a").author("Harari").build();
        let b = BookRecordBuilder::new("b").title("Sapiens").build();

        let merged = merge(&a, &b);
        assert_eq!(merged.title.as_deref(), Some("Sapiens"));
        assert_eq!(merged.author.as_deref(), Some("Harari"));
    }

    #[test]
    fn test_secondary_fills_blank_text() {
        let mut a = BookRecord::from_source("a");
        a.publisher = Some("   ".to_string());
        let b = BookRecordBuilder::new("b").publisher("Harper").build();

        assert_eq!(merge(&a, &b).publisher.as_deref(), Some("Harper"));
    }

    #[test]
    fn test_blank_secondary_never_overwrites() {
        let a = BookRecord::from_source("a");
        let mut b = BookRecord::from_source("b");
        b.description = Some(String::new());

        assert_eq!(merge(&a, &b).description, None);
    }

    #[test]
    fn test_lists_union() {
        let a = BookRecordBuilder::new("a")
            .subjects(["History", "Anthropology"])
            .build();
        let b = BookRecordBuilder::new("b")
            .subjects(["History", "Evolution"])
            .build();

        let merged = merge(&a, &b);
        assert_eq!(
            sorted(&merged.subjects),
            vec!["Anthropology", "Evolution", "History"]
        );
    }

    #[test]
    fn test_list_not_replaced_when_union_does_not_grow() {
        let a = BookRecordBuilder::new("a")
            .subjects(["History", "Anthropology"])
            .build();
        let b = BookRecordBuilder::new("b").subjects(["History"]).build();

        let merged = merge(&a, &b);
        assert_eq!(merged.subjects, a.subjects);
    }

    #[test]
    fn test_empty_primary_list_is_filled() {
        let a = BookRecordBuilder::new("a")
            .subjects(Vec::<String>::new())
            .build();
        let b = BookRecordBuilder::new("b").subjects(["Fiction"]).build();

        assert_eq!(sorted(&merge(&a, &b).subjects), vec!["Fiction"]);
    }

    #[test]
    fn test_counts_take_maximum() {
        let a = BookRecordBuilder::new("a").page_count(320).build();
        let b = BookRecordBuilder::new("b").page_count(443).build();
        assert_eq!(merge(&a, &b).page_count, Some(443));
        assert_eq!(merge(&b, &a).page_count, Some(443));

        let c = BookRecord::from_source("c");
        assert_eq!(merge(&c, &a).page_count, Some(320));
        assert_eq!(merge(&a, &c).page_count, Some(320));
    }

    #[test]
    fn test_merge_is_order_dependent_for_scalars() {
        let a = BookRecordBuilder::new("a").publisher("Harper").build();
        let b = BookRecordBuilder::new("b").publisher("Vintage").build();

        assert_eq!(merge(&a, &b).publisher.as_deref(), Some("Harper"));
        assert_eq!(merge(&b, &a).publisher.as_deref(), Some("Vintage"));
    }

    #[test]
    fn test_data_sources_are_unioned() {
        let a = BookRecordBuilder::new("openlibrary").title("X").build();
        let b = BookRecordBuilder::new("google_books").title("Y").build();

        let merged = merge(&a, &b);
        assert_eq!(merged.data_sources, vec!["openlibrary", "google_books"]);
        assert_eq!(merged.source.as_deref(), Some("openlibrary"));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let a = BookRecordBuilder::new("a")
            .title("Dune")
            .page_count(412)
            .subjects(["SF"])
            .build();
        assert_eq!(merge(&a, &BookRecord::new()), a);
    }

    #[test]
    fn test_fill_gaps_only_touches_three_fields() {
        let first = BookRecordBuilder::new("openlibrary")
            .title("Sapiens")
            .author("Yuval Noah Harari")
            .build();
        let second = BookRecordBuilder::new("google_books")
            .title("Other title")
            .publisher("Harper")
            .description("A history of humankind")
            .subjects(["History"])
            .page_count(443)
            .build();

        let merged = fill_gaps(&first, &second);
        assert_eq!(merged.title.as_deref(), Some("Sapiens"));
        assert_eq!(merged.publisher, None);
        assert_eq!(merged.description.as_deref(), Some("A history of humankind"));
        assert_eq!(merged.subjects, Some(vec!["History".to_string()]));
        assert_eq!(merged.page_count, Some(443));
        assert_eq!(merged.data_sources, vec!["openlibrary", "google_books"]);
    }

    #[test]
    fn test_fill_gaps_keeps_first_values() {
        let first = BookRecordBuilder::new("a")
            .description("first")
            .page_count(100)
            .build();
        let second = BookRecordBuilder::new("b")
            .description("second")
            .page_count(900)
            .build();

        let merged = fill_gaps(&first, &second);
        assert_eq!(merged.description.as_deref(), Some("first"));
        assert_eq!(merged.page_count, Some(100));
        assert_eq!(merged.data_sources, vec!["a"]);
    }

    #[test]
    fn test_important_fields_checklist() {
        let mut record = BookRecordBuilder::new("a")
            .title("T")
            .subtitle("S")
            .author("A")
            .cover_url("http://c")
            .description("D")
            .publisher("P")
            .published_date("2015")
            .page_count(10)
            .language("en")
            .call_number("D20 .H37 2015")
            .subjects(["History"])
            .classifications(["909"])
            .format("Hardcover")
            .build();

        assert!(has_all_important_fields(&record));
        assert!(missing_important_fields(&record).is_empty());

        record.subjects = Some(Vec::new());
        assert!(!has_all_important_fields(&record));
        assert_eq!(missing_important_fields(&record), vec![BookField::Subjects]);
    }
}
