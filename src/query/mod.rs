//! Query classification: identifier detection and free-text hint parsing.
//!
//! A query is either a bare ISBN (hyphens and spaces allowed) or free text.
//! Free text may carry inline field hints such as `pub:"Penguin Press"` or
//! `year:2015`, and an author separated from the title by ` by `.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ParsedQuery, SearchHints};

/// What a query turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// A normalized 10- or 13-digit identifier
    Identifier(String),
    /// Free text, parsed into title, author and hints
    FreeText(ParsedQuery),
}

/// Classify a raw query
pub fn classify(query: &str) -> QueryKind {
    match detect_identifier(query) {
        Some(isbn) => QueryKind::Identifier(isbn),
        None => QueryKind::FreeText(parse_query(query)),
    }
}

/// Return the normalized identifier if `query` is one.
///
/// Hyphens and whitespace are stripped; the rest must be exactly 10 or
/// exactly 13 ASCII digits.
pub fn detect_identifier(query: &str) -> Option<String> {
    let stripped: String = query
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();

    let digits_only = stripped.bytes().all(|b| b.is_ascii_digit());
    if digits_only && (stripped.len() == 10 || stripped.len() == 13) {
        Some(stripped)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy)]
enum HintKey {
    Publisher,
    Subject,
    Place,
    Year,
    Language,
}

fn hint_patterns() -> &'static [(HintKey, Regex)] {
    static PATTERNS: OnceLock<Vec<(HintKey, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (HintKey::Publisher, "publisher|pub"),
            (HintKey::Subject, "subject|subj|category|cat"),
            (HintKey::Place, "place|city"),
            (HintKey::Year, "year|yr"),
            (HintKey::Language, "language|lang"),
        ]
        .into_iter()
        .filter_map(|(key, names)| {
            let pattern = format!(r#"(?i)\b(?:{}):\s*(?:"([^"]*)"|(\S+))"#, names);
            Regex::new(&pattern).ok().map(|re| (key, re))
        })
        .collect()
    })
}

/// Split on the first case-insensitive `" by "`
fn split_author(text: &str) -> (&str, Option<&str>) {
    match text.to_ascii_lowercase().find(" by ") {
        Some(at) => (&text[..at], Some(&text[at + 4..])),
        None => (text, None),
    }
}

/// Pull the five recognized `key: value` hints out of `text`.
///
/// Returns the hints and the remaining text. Only the first occurrence of a
/// key is recorded, but every occurrence is removed, so running this again
/// on the remainder finds nothing and changes nothing.
pub fn extract_fields(text: &str) -> (SearchHints, String) {
    let mut hints = SearchHints::default();
    let mut remainder = collapse_whitespace(text);

    for (key, pattern) in hint_patterns() {
        let value = pattern
            .captures(&remainder)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty());

        if pattern.is_match(&remainder) {
            remainder = collapse_whitespace(&pattern.replace_all(&remainder, " "));
        }

        let slot = match key {
            HintKey::Publisher => &mut hints.publisher,
            HintKey::Subject => &mut hints.subject,
            HintKey::Place => &mut hints.place,
            HintKey::Year => &mut hints.year,
            HintKey::Language => &mut hints.language,
        };
        *slot = value;
    }

    (hints, remainder)
}

/// Parse free text into title, author and field hints.
///
/// `"Sapiens by Yuval Noah Harari"` yields title `Sapiens` and author
/// `Yuval Noah Harari`; `pub:"Penguin Press" Sapiens` yields publisher
/// `Penguin Press` and title `Sapiens`.
pub fn parse_query(query: &str) -> ParsedQuery {
    let (hints, remainder) = extract_fields(query);

    let (title, author) = split_author(&remainder);
    let title = title.trim().to_string();
    let author = author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    ParsedQuery {
        title,
        author,
        publisher: hints.publisher,
        subject: hints.subject,
        place: hints.place,
        year: hints.year,
        language: hints.language,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_identifier_13() {
        assert_eq!(
            detect_identifier("9780143127741"),
            Some("9780143127741".to_string())
        );
        assert_eq!(
            detect_identifier("978-0-14-312774-1"),
            Some("9780143127741".to_string())
        );
        assert_eq!(
            detect_identifier(" 978 0143 127741 "),
            Some("9780143127741".to_string())
        );
    }

    #[test]
    fn test_detect_identifier_10() {
        assert_eq!(
            detect_identifier("0-14-312774-8"),
            Some("0143127748".to_string())
        );
    }

    #[test]
    fn test_detect_identifier_rejects() {
        assert_eq!(detect_identifier(""), None);
        assert_eq!(detect_identifier("Sapiens"), None);
        assert_eq!(detect_identifier("978014312774"), None); // 12 digits
        assert_eq!(detect_identifier("97801431277411"), None); // 14 digits
        assert_eq!(detect_identifier("014312774X"), None);
        assert_eq!(detect_identifier("12345678901"), None);
        assert_eq!(detect_identifier("９７８０１４３１２７７４１"), None);
    }

    #[test]
    fn test_detect_identifier_property() {
        let inputs = [
            "1234567890",
            "123-456-7890",
            "12345 67890123",
            "123456789",
            "abc1234567890",
            "1234567890123",
            "--1234567890--",
            "12.34567890",
        ];
        for input in inputs {
            let stripped: String = input
                .chars()
                .filter(|c| *c != '-' && !c.is_whitespace())
                .collect();
            let expected = stripped.chars().all(|c| c.is_ascii_digit())
                && (stripped.len() == 10 || stripped.len() == 13);
            assert_eq!(detect_identifier(input).is_some(), expected, "{}", input);
        }
    }

    #[test]
    fn test_parse_title_by_author() {
        let parsed = parse_query("Sapiens by Yuval Noah Harari");
        assert_eq!(parsed.title, "Sapiens");
        assert_eq!(parsed.author.as_deref(), Some("Yuval Noah Harari"));
        assert!(parsed.hints().is_empty());
    }

    #[test]
    fn test_parse_by_is_case_insensitive() {
        let parsed = parse_query("Dune BY Frank Herbert");
        assert_eq!(parsed.title, "Dune");
        assert_eq!(parsed.author.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn test_parse_title_only() {
        let parsed = parse_query("The Name of the Rose");
        assert_eq!(parsed.title, "The Name of the Rose");
        assert_eq!(parsed.author, None);
    }

    #[test]
    fn test_parse_quoted_publisher() {
        let parsed = parse_query(r#"pub:"Penguin Press" Sapiens"#);
        assert_eq!(parsed.publisher.as_deref(), Some("Penguin Press"));
        assert_eq!(parsed.title, "Sapiens");
        assert_eq!(parsed.author, None);
    }

    #[test]
    fn test_parse_all_keys_and_aliases() {
        let parsed = parse_query(
            r#"Walden by Thoreau publisher:Ticknor cat:nature city:"Boston" yr:1854 lang:en"#,
        );
        assert_eq!(parsed.title, "Walden");
        assert_eq!(parsed.author.as_deref(), Some("Thoreau"));
        assert_eq!(parsed.publisher.as_deref(), Some("Ticknor"));
        assert_eq!(parsed.subject.as_deref(), Some("nature"));
        assert_eq!(parsed.place.as_deref(), Some("Boston"));
        assert_eq!(parsed.year.as_deref(), Some("1854"));
        assert_eq!(parsed.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_parse_keys_case_insensitive() {
        let parsed = parse_query("PUB:Vintage SUBJECT:history Guns");
        assert_eq!(parsed.publisher.as_deref(), Some("Vintage"));
        assert_eq!(parsed.subject.as_deref(), Some("history"));
        assert_eq!(parsed.title, "Guns");
    }

    #[test]
    fn test_parse_first_match_wins() {
        let parsed = parse_query("year:1999 Matrix year:2003");
        assert_eq!(parsed.year.as_deref(), Some("1999"));
        assert_eq!(parsed.title, "Matrix");
    }

    #[test]
    fn test_key_inside_word_is_not_a_hint() {
        let parsed = parse_query("epub:guide");
        assert_eq!(parsed.publisher, None);
        assert_eq!(parsed.title, "epub:guide");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let queries = [
            r#"pub:"Penguin Press" Sapiens"#,
            "Sapiens by Yuval Noah Harari",
            "year:1999 Matrix year:2003 lang:en lang:fr",
            r#"subj:"world history" by someone place:Paris"#,
            r#"pub:"" empty quotes"#,
            "lang:pub:x leftovers",
            "   spaced    out   text  ",
        ];
        for query in queries {
            let (_, remainder) = extract_fields(query);
            let (hints, again) = extract_fields(&remainder);
            assert!(hints.is_empty(), "hints found on rerun of {:?}", query);
            assert_eq!(again, remainder, "remainder changed for {:?}", query);
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("978-0143127741"),
            QueryKind::Identifier("9780143127741".to_string())
        );
        match classify("Sapiens by Harari") {
            QueryKind::FreeText(parsed) => assert_eq!(parsed.title, "Sapiens"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
