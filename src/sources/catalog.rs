//! Parsing helpers for library-catalog payloads.
//!
//! Catalog records (Library of Congress, HathiTrust) carry cataloguing
//! punctuation: `Title : subtitle / statement of responsibility.` titles,
//! `Place : Publisher, Year.` imprints and `xxii, 443 pages : ill.` extents.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// A field that arrives either as a bare string or as a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub(crate) fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }

    pub(crate) fn first(&self) -> Option<&str> {
        match self {
            OneOrMany::One(s) => Some(s.as_str()),
            OneOrMany::Many(v) => v.first().map(String::as_str),
        }
    }
}

/// Split a catalog title into `(title, subtitle)`.
///
/// The statement of responsibility after ` / ` is dropped along with the
/// trailing full stop.
pub(crate) fn split_title(raw: &str) -> (String, Option<String>) {
    let main = raw.split(" / ").next().unwrap_or(raw);
    let main = main.trim().trim_end_matches(['.', ',', ';', '/']).trim();

    match main.split_once(" : ") {
        Some((title, subtitle)) => {
            let subtitle = subtitle.trim();
            (
                title.trim().to_string(),
                (!subtitle.is_empty()).then(|| subtitle.to_string()),
            )
        }
        None => (main.to_string(), None),
    }
}

/// Split an imprint `Place : Publisher, Year.` into `(place, publisher)`
pub(crate) fn parse_imprint(raw: &str) -> (Option<String>, Option<String>) {
    let (place, rest) = match raw.split_once(" : ") {
        Some((place, rest)) => (Some(place), rest),
        None => (None, raw),
    };
    let publisher = rest
        .split(',')
        .next()
        .map(|p| p.trim().trim_end_matches('.').trim())
        .filter(|p| !p.is_empty() && !p.chars().all(|c| c.is_ascii_digit()));

    (
        place
            .map(|p| p.trim().trim_start_matches('[').trim_end_matches(']').to_string())
            .filter(|p| !p.is_empty()),
        publisher.map(str::to_string),
    )
}

/// Extract the page count from a physical extent statement
pub(crate) fn pages_from_extent(extent: &str) -> Option<u32> {
    static PAGES: OnceLock<Option<Regex>> = OnceLock::new();
    let re = PAGES
        .get_or_init(|| Regex::new(r"(?i)(\d+)\s*(?:pages|p\.)").ok())
        .as_ref()?;

    re.captures(extent)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_title() {
        assert_eq!(
            split_title("Sapiens : a brief history of humankind / Yuval Noah Harari."),
            (
                "Sapiens".to_string(),
                Some("a brief history of humankind".to_string())
            )
        );
        assert_eq!(split_title("Dune."), ("Dune".to_string(), None));
        assert_eq!(split_title("Dune / Frank Herbert"), ("Dune".to_string(), None));
    }

    #[test]
    fn test_parse_imprint() {
        assert_eq!(
            parse_imprint("New York : Harper, [2015]"),
            (Some("New York".to_string()), Some("Harper".to_string()))
        );
        assert_eq!(
            parse_imprint("[London] : Vintage, 2014."),
            (Some("London".to_string()), Some("Vintage".to_string()))
        );
        assert_eq!(parse_imprint("2015"), (None, None));
    }

    #[test]
    fn test_pages_from_extent() {
        assert_eq!(pages_from_extent("xxii, 443 pages : illustrations"), Some(443));
        assert_eq!(pages_from_extent("412 p. ; 24 cm"), Some(412));
        assert_eq!(pages_from_extent("1 online resource"), None);
    }

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany = serde_json::from_str(r#""a""#).unwrap();
        assert_eq!(one.first(), Some("a"));
        let many: OneOrMany = serde_json::from_str(r#"["b", "c"]"#).unwrap();
        assert_eq!(many.into_vec(), vec!["b", "c"]);
    }
}
