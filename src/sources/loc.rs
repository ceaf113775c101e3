//! Library of Congress provider implementation.
//!
//! Queries the loc.gov JSON search (`/search/?q=<isbn>&fo=json`) and reads
//! the first book result. Strong on call numbers, LCCNs and subject headings.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{non_empty, non_empty_list, BookRecord};
use crate::sources::catalog::{pages_from_extent, parse_imprint, split_title, OneOrMany};
use crate::sources::{IsbnLookup, Provider, ProviderError};
use crate::utils::HttpClient;

const LOC_API_BASE: &str = "https://www.loc.gov";

/// Library of Congress provider
#[derive(Debug, Clone)]
pub struct LibraryOfCongressProvider {
    http: HttpClient,
    base_url: String,
}

impl LibraryOfCongressProvider {
    pub const ID: &'static str = "loc";

    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, LOC_API_BASE)
    }

    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn is_book(result: &LocResult) -> bool {
        let formats = result.original_format.iter().chain(result.item.format.iter());
        let mut formats = formats.peekable();
        formats.peek().is_none() || formats.any(|f| f.to_lowercase().contains("book"))
    }

    fn parse_result(isbn: &str, result: LocResult) -> BookRecord {
        let mut record = BookRecord::from_source(Self::ID);
        let item = result.item;

        if let Some(raw) = non_empty(item.title.or(result.title)) {
            let (title, subtitle) = split_title(&raw);
            record.title = non_empty(Some(title));
            record.subtitle = subtitle;
        }

        let mut contributors = result.contributor.into_iter();
        record.author = non_empty(contributors.next());
        record.contributors = non_empty_list(contributors);

        if let Some(imprint) = item.created_published.first() {
            let (place, publisher) = parse_imprint(imprint);
            record.place_of_publication = place;
            record.publisher = publisher;
        }
        record.published_date = non_empty(result.date);

        if let Some(extent) = item.medium.first() {
            record.page_count = pages_from_extent(extent);
            record.physical_description = non_empty(Some(extent.clone()));
        }

        let call_numbers = item.call_number.into_vec();
        record.call_number = non_empty(call_numbers.first().cloned());
        record.classifications = non_empty_list(call_numbers);

        record.subjects = non_empty_list(result.subject);
        record.language = non_empty(result.language.first().map(str::to_string));
        record.lccn = non_empty(result.number_lccn.into_iter().next());
        record.cover_url = non_empty(result.image_url.into_iter().next());
        record.info_url = non_empty(result.url);
        record.notes = non_empty_list(item.notes).map(|n| n.join("\n"));
        record.format = non_empty(result.original_format.into_iter().next());

        record.fill_isbn(isbn);
        record
    }
}

impl Provider for LibraryOfCongressProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Library of Congress"
    }
}

#[async_trait]
impl IsbnLookup for LibraryOfCongressProvider {
    async fn lookup(&self, isbn: &str) -> Result<Option<BookRecord>, ProviderError> {
        let request = self
            .http
            .get(&format!("{}/search/", self.base_url))
            .query(&[("q", isbn), ("fo", "json")]);
        let response: Option<LocResponse> = self.http.get_json(request, self.name()).await?;

        Ok(response
            .and_then(|r| r.results.into_iter().find(Self::is_book))
            .map(|result| Self::parse_result(isbn, result)))
    }
}

// ===== loc.gov API Types =====

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocResponse {
    results: Vec<LocResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocResult {
    title: Option<String>,
    contributor: Vec<String>,
    date: Option<String>,
    subject: Vec<String>,
    language: OneOrMany,
    number_lccn: Vec<String>,
    image_url: Vec<String>,
    url: Option<String>,
    original_format: Vec<String>,
    item: LocItem,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocItem {
    title: Option<String>,
    call_number: OneOrMany,
    created_published: Vec<String>,
    format: Vec<String>,
    medium: Vec<String>,
    notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn provider(server: &mockito::ServerGuard) -> LibraryOfCongressProvider {
        LibraryOfCongressProvider::with_base_url(HttpClient::new().unwrap(), server.url())
    }

    #[tokio::test]
    async fn test_lookup_parses_first_book() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "9780062316097".into()),
                Matcher::UrlEncoded("fo".into(), "json".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"results": [
                    {"title": "Sapiens photo", "original_format": ["photo, print, drawing"]},
                    {
                        "title": "Sapiens : a brief history of humankind",
                        "contributor": ["harari, yuval noah"],
                        "date": "2015",
                        "subject": ["human beings", "civilization"],
                        "language": ["english"],
                        "number_lccn": ["2014045371"],
                        "url": "https://www.loc.gov/item/2014045371/",
                        "original_format": ["book"],
                        "item": {
                            "title": "Sapiens : a brief history of humankind / Yuval Noah Harari.",
                            "call_number": ["GN281 .H3713 2015"],
                            "created_published": ["New York : Harper, [2015]"],
                            "medium": ["xxii, 443 pages : illustrations ; 24 cm"],
                            "notes": ["Includes bibliographical references and index."]
                        }
                    }
                ]}"#,
            )
            .create_async()
            .await;

        let record = provider(&server).lookup("9780062316097").await.unwrap().unwrap();

        assert_eq!(record.title.as_deref(), Some("Sapiens"));
        assert_eq!(record.subtitle.as_deref(), Some("a brief history of humankind"));
        assert_eq!(record.author.as_deref(), Some("harari, yuval noah"));
        assert_eq!(record.publisher.as_deref(), Some("Harper"));
        assert_eq!(record.place_of_publication.as_deref(), Some("New York"));
        assert_eq!(record.page_count, Some(443));
        assert_eq!(record.call_number.as_deref(), Some("GN281 .H3713 2015"));
        assert_eq!(record.lccn.as_deref(), Some("2014045371"));
        assert_eq!(record.language.as_deref(), Some("english"));
        assert_eq!(record.format.as_deref(), Some("book"));
        assert_eq!(record.isbn13.as_deref(), Some("9780062316097"));
    }

    #[tokio::test]
    async fn test_lookup_no_book_results() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"results": [{"original_format": ["map"]}]}"#)
            .create_async()
            .await;

        assert!(provider(&server).lookup("9780062316097").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_malformed_payload() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>rate limited</html>")
            .create_async()
            .await;

        let result = provider(&server).lookup("9780062316097").await;
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }
}
