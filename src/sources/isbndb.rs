//! ISBNdb provider implementation.
//!
//! Requires an API key (`ISBNDB_API_KEY` or `[api_keys] isbndb`); without one
//! the provider reports itself unconfigured and the cascade skips it.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{non_empty, non_empty_list, BookRecord};
use crate::sources::catalog::OneOrMany;
use crate::sources::{IsbnLookup, Provider, ProviderError};
use crate::utils::HttpClient;

const ISBNDB_API_BASE: &str = "https://api2.isbndb.com";

/// ISBNdb provider
#[derive(Debug, Clone)]
pub struct IsbnDbProvider {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl IsbnDbProvider {
    pub const ID: &'static str = "isbndb";

    pub fn new(http: HttpClient, api_key: Option<String>) -> Self {
        Self::with_base_url(http, api_key, ISBNDB_API_BASE)
    }

    pub fn with_base_url(
        http: HttpClient,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn parse_book(isbn: &str, book: IsbnDbBook) -> BookRecord {
        let mut record = BookRecord::from_source(Self::ID);

        let mut authors = book.authors.into_iter();
        record.author = non_empty(authors.next());
        record.contributors = non_empty_list(authors);

        // `title_long` carries the subtitle after a colon
        let title_long = non_empty(book.title_long);
        record.title = non_empty(book.title).or_else(|| title_long.clone());
        if let (Some(title), Some(long)) = (&record.title, &title_long) {
            record.subtitle = long
                .strip_prefix(title.as_str())
                .map(|rest| rest.trim_start_matches([':', ' ']).to_string())
                .filter(|rest| !rest.is_empty());
        }

        record.isbn13 = non_empty(book.isbn13);
        record.isbn10 = non_empty(book.isbn10.or(book.isbn).filter(|i| i.len() == 10));
        record.publisher = non_empty(book.publisher);
        record.published_date = non_empty(book.date_published);
        record.language = non_empty(book.language);
        record.edition = non_empty(book.edition);
        record.format = non_empty(book.binding);
        record.dimensions = non_empty(book.dimensions);
        record.description = non_empty(book.synopsis).or_else(|| non_empty(book.overview));
        record.cover_url = non_empty(book.image);
        record.page_count = book.pages.filter(|n| *n > 0);
        record.subjects = non_empty_list(book.subjects);

        let dewey = book.dewey_decimal.map(OneOrMany::into_vec).unwrap_or_default();
        record.dewey_decimal = non_empty(dewey.first().cloned());
        record.classifications = non_empty_list(dewey);

        record.fill_isbn(isbn);
        record
    }
}

impl Provider for IsbnDbProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "ISBNdb"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl IsbnLookup for IsbnDbProvider {
    async fn lookup(&self, isbn: &str) -> Result<Option<BookRecord>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("ISBNDB_API_KEY".to_string()))?;

        let request = self
            .http
            .get(&format!("{}/book/{}", self.base_url, urlencoding::encode(isbn)))
            .header("Authorization", api_key);
        let response: Option<IsbnDbResponse> = self.http.get_json(request, self.name()).await?;

        Ok(response
            .and_then(|r| r.book)
            .map(|book| Self::parse_book(isbn, book)))
    }
}

// ===== ISBNdb API Types =====

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IsbnDbResponse {
    book: Option<IsbnDbBook>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IsbnDbBook {
    title: Option<String>,
    title_long: Option<String>,
    isbn: Option<String>,
    isbn10: Option<String>,
    isbn13: Option<String>,
    authors: Vec<String>,
    publisher: Option<String>,
    date_published: Option<String>,
    language: Option<String>,
    edition: Option<String>,
    binding: Option<String>,
    dimensions: Option<String>,
    pages: Option<u32>,
    image: Option<String>,
    overview: Option<String>,
    synopsis: Option<String>,
    subjects: Vec<String>,
    dewey_decimal: Option<OneOrMany>,
}
