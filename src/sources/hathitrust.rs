//! HathiTrust provider implementation.
//!
//! Uses the Bibliographic API brief endpoint
//! (`/api/volumes/brief/isbn/<isbn>.json`). Records are sparse but carry
//! OCLC numbers, LCCNs and a catalog link.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::{non_empty, BookRecord};
use crate::sources::catalog::split_title;
use crate::sources::{IsbnLookup, Provider, ProviderError};
use crate::utils::HttpClient;

const HATHITRUST_API_BASE: &str = "https://catalog.hathitrust.org";

/// HathiTrust provider
#[derive(Debug, Clone)]
pub struct HathiTrustProvider {
    http: HttpClient,
    base_url: String,
}

impl HathiTrustProvider {
    pub const ID: &'static str = "hathitrust";

    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, HATHITRUST_API_BASE)
    }

    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn parse_record(isbn: &str, id: String, record: HtRecord) -> BookRecord {
        let mut book = BookRecord::from_source(Self::ID);

        if let Some(raw) = record.titles.first() {
            let (title, subtitle) = split_title(raw);
            book.title = non_empty(Some(title));
            book.subtitle = subtitle;
        }
        book.published_date = non_empty(record.publish_dates.into_iter().next());
        book.oclc_number = non_empty(record.oclcs.into_iter().next());
        book.lccn = non_empty(record.lccns.into_iter().next());
        book.info_url = non_empty(record.record_url);
        book.hathitrust_id = Some(id);

        for other in record.isbns {
            match other.len() {
                13 if book.isbn13.is_none() => book.isbn13 = Some(other),
                10 if book.isbn10.is_none() => book.isbn10 = Some(other),
                _ => {}
            }
        }
        book.fill_isbn(isbn);
        book
    }
}

impl Provider for HathiTrustProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "HathiTrust"
    }
}

#[async_trait]
impl IsbnLookup for HathiTrustProvider {
    async fn lookup(&self, isbn: &str) -> Result<Option<BookRecord>, ProviderError> {
        let url = format!(
            "{}/api/volumes/brief/isbn/{}.json",
            self.base_url,
            urlencoding::encode(isbn)
        );
        let response: Option<HtResponse> = self.http.get_json(self.http.get(&url), self.name()).await?;

        Ok(response
            .and_then(|r| r.records.into_iter().next())
            .map(|(id, record)| Self::parse_record(isbn, id, record)))
    }
}

// ===== HathiTrust API Types =====

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HtResponse {
    /// Keyed by HathiTrust record number
    records: BTreeMap<String, HtRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HtRecord {
    #[serde(rename = "recordURL")]
    record_url: Option<String>,
    titles: Vec<String>,
    isbns: Vec<String>,
    oclcs: Vec<String>,
    lccns: Vec<String>,
    publish_dates: Vec<String>,
}
