//! Google Books provider implementation.
//!
//! Uses the public volumes API. An API key is optional; without one the
//! anonymous quota applies.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{non_empty, non_empty_list, BookRecord, Candidate, SearchRequest};
use crate::sources::{BulkSearch, IsbnLookup, Provider, ProviderCapabilities, ProviderError};
use crate::utils::HttpClient;

const GOOGLE_BOOKS_API_BASE: &str = "https://www.googleapis.com/books/v1";

/// The volumes API rejects `maxResults` above this
const MAX_RESULTS_PER_REQUEST: usize = 40;

/// Google Books provider
#[derive(Debug, Clone)]
pub struct GoogleBooksProvider {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksProvider {
    pub const ID: &'static str = "google_books";

    /// Create a provider against the public API
    pub fn new(http: HttpClient, api_key: Option<String>) -> Self {
        Self::with_base_url(http, api_key, GOOGLE_BOOKS_API_BASE)
    }

    /// Create a provider against another host (used by tests)
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

    /// Build a volumes query, appending the key when present
    fn volumes_request(&self, q: &str, extra: &[(&str, String)]) -> reqwest::RequestBuilder {
        let mut params: Vec<(&str, String)> = vec![("q", q.to_string())];
        params.extend(extra.iter().cloned());
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        self.http
            .get(&format!("{}/volumes", self.base_url))
            .query(&params)
    }

    /// Build the `q` expression for a search request
    fn search_terms(request: &SearchRequest) -> String {
        let mut terms = Vec::new();
        if !request.title.trim().is_empty() {
            terms.push(format!("intitle:{}", request.title.trim()));
        }
        if let Some(author) = &request.author {
            terms.push(format!("inauthor:{}", author));
        }
        if let Some(publisher) = &request.hints.publisher {
            terms.push(format!("inpublisher:{}", publisher));
        }
        if let Some(subject) = &request.hints.subject {
            terms.push(format!("subject:{}", subject));
        }
        // The volumes API has no place or year filter; they narrow as plain terms
        if let Some(place) = &request.hints.place {
            terms.push(place.clone());
        }
        if let Some(year) = &request.hints.year {
            terms.push(year.clone());
        }
        terms.join(" ")
    }

    fn parse_volume(volume: GbVolume) -> BookRecord {
        let info = volume.volume_info;
        let mut record = BookRecord::from_source(Self::ID);

        let mut authors = info.authors.into_iter();
        record.author = non_empty(authors.next());
        record.contributors = non_empty_list(authors);

        record.title = non_empty(info.title);
        record.subtitle = non_empty(info.subtitle);
        record.publisher = non_empty(info.publisher);
        record.published_date = non_empty(info.published_date);
        record.description = non_empty(info.description);
        record.page_count = info.page_count.filter(|n| *n > 0);
        record.categories = non_empty_list(info.categories.iter().cloned());
        record.subjects = non_empty_list(info.categories);
        record.language = non_empty(info.language);
        record.ratings_count = info.ratings_count;
        record.maturity_rating = non_empty(info.maturity_rating);
        record.format = non_empty(info.print_type).map(|t| t.to_lowercase());
        record.info_url = non_empty(info.info_link);
        record.preview_url = non_empty(info.preview_link);
        record.google_books_id = non_empty(volume.id);

        for id in info.industry_identifiers {
            match id.kind.as_str() {
                "ISBN_13" if record.isbn13.is_none() => record.isbn13 = non_empty(Some(id.identifier)),
                "ISBN_10" if record.isbn10.is_none() => record.isbn10 = non_empty(Some(id.identifier)),
                _ => {}
            }
        }

        if let Some(links) = info.image_links {
            record.cover_url = non_empty(links.thumbnail.or(links.small_thumbnail)).map(secure_url);
            record.cover_url_large =
                non_empty(links.extra_large.or(links.large).or(links.medium)).map(secure_url);
        }

        record
    }
}

/// Google returns `http://` image links; browsers block them on https pages
fn secure_url(url: String) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url,
    }
}

impl Provider for GoogleBooksProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Google Books"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::LOOKUP | ProviderCapabilities::SEARCH
    }
}

#[async_trait]
impl IsbnLookup for GoogleBooksProvider {
    async fn lookup(&self, isbn: &str) -> Result<Option<BookRecord>, ProviderError> {
        let request = self.volumes_request(&format!("isbn:{}", isbn), &[]);
        let response: Option<GbVolumesResponse> = self.http.get_json(request, self.name()).await?;

        Ok(response
            .and_then(|r| r.items.into_iter().next())
            .map(|volume| {
                let mut record = Self::parse_volume(volume);
                record.fill_isbn(isbn);
                record
            }))
    }
}

#[async_trait]
impl BulkSearch for GoogleBooksProvider {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, ProviderError> {
        let terms = Self::search_terms(request);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let limit = request.limit.clamp(1, MAX_RESULTS_PER_REQUEST);
        let mut extra = vec![("maxResults", limit.to_string()), ("printType", "books".to_string())];
        if let Some(language) = &request.hints.language {
            extra.push(("langRestrict", language.clone()));
        }

        let http_request = self.volumes_request(&terms, &extra);
        let response: Option<GbVolumesResponse> =
            self.http.get_json(http_request, self.name()).await?;

        Ok(response
            .map(|r| {
                r.items
                    .into_iter()
                    .map(|volume| {
                        let id = volume.id.clone();
                        let candidate = Candidate::new(Self::parse_volume(volume));
                        match id {
                            Some(id) => candidate.source_id(format!("{}:{}", Self::ID, id)),
                            None => candidate,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ===== Google Books API Types =====

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GbVolumesResponse {
    items: Vec<GbVolume>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GbVolume {
    id: Option<String>,
    volume_info: GbVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GbVolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    industry_identifiers: Vec<GbIdentifier>,
    page_count: Option<u32>,
    categories: Vec<String>,
    ratings_count: Option<u32>,
    maturity_rating: Option<String>,
    print_type: Option<String>,
    image_links: Option<GbImageLinks>,
    language: Option<String>,
    preview_link: Option<String>,
    info_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GbIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GbImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
    medium: Option<String>,
    large: Option<String>,
    extra_large: Option<String>,
}
