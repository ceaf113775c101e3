//! Open Library provider implementation.
//!
//! Lookup uses the Books API (`/api/books?jscmd=data`) and then enriches the
//! record from the edition and work JSON (description, subjects, format).
//! Search uses `/search.json`; sibling editions come from
//! `/works/<id>/editions.json`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{non_empty, non_empty_list, BookRecord, Candidate, SearchRequest};
use crate::sources::{BulkSearch, IsbnLookup, Provider, ProviderCapabilities, ProviderError};
use crate::utils::HttpClient;

const OPENLIBRARY_API_BASE: &str = "https://openlibrary.org";
const OPENLIBRARY_COVERS_BASE: &str = "https://covers.openlibrary.org";

/// Search fields requested from `/search.json`
const SEARCH_FIELDS: &str = "key,title,subtitle,author_name,isbn,publisher,first_publish_year,\
number_of_pages_median,cover_i,subject,language,edition_count,cover_edition_key";

/// Subjects kept per search candidate
const MAX_CANDIDATE_SUBJECTS: usize = 20;

/// Open Library provider
#[derive(Debug, Clone)]
pub struct OpenLibraryProvider {
    http: HttpClient,
    base_url: String,
    covers_url: String,
}

impl OpenLibraryProvider {
    pub const ID: &'static str = "openlibrary";

    /// Create a provider against the public API
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, OPENLIBRARY_API_BASE)
    }

    /// Create a provider against another host (used by tests)
    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            covers_url: OPENLIBRARY_COVERS_BASE.to_string(),
        }
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn cover_for_id(&self, cover_id: i64, size: char) -> String {
        format!("{}/b/id/{}-{}.jpg", self.covers_url, cover_id, size)
    }

    /// Parse a Books API entry
    fn parse_book(isbn: &str, data: OlBookData) -> BookRecord {
        let mut record = BookRecord::from_source(Self::ID);

        let mut authors = data.authors.into_iter().map(|a| a.name);
        record.author = non_empty(authors.next());
        record.contributors = non_empty_list(authors);

        record.title = non_empty(data.title);
        record.subtitle = non_empty(data.subtitle);
        record.publisher = non_empty(data.publishers.into_iter().next().map(|p| p.name));
        record.published_date = non_empty(data.publish_date);
        record.place_of_publication =
            non_empty(data.publish_places.into_iter().next().map(|p| p.name));
        record.page_count = data.number_of_pages.filter(|n| *n > 0);
        record.physical_description = non_empty(data.pagination);
        record.weight = non_empty(data.weight);
        record.notes = data.notes.map(OlText::into_string).and_then(|n| non_empty(Some(n)));
        record.info_url = non_empty(data.url);
        record.openlibrary_id = data
            .key
            .as_deref()
            .map(|k| k.trim_start_matches("/books/").to_string());

        if let Some(cover) = data.cover {
            record.cover_url = non_empty(cover.medium.or(cover.small));
            record.cover_url_large = non_empty(cover.large);
        }

        record.subjects = non_empty_list(data.subjects.into_iter().map(|s| s.name));
        record.places = non_empty_list(data.subject_places.into_iter().map(|s| s.name));
        record.people = non_empty_list(data.subject_people.into_iter().map(|s| s.name));
        record.time_periods = non_empty_list(data.subject_times.into_iter().map(|s| s.name));
        record.table_of_contents = non_empty(Some(
            data.table_of_contents
                .into_iter()
                .filter_map(|e| e.title)
                .collect::<Vec<_>>()
                .join("\n"),
        ));

        let ids = data.identifiers;
        record.isbn13 = non_empty(ids.isbn_13.into_iter().next());
        record.isbn10 = non_empty(ids.isbn_10.into_iter().next());
        record.lccn = non_empty(ids.lccn.into_iter().next());
        record.oclc_number = non_empty(ids.oclc.into_iter().next());

        let classes = data.classifications;
        record.call_number = non_empty(classes.lc_classifications.first().cloned());
        record.dewey_decimal = non_empty(classes.dewey_decimal_class.first().cloned());
        record.classifications = non_empty_list(
            classes
                .lc_classifications
                .into_iter()
                .chain(classes.dewey_decimal_class),
        );

        record.fill_isbn(isbn);
        record
    }

    /// Copy edition-level details the Books API leaves out
    fn apply_edition(record: &mut BookRecord, edition: &OlEdition) {
        if record.format.is_none() {
            record.format = non_empty(edition.physical_format.clone());
        }
        if record.language.is_none() {
            record.language = edition.languages.first().map(OlKey::short);
        }
        if record.edition.is_none() {
            record.edition = non_empty(edition.edition_name.clone());
        }
        if record.series.is_none() {
            record.series = non_empty(edition.series.first().cloned());
        }
        if record.description.is_none() {
            record.description = edition
                .description
                .clone()
                .map(OlText::into_string)
                .and_then(|d| non_empty(Some(d)));
        }
        if record.work_key.is_none() {
            record.work_key = edition.works.first().map(|w| w.key.clone());
        }
    }

    /// Copy work-level details (description, subjects, first publication)
    fn apply_work(record: &mut BookRecord, work: OlWork) {
        if record.description.is_none() {
            record.description = work
                .description
                .map(OlText::into_string)
                .and_then(|d| non_empty(Some(d)));
        }
        if record.subjects.is_none() {
            record.subjects = non_empty_list(work.subjects);
        }
        if record.first_published.is_none() {
            record.first_published = non_empty(work.first_publish_date);
        }
    }

    /// Fetch edition and work JSON for a looked-up record.
    ///
    /// Failures are logged and leave the record as it was.
    async fn enrich(&self, record: &mut BookRecord) {
        let Some(edition_id) = record.openlibrary_id.clone() else {
            return;
        };

        let url = self.build_url(&format!("/books/{}.json", edition_id));
        let edition: OlEdition = match self.http.get_json(self.http.get(&url), self.name()).await {
            Ok(Some(edition)) => edition,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!("Open Library edition enrichment failed for {}: {}", edition_id, e);
                return;
            }
        };
        Self::apply_edition(record, &edition);

        let Some(work_key) = record.work_key.clone() else {
            return;
        };
        let url = self.build_url(&format!("{}.json", work_key));
        match self.http.get_json::<OlWork>(self.http.get(&url), self.name()).await {
            Ok(Some(work)) => Self::apply_work(record, work),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("Open Library work enrichment failed for {}: {}", work_key, e);
            }
        }
    }

    /// Parse a `/search.json` document into a candidate
    fn parse_search_doc(&self, doc: OlSearchDoc) -> Candidate {
        let mut record = BookRecord::from_source(Self::ID);

        let mut authors = doc.author_name.into_iter();
        record.author = non_empty(authors.next());
        record.contributors = non_empty_list(authors);

        record.title = non_empty(doc.title);
        record.subtitle = non_empty(doc.subtitle);
        record.publisher = non_empty(doc.publisher.into_iter().next());
        record.published_date = doc.first_publish_year.map(|y| y.to_string());
        record.first_published = record.published_date.clone();
        record.page_count = doc.number_of_pages_median.filter(|n| *n > 0);
        record.language = non_empty(doc.language.into_iter().next());
        record.subjects = non_empty_list(doc.subject.into_iter().take(MAX_CANDIDATE_SUBJECTS));
        record.edition_count = doc.edition_count;
        record.openlibrary_id = non_empty(doc.cover_edition_key);
        record.cover_url = doc
            .cover_i
            .filter(|id| *id > 0)
            .map(|id| self.cover_for_id(id, 'M'));
        record.cover_url_large = doc
            .cover_i
            .filter(|id| *id > 0)
            .map(|id| self.cover_for_id(id, 'L'));

        record.isbn13 = doc.isbn.iter().find(|i| i.len() == 13).cloned();
        record.isbn10 = doc.isbn.iter().find(|i| i.len() == 10).cloned();
        record.work_key = non_empty(doc.key.clone());

        let mut candidate = Candidate::new(record);
        if let Some(key) = doc.key {
            candidate = candidate.source_id(format!("{}:{}", Self::ID, key));
        }
        candidate
    }

    /// Parse an edition from `/works/<id>/editions.json`
    fn parse_edition(&self, edition: OlEdition, work_key: &str) -> BookRecord {
        let mut record = BookRecord::from_source(Self::ID);
        Self::apply_edition(&mut record, &edition);

        record.title = non_empty(edition.title);
        record.subtitle = non_empty(edition.subtitle);
        record.publisher = non_empty(edition.publishers.into_iter().next());
        record.published_date = non_empty(edition.publish_date);
        record.page_count = edition.number_of_pages.filter(|n| *n > 0);
        record.isbn13 = non_empty(edition.isbn_13.into_iter().next());
        record.isbn10 = non_empty(edition.isbn_10.into_iter().next());
        record.lccn = non_empty(edition.lccn.into_iter().next());
        record.oclc_number = non_empty(edition.oclc_numbers.into_iter().next());
        record.openlibrary_id = edition
            .key
            .as_deref()
            .map(|k| k.trim_start_matches("/books/").to_string());
        record.cover_url = edition
            .covers
            .iter()
            .find(|id| **id > 0)
            .map(|id| self.cover_for_id(*id, 'M'));
        record.work_key = Some(work_key.to_string());
        record
    }
}

impl Provider for OpenLibraryProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Open Library"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::LOOKUP | ProviderCapabilities::SEARCH | ProviderCapabilities::EDITIONS
    }
}

#[async_trait]
impl IsbnLookup for OpenLibraryProvider {
    async fn lookup(&self, isbn: &str) -> Result<Option<BookRecord>, ProviderError> {
        let bibkey = format!("ISBN:{}", isbn);
        let request = self.http.get(&self.build_url("/api/books")).query(&[
            ("bibkeys", bibkey.as_str()),
            ("format", "json"),
            ("jscmd", "data"),
        ]);

        let data: Option<HashMap<String, OlBookData>> =
            self.http.get_json(request, self.name()).await?;
        let Some(mut data) = data else {
            return Ok(None);
        };

        let entry = match data.remove(&bibkey) {
            Some(entry) => entry,
            None => match data.into_values().next() {
                Some(entry) => entry,
                None => return Ok(None),
            },
        };

        let mut record = Self::parse_book(isbn, entry);
        self.enrich(&mut record).await;
        Ok(Some(record))
    }
}

#[async_trait]
impl BulkSearch for OpenLibraryProvider {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, ProviderError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if !request.title.trim().is_empty() {
            params.push(("title", request.title.clone()));
        }
        if let Some(author) = &request.author {
            params.push(("author", author.clone()));
        }
        let hints = &request.hints;
        if let Some(publisher) = &hints.publisher {
            params.push(("publisher", publisher.clone()));
        }
        if let Some(subject) = &hints.subject {
            params.push(("subject", subject.clone()));
        }
        if let Some(place) = &hints.place {
            params.push(("place", place.clone()));
        }
        if let Some(year) = &hints.year {
            params.push(("first_publish_year", year.clone()));
        }
        if let Some(language) = &hints.language {
            params.push(("language", language.clone()));
        }
        if params.is_empty() {
            return Ok(Vec::new());
        }
        params.push(("limit", request.limit.to_string()));
        params.push(("fields", SEARCH_FIELDS.to_string()));

        let http_request = self
            .http
            .get(&self.build_url("/search.json"))
            .query(&params);
        let response: Option<OlSearchResponse> =
            self.http.get_json(http_request, self.name()).await?;

        Ok(response
            .map(|r| {
                r.docs
                    .into_iter()
                    .take(request.limit)
                    .map(|doc| self.parse_search_doc(doc))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn editions(
        &self,
        work_key: &str,
        limit: usize,
    ) -> Result<Vec<BookRecord>, ProviderError> {
        let work_key = work_key.trim();
        if work_key.is_empty() || work_key == "/works/" {
            return Err(ProviderError::InvalidRequest("empty work key".to_string()));
        }
        let work_key = if work_key.starts_with('/') {
            work_key.to_string()
        } else {
            format!("/works/{}", work_key)
        };

        let request = self
            .http
            .get(&self.build_url(&format!("{}/editions.json", work_key)))
            .query(&[("limit", limit.to_string())]);
        let response: Option<OlEditionsResponse> =
            self.http.get_json(request, self.name()).await?;

        Ok(response
            .map(|r| {
                r.entries
                    .into_iter()
                    .take(limit)
                    .map(|e| self.parse_edition(e, &work_key))
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ===== Open Library API Types =====

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlBookData {
    key: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    authors: Vec<OlNamed>,
    publishers: Vec<OlNamed>,
    publish_date: Option<String>,
    publish_places: Vec<OlNamed>,
    number_of_pages: Option<u32>,
    pagination: Option<String>,
    weight: Option<String>,
    cover: Option<OlCover>,
    subjects: Vec<OlNamed>,
    subject_places: Vec<OlNamed>,
    subject_people: Vec<OlNamed>,
    subject_times: Vec<OlNamed>,
    identifiers: OlIdentifiers,
    classifications: OlClassifications,
    notes: Option<OlText>,
    url: Option<String>,
    table_of_contents: Vec<OlTocEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct OlNamed {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlCover {
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlIdentifiers {
    isbn_10: Vec<String>,
    isbn_13: Vec<String>,
    lccn: Vec<String>,
    oclc: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlClassifications {
    lc_classifications: Vec<String>,
    dewey_decimal_class: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlTocEntry {
    title: Option<String>,
}

/// Open Library text fields are either a bare string or `{type, value}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OlText {
    Plain(String),
    Typed { value: String },
}

impl OlText {
    fn into_string(self) -> String {
        match self {
            OlText::Plain(s) => s,
            OlText::Typed { value } => value,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OlKey {
    #[serde(default)]
    key: String,
}

impl OlKey {
    /// Last path segment, e.g. `eng` for `/languages/eng`
    fn short(&self) -> String {
        self.key.rsplit('/').next().unwrap_or_default().to_string()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlEdition {
    key: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    publishers: Vec<String>,
    publish_date: Option<String>,
    number_of_pages: Option<u32>,
    isbn_10: Vec<String>,
    isbn_13: Vec<String>,
    lccn: Vec<String>,
    oclc_numbers: Vec<String>,
    covers: Vec<i64>,
    physical_format: Option<String>,
    languages: Vec<OlKey>,
    works: Vec<OlKey>,
    edition_name: Option<String>,
    series: Vec<String>,
    description: Option<OlText>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlWork {
    description: Option<OlText>,
    subjects: Vec<String>,
    first_publish_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlSearchResponse {
    docs: Vec<OlSearchDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlSearchDoc {
    key: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    author_name: Vec<String>,
    isbn: Vec<String>,
    publisher: Vec<String>,
    first_publish_year: Option<i32>,
    number_of_pages_median: Option<u32>,
    cover_i: Option<i64>,
    subject: Vec<String>,
    language: Vec<String>,
    edition_count: Option<u32>,
    cover_edition_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlEditionsResponse {
    entries: Vec<OlEdition>,
}
