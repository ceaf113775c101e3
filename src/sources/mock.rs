//! Mock provider for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{BookRecord, BookRecordBuilder, Candidate, SearchRequest};
use crate::sources::{BulkSearch, IsbnLookup, Provider, ProviderCapabilities, ProviderError};

/// A mock provider that returns predefined responses.
///
/// Every call is counted, so tests can assert which providers a resolver
/// actually invoked.
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    name: String,
    configured: bool,
    fail: bool,
    delay: Option<Duration>,
    lookup_response: Mutex<Option<BookRecord>>,
    search_response: Mutex<Vec<Candidate>>,
    editions_response: Mutex<Option<Vec<BookRecord>>>,
    last_search: Mutex<Option<SearchRequest>>,
    lookup_calls: AtomicUsize,
    search_calls: AtomicUsize,
    editions_calls: AtomicUsize,
}

impl MockProvider {
    /// Create a mock provider with no data
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("Mock {}", id),
            id,
            configured: true,
            fail: false,
            delay: None,
            lookup_response: Mutex::new(None),
            search_response: Mutex::new(Vec::new()),
            editions_response: Mutex::new(None),
            last_search: Mutex::new(None),
            lookup_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            editions_calls: AtomicUsize::new(0),
        }
    }

    /// Return `record` from every lookup
    pub fn with_record(self, record: BookRecord) -> Self {
        self.set_lookup_response(Some(record));
        self
    }

    /// Return `candidates` from every search
    pub fn with_candidates(self, candidates: Vec<Candidate>) -> Self {
        self.set_search_response(candidates);
        self
    }

    /// Return `editions` from edition requests (otherwise they fail)
    pub fn with_editions(self, editions: Vec<BookRecord>) -> Self {
        if let Ok(mut guard) = self.editions_response.lock() {
            *guard = Some(editions);
        }
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every lookup and search with a network error
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Report a missing credential
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Set the lookup response.
    pub fn set_lookup_response(&self, record: Option<BookRecord>) {
        if let Ok(mut guard) = self.lookup_response.lock() {
            *guard = record;
        }
    }

    /// Set the search response.
    pub fn set_search_response(&self, candidates: Vec<Candidate>) {
        if let Ok(mut guard) = self.search_response.lock() {
            *guard = candidates;
        }
    }

    /// The most recent search request received
    pub fn last_search(&self) -> Option<SearchRequest> {
        self.last_search.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn editions_calls(&self) -> usize {
        self.editions_calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<(), ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ProviderError::Network(format!("{} is unreachable", self.id)));
        }
        Ok(())
    }
}

impl Provider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::LOOKUP | ProviderCapabilities::SEARCH | ProviderCapabilities::EDITIONS
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

#[async_trait]
impl IsbnLookup for MockProvider {
    async fn lookup(&self, _isbn: &str) -> Result<Option<BookRecord>, ProviderError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.answer().await?;

        let guard = self
            .lookup_response
            .lock()
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl BulkSearch for MockProvider {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_search.lock() {
            *last = Some(request.clone());
        }
        self.answer().await?;

        let guard = self
            .search_response
            .lock()
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        Ok(guard.iter().take(request.limit).cloned().collect())
    }

    async fn editions(
        &self,
        _work_key: &str,
        limit: usize,
    ) -> Result<Vec<BookRecord>, ProviderError> {
        self.editions_calls.fetch_add(1, Ordering::SeqCst);

        let guard = self
            .editions_response
            .lock()
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        match &*guard {
            Some(editions) => Ok(editions.iter().take(limit).cloned().collect()),
            None => Err(ProviderError::Api(format!("{} has no editions", self.id))),
        }
    }
}

/// Helper function to create a mock record for testing.
pub fn make_record(source: &str, isbn: &str, title: &str) -> BookRecord {
    let builder = BookRecordBuilder::new(source).title(title);
    match isbn.len() {
        13 => builder.isbn13(isbn).build(),
        10 => builder.isbn10(isbn).build(),
        _ => builder.build(),
    }
}

/// Helper function to create a fully populated record for testing.
///
/// Every field the cascade checks before stopping early is filled.
pub fn make_complete_record(source: &str, isbn: &str) -> BookRecord {
    BookRecordBuilder::new(source)
        .title("Sapiens")
        .subtitle("A Brief History of Humankind")
        .author("Yuval Noah Harari")
        .isbn13(isbn)
        .cover_url("https://covers.example/sapiens.jpg")
        .description("A history of humankind.")
        .publisher("Harper")
        .published_date("2015")
        .page_count(443)
        .language("en")
        .call_number("GN281 .H3713 2015")
        .subjects(["History"])
        .classifications(["909"])
        .format("Hardcover")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let mock = MockProvider::new("m").with_record(make_record("m", "9780062316097", "Sapiens"));

        let record = mock.lookup("9780062316097").await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("Sapiens"));
        assert_eq!(mock.lookup_calls(), 1);
        assert_eq!(mock.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_failing_and_editions() {
        let mock = MockProvider::new("m").failing();
        assert!(mock.lookup("x").await.is_err());
        assert!(mock.search(&SearchRequest::new("x")).await.is_err());
        assert!(mock.editions("/works/W", 10).await.is_err());

        let mock = MockProvider::new("m")
            .with_editions(vec![make_record("m", "1", "a"), make_record("m", "2", "b")]);
        assert_eq!(mock.editions("/works/W", 1).await.unwrap().len(), 1);
        assert_eq!(mock.editions_calls(), 1);
    }

    #[test]
    fn test_make_complete_record_has_checklist() {
        let record = make_complete_record("m", "9780062316097");
        assert!(crate::merge::has_all_important_fields(&record));
    }
}
