//! Book metadata provider plugins.
//!
//! Each external data source is an adapter implementing [`Provider`] plus one
//! trait per capability it offers:
//!
//! - [`IsbnLookup`] - fetch a single record by ISBN
//! - [`BulkSearch`] - return candidate records for a title/author query, and
//!   optionally the sibling editions of a work
//!
//! Adapters are registered with a priority tier in the [`ProviderRegistry`].
//! New sources can be added by implementing these traits and registering them.
//!
//! # Providers
//!
//! | id | tier | lookup | search | credential |
//! |----|------|--------|--------|------------|
//! | `openlibrary` | 1 | yes | yes (+ editions) | none |
//! | `google_books` | 1 | yes | yes | optional `GOOGLE_BOOKS_API_KEY` |
//! | `isbndb` | 2 | yes | no | required `ISBNDB_API_KEY` |
//! | `loc` | 3 | yes | no | none |
//! | `hathitrust` | 4 | yes | no | none |
//!
//! # Runtime Provider Configuration
//!
//! - `BOOK_RESOLVER_PROVIDERS__ENABLED` - only use these cascade providers
//! - `BOOK_RESOLVER_PROVIDERS__DISABLED` - never use these cascade providers
//!
//! Disabled always wins over enabled.

mod catalog;
mod google_books;
mod hathitrust;
mod isbndb;
mod loc;
mod openlibrary;
mod registry;

pub mod mock;

pub use google_books::GoogleBooksProvider;
pub use hathitrust::HathiTrustProvider;
pub use isbndb::IsbnDbProvider;
pub use loc::LibraryOfCongressProvider;
pub use mock::MockProvider;
pub use openlibrary::OpenLibraryProvider;
pub use registry::{ProviderCapabilities, ProviderDescriptor, ProviderRegistry, RegisteredProvider};

use crate::models::{BookRecord, Candidate, SearchRequest};
use async_trait::async_trait;

/// Identity and configuration status shared by every provider
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Unique identifier (e.g. "openlibrary", "google_books")
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Describe the capabilities of this provider
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::LOOKUP
    }

    /// Whether every credential the provider needs is present.
    ///
    /// Unconfigured providers are skipped without a network call.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Lookup of a single record by ISBN
#[async_trait]
pub trait IsbnLookup: Provider {
    /// Fetch the record for `isbn`; `Ok(None)` when the provider has no data
    async fn lookup(&self, isbn: &str) -> Result<Option<BookRecord>, ProviderError>;
}

/// Free-text search returning many candidates
#[async_trait]
pub trait BulkSearch: Provider {
    /// Search for candidates matching the request, at most `request.limit`
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, ProviderError>;

    /// Fetch up to `limit` editions of the work identified by `work_key`
    async fn editions(
        &self,
        _work_key: &str,
        _limit: usize,
    ) -> Result<Vec<BookRecord>, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}

/// Errors that can occur when talking to a provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The requested operation is not implemented for this provider
    #[error("Operation not implemented for this provider")]
    NotImplemented,

    /// A required credential is missing
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status or error payload from the provider
    #[error("API error: {0}")]
    Api(String),

    /// Malformed payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(format!("JSON: {}", err))
    }
}
