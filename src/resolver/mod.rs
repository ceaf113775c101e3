//! Book resolution engines and the [`BookResolver`] facade.
//!
//! - [`CascadeResolver`]: tiered lookup with a per-call timeout and early stop
//! - [`FastDualLookup`]: two trusted providers, merged with fixed precedence
//! - [`MultiResultAggregator`]: free-text search across two bulk providers
//!
//! Every provider call is isolated at its boundary: errors, panics and
//! timeouts become "no data" and never reach the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use book_resolver::{config::Config, BookResolver};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = BookResolver::from_config(&Config::default())?;
//!
//! if let Some(book) = resolver.resolve_by_identifier("978-0-06-231609-7", None).await {
//!     println!("{:?}", book.title);
//! }
//!
//! let results = resolver
//!     .search_multiple("Sapiens by Yuval Noah Harari", None, None)
//!     .await;
//! println!("{} results", results.len());
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod cascade;
mod fast;

pub use aggregate::MultiResultAggregator;
pub use cascade::CascadeResolver;
pub use fast::FastDualLookup;

use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

use crate::config::Config;
use crate::models::{BookRecord, SearchHints};
use crate::query::detect_identifier;
use crate::sources::{
    GoogleBooksProvider, IsbnLookup, OpenLibraryProvider, ProviderError, ProviderRegistry,
};
use crate::utils::{HttpClient, ProgressSink};

/// Entry point for identifier lookups and free-text searches
#[derive(Debug, Clone)]
pub struct BookResolver {
    cascade: CascadeResolver,
    aggregator: MultiResultAggregator,
}

impl BookResolver {
    /// Assemble a resolver from its engines
    pub fn new(cascade: CascadeResolver, aggregator: MultiResultAggregator) -> Self {
        Self {
            cascade,
            aggregator,
        }
    }

    /// Build the resolver with the built-in providers.
    ///
    /// The cascade uses every provider enabled in `[providers]`; the fast
    /// pair (Open Library, Google Books) and the bulk-search pair (Google
    /// Books, Open Library) are fixed.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let http = HttpClient::from_config(&config.http)?;
        let registry = ProviderRegistry::from_config(config, &http);

        let openlibrary = Arc::new(OpenLibraryProvider::new(http.clone()));
        let google_books = Arc::new(GoogleBooksProvider::new(
            http,
            config.api_keys.google_books.clone(),
        ));

        let cascade = CascadeResolver::new(Arc::new(registry))
            .with_timeout(config.resolver.provider_timeout());
        let fast = FastDualLookup::new(openlibrary.clone(), google_books.clone());
        let aggregator = MultiResultAggregator::new(fast, google_books, openlibrary)
            .with_config(config.resolver.clone());

        Ok(Self::new(cascade, aggregator))
    }

    /// Providers taking part in cascades
    pub fn registry(&self) -> &ProviderRegistry {
        self.cascade.registry()
    }

    /// Resolve one identifier through every provider tier.
    ///
    /// Hyphens and spaces in an ISBN are ignored. Returns `None` when no
    /// provider has data.
    pub async fn resolve_by_identifier(
        &self,
        identifier: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> Option<BookRecord> {
        let identifier = normalize_identifier(identifier);
        self.cascade.resolve(&identifier, progress).await
    }

    /// Search by free text (or identifier) and return up to the configured
    /// maximum of deduplicated records
    pub async fn search_multiple(
        &self,
        query: &str,
        progress: Option<&dyn ProgressSink>,
        hints: Option<&SearchHints>,
    ) -> Vec<BookRecord> {
        self.aggregator.search(query, progress, hints).await
    }

    /// Resolve one identifier with the fast provider pair only
    pub async fn lookup_fast(&self, identifier: &str) -> Option<BookRecord> {
        let identifier = normalize_identifier(identifier);
        self.aggregator.fast().lookup(&identifier).await
    }
}

fn normalize_identifier(identifier: &str) -> String {
    detect_identifier(identifier).unwrap_or_else(|| identifier.trim().to_string())
}

/// Run one lookup on its own task so a panic stays inside it
pub(crate) fn spawn_lookup(
    provider: Arc<dyn IsbnLookup>,
    identifier: &str,
) -> JoinHandle<Result<Option<BookRecord>, ProviderError>> {
    let identifier = identifier.to_string();
    tokio::spawn(async move { provider.lookup(&identifier).await })
}

/// Collapse a finished lookup into "data" or "no data", logging failures
pub(crate) fn settle(
    provider: &str,
    outcome: Result<Result<Option<BookRecord>, ProviderError>, JoinError>,
) -> Option<BookRecord> {
    match outcome {
        Ok(Ok(Some(record))) if record.has_data() => {
            tracing::debug!("{} returned data", provider);
            Some(record)
        }
        Ok(Ok(_)) => {
            tracing::debug!("{} has no data", provider);
            None
        }
        Ok(Err(e)) => {
            tracing::warn!("{} lookup failed: {}", provider, e);
            None
        }
        Err(e) => {
            tracing::warn!("{} lookup task failed: {}", provider, e);
            None
        }
    }
}
