//! Two-provider lookup for interactive use.

use std::sync::Arc;

use super::{settle, spawn_lookup};
use crate::merge::fill_gaps;
use crate::models::BookRecord;
use crate::sources::IsbnLookup;

/// Queries two trusted providers at once.
///
/// The first provider wins every conflict; the second only fills the
/// description, subjects and page count. There is no timeout beyond the HTTP
/// client's own.
#[derive(Debug, Clone)]
pub struct FastDualLookup {
    first: Arc<dyn IsbnLookup>,
    second: Arc<dyn IsbnLookup>,
}

impl FastDualLookup {
    pub fn new(first: Arc<dyn IsbnLookup>, second: Arc<dyn IsbnLookup>) -> Self {
        Self { first, second }
    }

    /// Resolve `identifier`; `None` when neither provider has data
    pub async fn lookup(&self, identifier: &str) -> Option<BookRecord> {
        let (first, second) = tokio::join!(
            self.call(&self.first, identifier),
            self.call(&self.second, identifier)
        );

        let mut record = match (first, second) {
            (Some(first), Some(second)) => fill_gaps(&first, &second),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => return None,
        };
        record.fill_isbn(identifier);
        Some(record)
    }

    async fn call(&self, provider: &Arc<dyn IsbnLookup>, identifier: &str) -> Option<BookRecord> {
        if !provider.is_configured() {
            tracing::debug!("Skipping {}: not configured", provider.name());
            return None;
        }
        let outcome = spawn_lookup(Arc::clone(provider), identifier).await;
        settle(provider.name(), outcome)
    }
}
