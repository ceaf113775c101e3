//! Free-text search across two bulk providers.

use std::sync::Arc;

use super::FastDualLookup;
use crate::config::ResolverConfig;
use crate::models::{BookRecord, Candidate, SearchHints, SearchRequest};
use crate::query::{classify, QueryKind};
use crate::sources::BulkSearch;
use crate::utils::{report, stage, CandidateMap, Insertion, ProgressSink};

const STAGES: usize = 4;

/// Merges and deduplicates search results from two bulk providers.
///
/// Candidates from the first provider are inserted before those of the
/// second, so the first provider's values win when an identifier is shared.
/// Sibling editions are fetched for the second provider's first work.
#[derive(Debug, Clone)]
pub struct MultiResultAggregator {
    fast: FastDualLookup,
    first: Arc<dyn BulkSearch>,
    second: Arc<dyn BulkSearch>,
    config: ResolverConfig,
}

impl MultiResultAggregator {
    pub fn new(
        fast: FastDualLookup,
        first: Arc<dyn BulkSearch>,
        second: Arc<dyn BulkSearch>,
    ) -> Self {
        Self {
            fast,
            first,
            second,
            config: ResolverConfig::default(),
        }
    }

    /// Override search, edition and result limits
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// The lookup used for identifier queries
    pub fn fast(&self) -> &FastDualLookup {
        &self.fast
    }

    /// Search for `query`.
    ///
    /// An identifier query becomes a single fast lookup and reports only the
    /// `searching` and `done` stages. Otherwise field hints in the text
    /// override the caller's `hints` and all four stages are reported.
    pub async fn search(
        &self,
        query: &str,
        progress: Option<&dyn ProgressSink>,
        hints: Option<&SearchHints>,
    ) -> Vec<BookRecord> {
        let parsed = match classify(query) {
            QueryKind::Identifier(isbn) => {
                report(progress, 1, STAGES, stage::SEARCHING);
                let found = self.fast.lookup(&isbn).await;
                report(progress, STAGES, STAGES, stage::DONE);
                return found.into_iter().collect();
            }
            QueryKind::FreeText(parsed) => parsed,
        };

        let hints = hints.cloned().unwrap_or_default().overlay(&parsed.hints());
        let mut request = SearchRequest::new(parsed.title)
            .limit(self.config.search_limit)
            .hints(hints);
        request.author = parsed.author;

        report(progress, 1, STAGES, stage::SEARCHING);
        let (first, second) = tokio::join!(
            search_quietly(&self.first, &request),
            search_quietly(&self.second, &request)
        );

        report(progress, 2, STAGES, stage::ENRICHING);
        let work_key = second.iter().find_map(|c| c.work_key.clone());

        let mut map = CandidateMap::new();
        for candidate in first.into_iter().chain(second) {
            map.insert(candidate);
        }
        tracing::debug!("{} distinct candidates for '{}'", map.len(), query);

        report(progress, 3, STAGES, stage::FETCHING_EDITIONS);
        if let Some(work_key) = work_key {
            self.expand_editions(&mut map, &work_key).await;
        }

        report(progress, STAGES, STAGES, stage::DONE);
        map.into_records(self.config.max_results)
    }

    async fn expand_editions(&self, map: &mut CandidateMap, work_key: &str) {
        if map.len() >= self.config.max_results {
            tracing::debug!("Result cap reached; skipping editions of {}", work_key);
            return;
        }

        match self.second.editions(work_key, self.config.editions_limit).await {
            Ok(editions) => {
                let added = editions
                    .into_iter()
                    .map(|edition| map.insert_edition(edition))
                    .filter(|outcome| *outcome == Insertion::Added)
                    .count();
                tracing::debug!("Added {} editions of {}", added, work_key);
            }
            Err(e) => {
                tracing::warn!(
                    "Fetching editions of {} from {} failed: {}",
                    work_key,
                    self.second.name(),
                    e
                );
            }
        }
    }
}

/// Run a search on its own task; any failure yields no candidates
async fn search_quietly(provider: &Arc<dyn BulkSearch>, request: &SearchRequest) -> Vec<Candidate> {
    let task = {
        let provider = Arc::clone(provider);
        let request = request.clone();
        tokio::spawn(async move { provider.search(&request).await })
    };

    match task.await {
        Ok(Ok(candidates)) => {
            tracing::debug!("{} returned {} candidates", provider.name(), candidates.len());
            candidates
        }
        Ok(Err(e)) => {
            tracing::warn!("{} search failed: {}", provider.name(), e);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("{} search task failed: {}", provider.name(), e);
            Vec::new()
        }
    }
}
