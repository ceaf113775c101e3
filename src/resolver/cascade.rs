//! Tiered identifier resolution.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::{settle, spawn_lookup};
use crate::merge::{has_all_important_fields, merge};
use crate::models::BookRecord;
use crate::sources::ProviderRegistry;
use crate::utils::{report, ProgressSink};

/// Default per-provider timeout inside a tier
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

/// Resolves an identifier tier by tier.
///
/// Every provider in a tier runs concurrently, each raced against the
/// per-call timeout. Results are merged in registration order once the whole
/// tier has settled. Lower tiers are never called once the important-field
/// checklist is complete.
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    registry: Arc<ProviderRegistry>,
    timeout: Duration,
}

impl CascadeResolver {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Set the per-provider timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Resolve `identifier`; `None` when no provider has data
    pub async fn resolve(
        &self,
        identifier: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> Option<BookRecord> {
        let total = self
            .registry
            .all()
            .filter(|p| p.provider.is_configured())
            .count();
        let mut invoked = 0;
        let mut accumulated: Option<BookRecord> = None;

        for (tier, providers) in self.registry.tiers() {
            let mut calls = Vec::with_capacity(providers.len());

            for registered in providers {
                let name = registered.descriptor.name.clone();
                if !registered.provider.is_configured() {
                    tracing::debug!("Skipping {}: not configured", name);
                    continue;
                }

                invoked += 1;
                report(progress, invoked, total, &name);

                let handle = spawn_lookup(Arc::clone(&registered.provider), identifier);
                let timeout = self.timeout;
                calls.push(async move {
                    match tokio::time::timeout(timeout, handle).await {
                        Ok(outcome) => settle(&name, outcome),
                        Err(_) => {
                            // Dropping the handle detaches the task; its late result is discarded
                            tracing::debug!("{} timed out after {:?}", name, timeout);
                            None
                        }
                    }
                });
            }

            let results = join_all(calls).await;
            for record in results.into_iter().flatten() {
                accumulated = Some(match accumulated {
                    Some(current) => merge(&current, &record),
                    None => record,
                });
            }
            tracing::debug!("Tier {} complete for {}", tier, identifier);

            if accumulated.as_ref().is_some_and(has_all_important_fields) {
                tracing::debug!("All important fields found after tier {}; stopping", tier);
                break;
            }
        }

        accumulated.map(|mut record| {
            record.fill_isbn(identifier);
            record
        })
    }
}
