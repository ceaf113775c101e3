//! Registry of lookup providers grouped into priority tiers.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    GoogleBooksProvider, HathiTrustProvider, IsbnDbProvider, IsbnLookup,
    LibraryOfCongressProvider, OpenLibraryProvider,
};
use crate::config::Config;
use crate::utils::HttpClient;

bitflags::bitflags! {
    /// Capabilities that a provider can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProviderCapabilities: u32 {
        const LOOKUP = 1 << 0;
        const SEARCH = 1 << 1;
        const EDITIONS = 1 << 2;
    }
}

/// Highest-priority tier
pub const MIN_TIER: u8 = 1;

/// Lowest-priority tier
pub const MAX_TIER: u8 = 4;

/// Static description of a registered provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    /// 1 is tried first, 4 last
    pub priority_tier: u8,
}

/// A provider together with its descriptor
#[derive(Debug, Clone)]
pub struct RegisteredProvider {
    pub descriptor: ProviderDescriptor,
    pub provider: Arc<dyn IsbnLookup>,
}

/// Registry of cascade providers
///
/// Providers keep their registration order; that order decides merge
/// precedence inside a tier.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in providers enabled by `config`
    pub fn from_config(config: &Config, http: &HttpClient) -> Self {
        let mut registry = Self::new();
        let keys = &config.api_keys;

        let mut add = |tier: u8, provider: Arc<dyn IsbnLookup>| {
            if config.providers.is_enabled(provider.id()) {
                registry.register(tier, provider);
            } else {
                tracing::debug!("Provider '{}' disabled by configuration", provider.id());
            }
        };

        add(1, Arc::new(OpenLibraryProvider::new(http.clone())));
        add(
            1,
            Arc::new(GoogleBooksProvider::new(http.clone(), keys.google_books.clone())),
        );
        add(2, Arc::new(IsbnDbProvider::new(http.clone(), keys.isbndb.clone())));
        add(3, Arc::new(LibraryOfCongressProvider::new(http.clone())));
        add(4, Arc::new(HathiTrustProvider::new(http.clone())));

        registry
    }

    /// Register a provider in `tier` (clamped to 1..=4)
    pub fn register(&mut self, tier: u8, provider: Arc<dyn IsbnLookup>) {
        let descriptor = ProviderDescriptor {
            id: provider.id().to_string(),
            name: provider.name().to_string(),
            priority_tier: tier.clamp(MIN_TIER, MAX_TIER),
        };
        self.providers.retain(|p| p.descriptor.id != descriptor.id);
        self.providers.push(RegisteredProvider {
            descriptor,
            provider,
        });
    }

    /// Get a provider by ID
    pub fn get(&self, id: &str) -> Option<&RegisteredProvider> {
        self.providers.iter().find(|p| p.descriptor.id == id)
    }

    /// All providers in registration order
    pub fn all(&self) -> impl Iterator<Item = &RegisteredProvider> {
        self.providers.iter()
    }

    /// Get all provider IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.descriptor.id.as_str())
    }

    /// Providers in one tier, in registration order
    pub fn tier(&self, tier: u8) -> Vec<&RegisteredProvider> {
        self.providers
            .iter()
            .filter(|p| p.descriptor.priority_tier == tier)
            .collect()
    }

    /// Non-empty tiers in ascending order
    pub fn tiers(&self) -> Vec<(u8, Vec<&RegisteredProvider>)> {
        let mut tiers: BTreeMap<u8, Vec<&RegisteredProvider>> = BTreeMap::new();
        for provider in &self.providers {
            tiers
                .entry(provider.descriptor.priority_tier)
                .or_default()
                .push(provider);
        }
        tiers.into_iter().collect()
    }

    /// Check if a provider exists
    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
