//! # Book Resolver
//!
//! Resolves book metadata from several public catalog services and merges
//! the partial answers into one record.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (BookRecord, SearchRequest, Candidate)
//! - [`query`]: Identifier detection and free-text query parsing
//! - [`merge`]: Field-level merging of partial records
//! - [`sources`]: Provider plugins with a capability-trait architecture
//! - [`resolver`]: Cascade, fast-pair and multi-result resolution engines
//! - [`utils`]: HTTP client, deduplication, progress and table output
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal styling for the command-line front-end

pub mod config;
pub mod merge;
pub mod models;
pub mod query;
pub mod resolver;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{BookRecord, SearchHints};
pub use resolver::BookResolver;
pub use sources::{ProviderRegistry, ProviderError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
