//! Utility modules supporting resolution operations.
//!
//! - [`HttpClient`]: shared HTTP client with JSON helpers and status mapping
//! - [`CandidateMap`]: identifier-keyed deduplication of search candidates
//! - [`ProgressSink`]: receiver of `(current, total, status)` progress updates
//! - [`records_table`] / [`record_table`]: terminal tables for CLI output
//!
//! # Deduplication
//!
//! ```rust
//! use book_resolver::models::{BookRecordBuilder, Candidate};
//! use book_resolver::utils::CandidateMap;
//!
//! let mut map = CandidateMap::new();
//! let a = BookRecordBuilder::new("google_books").isbn13("9780062316097").build();
//! let b = BookRecordBuilder::new("openlibrary").isbn13("9780062316097").build();
//! map.insert(Candidate::new(a));
//! map.insert(Candidate::new(b));
//! assert_eq!(map.len(), 1);
//! ```

mod dedup;
mod display;
mod http;
mod progress;

pub use dedup::{CandidateMap, Insertion, COMBINED_SOURCE};
pub use display::{
    field_value, is_terminal, record_table, records_table, terminal_width, truncate_with_ellipsis,
};
pub use http::HttpClient;
pub(crate) use progress::report;
pub use progress::{stage, ProgressSink};
