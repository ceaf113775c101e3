//! Core data models for book records and search operations.

mod book;
mod search;

pub use book::{BookField, BookRecord, BookRecordBuilder, FieldPair, FieldSlot};
pub(crate) use book::{non_empty, non_empty_list};
pub use search::{Candidate, ParsedQuery, SearchHints, SearchRequest};
