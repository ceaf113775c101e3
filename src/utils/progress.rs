//! Progress reporting for long-running resolutions.
//!
//! Resolvers report `(current, total, status)` triples to an optional
//! [`ProgressSink`]. Any `Fn(usize, usize, &str)` closure is a sink.
//!
//! # Usage
//!
//! ```ignore
//! use book_resolver::utils::ProgressSink;
//!
//! let sink = |current: usize, total: usize, status: &str| {
//!     eprintln!("[{}/{}] {}", current, total, status);
//! };
//! sink.report(1, 4, "searching");
//! ```

/// Stage names reported by multi-result searches
pub mod stage {
    pub const SEARCHING: &str = "searching";
    pub const ENRICHING: &str = "enriching";
    pub const FETCHING_EDITIONS: &str = "fetching editions";
    pub const DONE: &str = "done";
}

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    fn report(&self, current: usize, total: usize, status: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn report(&self, current: usize, total: usize, status: &str) {
        self(current, total, status)
    }
}

/// Report to `sink` if there is one
pub(crate) fn report(sink: Option<&dyn ProgressSink>, current: usize, total: usize, status: &str) {
    if let Some(sink) = sink {
        sink.report(current, total, status);
    }
}
