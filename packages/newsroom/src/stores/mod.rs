//! Storage backends.
//!
//! - `MemoryStore`: in-process, for tests and dry runs
//! - `SqliteStore`: file or in-memory SQLite (requires the `sqlite` feature)

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use std::cmp::Ordering;

use crate::types::CrawlRecord;

/// Knowledge-base ordering: publish date descending with undated records
/// last, then ingestion time descending.
pub(crate) fn newest_published_first(a: &CrawlRecord, b: &CrawlRecord) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.crawled_at.cmp(&a.crawled_at))
}
