//! Crawl source configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the pseudo-source that stores search-originated articles.
pub const RESEARCH_SOURCE_NAME: &str = "research";

/// Default polling interval for new sources (one hour).
pub const DEFAULT_FREQUENCY_SECONDS: i64 = 3600;

/// A listing page to poll and the pattern that picks article URLs out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: Uuid,
    pub name: String,

    /// Page whose rendered text contains links to articles
    pub listing_url: String,

    /// Regex applied to the listing page's rendered text.
    /// Capture group 1 is the URL when present, otherwise the whole match.
    pub pattern: String,

    /// Polling interval; 0 means never scheduled
    pub frequency_seconds: i64,

    /// Inactive sources are skipped by the scheduler
    pub active: bool,

    /// Set after every run attempt, successful or not
    pub last_run_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl SourceConfig {
    pub fn new(
        name: impl Into<String>,
        listing_url: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            listing_url: listing_url.into(),
            pattern: pattern.into(),
            frequency_seconds: DEFAULT_FREQUENCY_SECONDS,
            active: true,
            last_run_at: None,
            created_at: Utc::now(),
        }
    }

    /// The bucket that holds articles found by research searches.
    ///
    /// Inactive with frequency 0, so it is never polled.
    pub fn research_bucket() -> Self {
        Self::new(
            RESEARCH_SOURCE_NAME,
            "https://news.google.com/search?q=research",
            r"https://[^/]+/.*",
        )
        .with_frequency(0)
        .inactive()
    }

    pub fn with_frequency(mut self, seconds: i64) -> Self {
        self.frequency_seconds = seconds;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_research_bucket(&self) -> bool {
        self.name == RESEARCH_SOURCE_NAME
    }
}
