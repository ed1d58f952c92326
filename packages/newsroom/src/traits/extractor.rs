//! Page fetching and article extraction seam.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::ExtractedArticle;

/// Fetches pages and turns them into text.
///
/// Implementations fail fast: no retries happen here. Retry and pacing
/// belong to the caller.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetch a listing page and return its rendered text (markdown).
    async fn render(&self, url: &str) -> FetchResult<String>;

    /// Fetch an article page and extract its fields.
    async fn extract(&self, url: &str) -> FetchResult<ExtractedArticle>;
}
