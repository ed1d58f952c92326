//! Web search seam used by research rounds.
//!
//! A searcher turns a keyword into an ordered list of hits. Providers
//! without credentials return no hits rather than an error, so a research
//! run degrades to "nothing new found" instead of failing.

use async_trait::async_trait;
use openai_client::SecretString;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;

/// One search result as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,

    /// Publisher name or host
    pub source: String,

    /// Provider's date text, e.g. "2 days ago" or "Sep 3, 2025"
    pub date: Option<String>,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for a keyword. Order is the provider's ranking.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Mock web searcher for testing.
#[derive(Default)]
pub struct MockWebSearcher {
    results: RwLock<HashMap<String, Vec<SearchHit>>>,
    queries: RwLock<Vec<String>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for a query.
    pub fn with_results(self, query: &str, results: Vec<SearchHit>) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// Add bare URLs as results.
    pub fn with_urls(self, query: &str, urls: &[&str]) -> Self {
        let results = urls.iter().map(|u| SearchHit::new(*u)).collect();
        self.with_results(query, results)
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.queries.write().unwrap().push(query.to_string());
        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

/// SerpAPI-backed web searcher (Google engine).
pub struct SerpApiSearcher {
    api_key: Option<SecretString>,
    client: reqwest::Client,
    base_url: String,
    /// Number of organic results requested.
    pub num_results: usize,
}

impl SerpApiSearcher {
    /// Create a searcher; `None` or a blank key disables searching.
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            client: reqwest::Client::new(),
            base_url: "https://serpapi.com/search.json".to_string(),
            num_results: 10,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl WebSearcher for SerpApiSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let Some(api_key) = &self.api_key else {
            warn!(query = %query, "search API key not configured, skipping web search");
            return Ok(Vec::new());
        };

        let num = self.num_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", api_key.expose()),
            ])
            .timeout(Duration::from_secs(30))
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(query = %query, status = %r.status(), "search provider returned an error");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(query = %query, error = %e, "search request failed");
                return Ok(Vec::new());
            }
        };

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(query = %query, error = %e, "search response was not JSON");
                return Ok(Vec::new());
            }
        };

        let hits = parse_serpapi_results(&body);
        debug!(query = %query, hits = hits.len(), "web search complete");
        Ok(hits)
    }
}

/// Map a SerpAPI response body to hits, skipping entries without a usable URL.
pub fn parse_serpapi_results(body: &serde_json::Value) -> Vec<SearchHit> {
    #[derive(serde::Deserialize)]
    struct OrganicResult {
        title: Option<String>,
        link: Option<String>,
        redirect_link: Option<String>,
        snippet: Option<String>,
        source: Option<String>,
        date: Option<String>,
    }

    let Some(results) = body.get("organic_results").and_then(|r| r.as_array()) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|raw| serde_json::from_value::<OrganicResult>(raw.clone()).ok())
        .filter_map(|r| {
            let url = r
                .link
                .filter(|l| l.starts_with("http"))
                .or_else(|| r.redirect_link.as_deref().map(unwrap_redirect))?;
            let source = r
                .source
                .filter(|s| !s.trim().is_empty())
                .or_else(|| Url::parse(&url).ok()?.host_str().map(str::to_string))
                .unwrap_or_default();

            let mut hit = SearchHit::new(url)
                .with_title(r.title.unwrap_or_default())
                .with_snippet(r.snippet.unwrap_or_default())
                .with_source(source);
            if let Some(date) = r.date.filter(|d| !d.trim().is_empty()) {
                hit = hit.with_date(date);
            }
            Some(hit)
        })
        .collect()
}

/// Resolve a Google redirect (`/url?url=...`) to its target.
fn unwrap_redirect(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "url" || k == "q")
                .map(|(_, v)| v.into_owned())
        })
        .filter(|target| target.starts_with("http"))
        .unwrap_or_else(|| link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_web_searcher() {
        let searcher = MockWebSearcher::new().with_urls(
            "chip export",
            &["https://news.example.com/a", "https://news.example.com/b"],
        );

        let results = searcher.search("chip export").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://news.example.com/a");
        assert!(searcher.search("unknown").await.unwrap().is_empty());
        assert_eq!(searcher.queries(), vec!["chip export", "unknown"]);
    }

    #[tokio::test]
    async fn missing_key_yields_empty_results() {
        let searcher = SerpApiSearcher::new(None);
        assert!(!searcher.is_configured());
        assert!(searcher.search("anything").await.unwrap().is_empty());

        let blank = SerpApiSearcher::new(Some(SecretString::new("   ")));
        assert!(!blank.is_configured());
    }

    #[test]
    fn parses_organic_results() {
        let body = serde_json::json!({
            "organic_results": [
                {
                    "title": "Chipmaker unveils new GPU",
                    "link": "https://tech.example.com/gpu",
                    "snippet": "Latest launch ...",
                    "source": "Tech Daily",
                    "date": "Sep 3, 2025"
                },
                {
                    "title": "Redirected story",
                    "redirect_link": "https://www.google.com/url?sa=t&url=https%3A%2F%2Fnews.example.org%2Fstory%3Fid%3D7",
                    "snippet": "..."
                },
                { "title": "no link at all" }
            ]
        });

        let hits = parse_serpapi_results(&body);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "Tech Daily");
        assert_eq!(hits[0].date.as_deref(), Some("Sep 3, 2025"));
        assert_eq!(hits[1].url, "https://news.example.org/story?id=7");
        assert_eq!(hits[1].source, "news.example.org");
        assert!(hits[1].date.is_none());
    }

    #[test]
    fn missing_organic_results_is_empty() {
        let body = serde_json::json!({"error": "Invalid API key"});
        assert!(parse_serpapi_results(&body).is_empty());
    }
}
