//! Page fetching and article extraction over HTTP.
//!
//! Extraction first tries article markup ([`structured`]); when that yields
//! no body the page is rendered to markdown and rebuilt with the
//! [`cleanup`] pipeline.

pub mod cleanup;
pub mod structured;

use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub use cleanup::{Boundaries, CleanupRule, CleanupRules};
pub use structured::{extract_fields, page_title, StructuredFields};

use crate::error::{FetchError, FetchResult, NewsroomError, Result};
use crate::traits::ContentExtractor;
use crate::types::ExtractedArticle;

/// Deadline for one page fetch, connect through body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Extractor backed by reqwest + scraper + htmd.
///
/// No JavaScript rendering; pages that build their article client-side
/// will come back empty.
pub struct HttpExtractor {
    client: reqwest::Client,
    timeout: Duration,
    rules: CleanupRules,
}

impl HttpExtractor {
    pub fn new() -> Result<Self> {
        Self::with_rules(CleanupRules::news_portal()?)
    }

    pub fn with_rules(rules: CleanupRules) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| NewsroomError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout: FETCH_TIMEOUT,
            rules,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        validate_url(url)?;

        let fetch = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, &e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(url, &e))
        };

        let html = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
            })??;

        debug!(url = %url, bytes = html.len(), "Fetched page");
        Ok(html)
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn render(&self, url: &str) -> FetchResult<String> {
        let html = self.fetch_html(url).await?;
        Ok(html_to_markdown(&html))
    }

    async fn extract(&self, url: &str) -> FetchResult<ExtractedArticle> {
        let html = self.fetch_html(url).await?;
        parse_article(url, &html, &self.rules)
    }
}

/// Turn a fetched page into an article.
pub fn parse_article(url: &str, html: &str, rules: &CleanupRules) -> FetchResult<ExtractedArticle> {
    let (fields, fallback_title) = {
        let document = Html::parse_document(html);
        (extract_fields(&document), page_title(&document))
    };

    let body = if fields.body.is_empty() {
        rules.reconstruct(&html_to_markdown(html))
    } else {
        rules.clean_structured(&fields.body)
    };

    if body.is_empty() {
        return Err(FetchError::Empty {
            url: url.to_string(),
        });
    }

    let title = fields
        .title
        .or(fallback_title)
        .or_else(|| heading_line(&body))
        .unwrap_or_else(|| url.to_string());

    let mut article = ExtractedArticle::new(url, title, body)
        .with_date_text(fields.date_text.unwrap_or_default());
    if let Some(author) = fields.author {
        article = article.with_author(author);
    }
    Ok(article)
}

/// Convert HTML to markdown, falling back to plain text.
pub fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|_| {
        let document = Html::parse_document(html);
        document.root_element().text().collect::<String>()
    })
}

fn heading_line(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
}

fn validate_url(url: &str) -> FetchResult<()> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(FetchError::InvalidUrl {
            url: url.to_string(),
        }),
    }
}
