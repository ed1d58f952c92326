//! Typed errors for the newsroom library.
//!
//! Fetch failures are kept separate from everything else: the crawl
//! orchestrator turns them into failed records instead of propagating them.

use thiserror::Error;

/// Errors surfaced by stores, collaborators, and entry points.
#[derive(Debug, Error)]
pub enum NewsroomError {
    /// Page fetch or extraction failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// AI service unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Outbound notification failed
    #[error("notification error: {0}")]
    Notify(String),

    /// A source's extraction pattern does not compile
    #[error("invalid extraction pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Deep report had nothing to research
    #[error("no articles matched the report's sources, time range and keywords")]
    NoMaterial,

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl NewsroomError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string().into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<openai_client::OpenAIError> for NewsroomError {
    fn from(err: openai_client::OpenAIError) -> Self {
        Self::AI(Box::new(err))
    }
}

/// Why a single page could not be turned into an article.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The fetch did not finish within its deadline
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Connection, TLS, or body read failure
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Page loaded but yielded no article text
    #[error("no article content at: {url}")]
    Empty { url: String },

    /// URL could not be parsed or uses an unsupported scheme
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// Classify a reqwest error for the given URL.
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Result type alias for newsroom operations.
pub type Result<T> = std::result::Result<T, NewsroomError>;

/// Result type alias for a single fetch.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_name_the_url() {
        let err = FetchError::Timeout {
            url: "https://news.example.com/a".into(),
        };
        assert_eq!(err.to_string(), "timeout fetching: https://news.example.com/a");

        let wrapped: NewsroomError = err.into();
        assert!(wrapped.to_string().starts_with("fetch failed:"));
    }

    #[test]
    fn not_found_formats_kind_and_id() {
        let err = NewsroomError::not_found("source", 42);
        assert_eq!(err.to_string(), "source not found: 42");
    }
}
