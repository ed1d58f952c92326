//! Persisted outcome of one attempted URL.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::article::ExtractedArticle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown record status: {}", other)),
        }
    }
}

/// One row per attempted URL.
///
/// No two `Success` records share a url. The store does not enforce this;
/// writers re-check existence right before inserting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub id: Uuid,

    /// Owning source; `None` only for records written without a bucket
    pub source_id: Option<Uuid>,

    pub url: String,
    pub title: String,
    pub body: String,
    pub author: Option<String>,

    /// Wall-clock publish time as printed by the site
    pub published_at: Option<NaiveDateTime>,

    pub crawled_at: DateTime<Utc>,
    pub status: RecordStatus,
    pub error: Option<String>,
}

impl CrawlRecord {
    pub fn success(
        source_id: Option<Uuid>,
        article: &ExtractedArticle,
        published_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            source_id,
            url: article.url.clone(),
            title: article.title.clone(),
            body: article.body.clone(),
            author: article.author.clone().filter(|a| !a.trim().is_empty()),
            published_at,
            crawled_at: Utc::now(),
            status: RecordStatus::Success,
            error: None,
        }
    }

    pub fn failed(source_id: Option<Uuid>, url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            id: Uuid::now_v7(),
            source_id,
            url: url.into(),
            title: String::new(),
            body: String::new(),
            author: None,
            published_at: None,
            crawled_at: Utc::now(),
            status: RecordStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}
