//! Article shapes: what the extractor produces and what a research run reads.

use serde::{Deserialize, Serialize};

use super::record::CrawlRecord;

/// Article fields captured from a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub url: String,
    pub title: String,
    pub author: Option<String>,

    /// Date text as it appeared on the page; may be empty
    pub date_text: String,

    pub body: String,
}

impl ExtractedArticle {
    pub fn new(url: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            author: None,
            date_text: String::new(),
            body: body.into(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_date_text(mut self, date_text: impl Into<String>) -> Self {
        self.date_text = date_text.into();
        self
    }
}

/// One entry of a research run's in-memory knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeArticle {
    pub title: String,
    pub url: String,
    pub body: String,

    /// Where the article came from, e.g. `crawler: 36kr` or `search: llm pricing`
    pub provenance: String,

    /// ISO-like publish date, empty when unknown
    pub date: String,

    pub author: Option<String>,
}

impl KnowledgeArticle {
    /// Build from a stored record.
    pub fn from_record(record: &CrawlRecord, provenance: impl Into<String>) -> Self {
        Self {
            title: record.title.clone(),
            url: record.url.clone(),
            body: record.body.clone(),
            provenance: provenance.into(),
            date: record
                .published_at
                .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
                .unwrap_or_default(),
            author: record.author.clone(),
        }
    }

    /// Build from a freshly extracted page found by a search keyword.
    pub fn from_search(article: &ExtractedArticle, keyword: &str) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            body: article.body.clone(),
            provenance: format!("search: {}", keyword),
            date: article.date_text.clone(),
            author: article.author.clone(),
        }
    }

    /// Case-insensitive match-any over title and body.
    pub fn matches_any(&self, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }
        let title = self.title.to_lowercase();
        let body = self.body.to_lowercase();
        keywords.iter().any(|k| {
            let k = k.to_lowercase();
            title.contains(&k) || body.contains(&k)
        })
    }
}
