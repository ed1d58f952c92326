//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use newsroom::testing::MockExtractor;
use newsroom::{CrawlRecord, ExtractedArticle, MemoryStore, SourceConfig, Store};

pub const LISTING_URL: &str = "https://news.example.com/tech/";
pub const ARTICLE_PATTERN: &str = r"(https://news\.example\.com/a/\d+\.html)";

pub fn article_url(n: usize) -> String {
    format!("https://news.example.com/a/{n}.html")
}

/// A listing page linking to articles `1..=count`, with some noise.
pub fn listing_text(count: usize) -> String {
    let mut text = String::from("# Tech\n\n[Home](https://news.example.com/)\n");
    for n in 1..=count {
        text.push_str(&format!("- [Story {n}]({})\n", article_url(n)));
    }
    text.push_str("[About](https://news.example.com/about.html)\n");
    text
}

pub fn article(n: usize, title: &str) -> ExtractedArticle {
    ExtractedArticle::new(
        article_url(n),
        title,
        format!("{title}. Body text for story {n} about artificial intelligence."),
    )
    .with_date_text("2024-05-01 10:00")
}

pub fn store() -> (Arc<MemoryStore>, Arc<dyn Store>) {
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn Store> = memory.clone();
    (memory, store)
}

pub async fn seeded_source(store: &dyn Store) -> SourceConfig {
    let source = SourceConfig::new("Example Tech", LISTING_URL, ARTICLE_PATTERN);
    store.insert_source(&source).await.unwrap();
    source
}

/// Store a success record for article `n` of `source`.
pub async fn prestore(store: &dyn Store, source: &SourceConfig, n: usize, title: &str) {
    let record = CrawlRecord::success(Some(source.id), &article(n, title), None);
    store.insert_record(&record).await.unwrap();
}

pub fn extractor() -> Arc<MockExtractor> {
    Arc::new(MockExtractor::new())
}
