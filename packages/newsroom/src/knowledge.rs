//! Knowledge-base assembly for a report run.
//!
//! Articles come from two places: the report's own sources, and the
//! research bucket that keeps what earlier runs found through search. Each
//! sub-fetch has its own deadline and a slow or broken source contributes
//! nothing instead of failing the build.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{NewsroomError, Result};
use crate::traits::Store;
use crate::types::{KnowledgeArticle, ReportConfig, SourceConfig, RESEARCH_SOURCE_NAME};

/// Provenance label for articles recycled from earlier research runs.
pub const RESEARCH_PROVENANCE: &str = "research history";

/// Limits and deadlines for one build.
#[derive(Debug, Clone)]
pub struct KnowledgePolicy {
    pub per_source_limit: usize,
    pub research_limit: usize,
    pub source_timeout: Duration,
    pub overall_timeout: Duration,
}

impl Default for KnowledgePolicy {
    fn default() -> Self {
        Self {
            per_source_limit: 10,
            research_limit: 20,
            source_timeout: Duration::from_secs(5),
            overall_timeout: Duration::from_secs(30),
        }
    }
}

/// Look up the research bucket, creating it on first use.
pub async fn ensure_research_source(store: &dyn Store) -> Result<SourceConfig> {
    if let Some(existing) = store.find_source_by_name(RESEARCH_SOURCE_NAME).await? {
        return Ok(existing);
    }

    let bucket = SourceConfig::research_bucket();
    store.insert_source(&bucket).await?;
    info!(source_id = %bucket.id, "Created research source");
    Ok(bucket)
}

pub fn crawler_provenance(source_name: &str) -> String {
    format!("crawler: {source_name}")
}

pub struct KnowledgeBuilder {
    store: Arc<dyn Store>,
    policy: KnowledgePolicy,
}

impl KnowledgeBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            policy: KnowledgePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: KnowledgePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Assemble the knowledge base for `report` as of now.
    pub async fn build(&self, report: &ReportConfig) -> Vec<KnowledgeArticle> {
        self.build_at(report, Utc::now()).await
    }

    pub async fn build_at(&self, report: &ReportConfig, now: DateTime<Utc>) -> Vec<KnowledgeArticle> {
        let since = report.time_range.cutoff(now);
        let mut gathered = Vec::new();

        let gather = self.gather(report, since, &mut gathered);
        if tokio::time::timeout(self.policy.overall_timeout, gather)
            .await
            .is_err()
        {
            warn!(
                report = %report.name,
                collected = gathered.len(),
                "Knowledge base build hit its deadline, keeping partial results"
            );
        }

        let mut seen = IndexSet::new();
        let articles: Vec<KnowledgeArticle> = gathered
            .into_iter()
            .filter(|a| a.matches_any(&report.keywords))
            .filter(|a| seen.insert(a.url.clone()))
            .collect();

        info!(
            report = %report.name,
            range = %report.time_range,
            articles = articles.len(),
            "Knowledge base built"
        );
        articles
    }

    async fn gather(&self, report: &ReportConfig, since: DateTime<Utc>, out: &mut Vec<KnowledgeArticle>) {
        for source_id in &report.source_ids {
            let fetch = self.from_source(*source_id, since);
            match tokio::time::timeout(self.policy.source_timeout, fetch).await {
                Ok(Ok(articles)) => {
                    debug!(source_id = %source_id, count = articles.len(), "Loaded source articles");
                    out.extend(articles);
                }
                Ok(Err(e)) => warn!(source_id = %source_id, error = %e, "Skipping source"),
                Err(_) => warn!(source_id = %source_id, "Source query timed out, skipping"),
            }
        }

        match tokio::time::timeout(self.policy.source_timeout, self.from_research(since)).await {
            Ok(Ok(articles)) => {
                debug!(count = articles.len(), "Loaded research history");
                out.extend(articles);
            }
            Ok(Err(e)) => warn!(error = %e, "Skipping research history"),
            Err(_) => warn!("Research history query timed out, skipping"),
        }
    }

    async fn from_source(&self, source_id: Uuid, since: DateTime<Utc>) -> Result<Vec<KnowledgeArticle>> {
        let source = self
            .store
            .get_source(source_id)
            .await?
            .ok_or_else(|| NewsroomError::not_found("source", source_id))?;

        // Pulled separately under its own limit
        if source.is_research_bucket() {
            return Ok(Vec::new());
        }

        let provenance = crawler_provenance(&source.name);
        let records = self
            .store
            .recent_successes(source.id, since, self.policy.per_source_limit)
            .await?;

        Ok(records
            .iter()
            .map(|r| KnowledgeArticle::from_record(r, provenance.clone()))
            .collect())
    }

    async fn from_research(&self, since: DateTime<Utc>) -> Result<Vec<KnowledgeArticle>> {
        let Some(bucket) = self.store.find_source_by_name(RESEARCH_SOURCE_NAME).await? else {
            return Ok(Vec::new());
        };

        let records = self
            .store
            .recent_successes(bucket.id, since, self.policy.research_limit)
            .await?;

        Ok(records
            .iter()
            .map(|r| KnowledgeArticle::from_record(r, RESEARCH_PROVENANCE))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::traits::{RecordStore, SourceStore};
    use crate::types::{CrawlRecord, ExtractedArticle};

    async fn seed(store: &MemoryStore, source: &SourceConfig, titles: &[&str]) {
        store.insert_source(source).await.unwrap();
        for (i, title) in titles.iter().enumerate() {
            let url = format!("{}item/{}", source.listing_url, i);
            let article = ExtractedArticle::new(url, *title, format!("{title} body"));
            store
                .insert_record(&CrawlRecord::success(Some(source.id), &article, None))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn combines_sources_and_research_history() {
        let store = Arc::new(MemoryStore::new());
        let tech = SourceConfig::new("tech", "https://tech.example.com/", ".*");
        seed(&store, &tech, &["AI chips", "Robotics"]).await;
        let bucket = ensure_research_source(store.as_ref()).await.unwrap();
        seed(&store, &bucket, &["AI pricing"]).await;

        let report = ReportConfig::new("daily", "digest").with_sources([tech.id]);
        let kb = KnowledgeBuilder::new(store).build(&report).await;

        assert_eq!(kb.len(), 3);
        assert_eq!(kb.iter().filter(|a| a.provenance == "crawler: tech").count(), 2);
        assert_eq!(kb.iter().filter(|a| a.provenance == RESEARCH_PROVENANCE).count(), 1);
    }

    #[tokio::test]
    async fn keyword_filter_is_case_insensitive_match_any() {
        let store = Arc::new(MemoryStore::new());
        let tech = SourceConfig::new("tech", "https://tech.example.com/", ".*");
        seed(&store, &tech, &["ai chips", "Robotics", "Cloud"]).await;

        let report = ReportConfig::new("daily", "digest")
            .with_sources([tech.id])
            .with_keywords("AI,robot");
        let kb = KnowledgeBuilder::new(store).build(&report).await;

        let titles: Vec<&str> = kb.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"ai chips"));
        assert!(titles.contains(&"Robotics"));
    }

    #[tokio::test]
    async fn missing_source_contributes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let tech = SourceConfig::new("tech", "https://tech.example.com/", ".*");
        seed(&store, &tech, &["one"]).await;

        let report = ReportConfig::new("daily", "digest").with_sources([Uuid::now_v7(), tech.id]);
        let kb = KnowledgeBuilder::new(store).build(&report).await;
        assert_eq!(kb.len(), 1);
    }

    #[tokio::test]
    async fn per_source_limit_applies() {
        let store = Arc::new(MemoryStore::new());
        let tech = SourceConfig::new("tech", "https://tech.example.com/", ".*");
        seed(&store, &tech, &["a", "b", "c", "d"]).await;

        let policy = KnowledgePolicy {
            per_source_limit: 2,
            ..KnowledgePolicy::default()
        };
        let report = ReportConfig::new("daily", "digest").with_sources([tech.id]);
        let kb = KnowledgeBuilder::new(store).with_policy(policy).build(&report).await;
        assert_eq!(kb.len(), 2);
    }

    #[tokio::test]
    async fn ensure_research_source_is_idempotent() {
        let store = MemoryStore::new();
        let first = ensure_research_source(&store).await.unwrap();
        let second = ensure_research_source(&store).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.active);
        assert_eq!(store.list_sources(false).await.unwrap().len(), 1);
    }
}
