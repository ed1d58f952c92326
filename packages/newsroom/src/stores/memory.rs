//! In-memory storage for tests and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::newest_published_first;
use crate::error::Result;
use crate::traits::{RecordStore, ReportStore, SourceStore, TaskLogStore};
use crate::types::{CrawlRecord, RecordStatus, ReportConfig, ReportRecord, SourceConfig, TaskLog};

/// In-memory storage for every table.
///
/// Data is lost on drop.
pub struct MemoryStore {
    sources: RwLock<HashMap<Uuid, SourceConfig>>,
    records: RwLock<Vec<CrawlRecord>>,
    reports: RwLock<HashMap<Uuid, ReportConfig>>,
    report_records: RwLock<Vec<ReportRecord>>,
    logs: RwLock<Vec<TaskLog>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            records: RwLock::new(Vec::new()),
            reports: RwLock::new(HashMap::new()),
            report_records: RwLock::new(Vec::new()),
            logs: RwLock::new(Vec::new()),
        }
    }

    /// Number of crawl records, any status.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Snapshot of every crawl record in insertion order.
    pub fn all_records(&self) -> Vec<CrawlRecord> {
        self.records.read().unwrap().clone()
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn list_sources(&self, active_only: bool) -> Result<Vec<SourceConfig>> {
        let mut sources: Vec<SourceConfig> = self
            .sources
            .read()
            .unwrap()
            .values()
            .filter(|s| !active_only || s.active)
            .cloned()
            .collect();
        sources.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(sources)
    }

    async fn get_source(&self, id: Uuid) -> Result<Option<SourceConfig>> {
        Ok(self.sources.read().unwrap().get(&id).cloned())
    }

    async fn find_source_by_name(&self, name: &str) -> Result<Option<SourceConfig>> {
        Ok(self
            .sources
            .read()
            .unwrap()
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn insert_source(&self, source: &SourceConfig) -> Result<()> {
        self.sources
            .write()
            .unwrap()
            .insert(source.id, source.clone());
        Ok(())
    }

    async fn mark_source_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(source) = self.sources.write().unwrap().get_mut(&id) {
            source.last_run_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn record_exists(&self, url: &str, status: RecordStatus) -> Result<bool> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .any(|r| r.url == url && r.status == status))
    }

    async fn insert_record(&self, record: &CrawlRecord) -> Result<()> {
        self.records.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn recent_successes(
        &self,
        source_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CrawlRecord>> {
        let mut matching: Vec<CrawlRecord> = self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.source_id == Some(source_id) && r.is_success() && r.crawled_at >= since)
            .cloned()
            .collect();
        matching.sort_by(newest_published_first);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn records_for_source(&self, source_id: Uuid) -> Result<Vec<CrawlRecord>> {
        let mut matching: Vec<CrawlRecord> = self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.source_id == Some(source_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.crawled_at.cmp(&a.crawled_at));
        Ok(matching)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn list_reports(&self, active_only: bool) -> Result<Vec<ReportConfig>> {
        let mut reports: Vec<ReportConfig> = self
            .reports
            .read()
            .unwrap()
            .values()
            .filter(|r| !active_only || r.active)
            .cloned()
            .collect();
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(reports)
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportConfig>> {
        Ok(self.reports.read().unwrap().get(&id).cloned())
    }

    async fn insert_report(&self, report: &ReportConfig) -> Result<()> {
        self.reports
            .write()
            .unwrap()
            .insert(report.id, report.clone());
        Ok(())
    }

    async fn mark_report_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(report) = self.reports.write().unwrap().get_mut(&id) {
            report.last_run_at = Some(at);
        }
        Ok(())
    }

    async fn insert_report_record(&self, record: &ReportRecord) -> Result<()> {
        self.report_records.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn report_history(&self, report_id: Uuid, limit: usize) -> Result<Vec<ReportRecord>> {
        let mut history: Vec<ReportRecord> = self
            .report_records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.report_id == report_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        history.truncate(limit);
        Ok(history)
    }
}

#[async_trait]
impl TaskLogStore for MemoryStore {
    async fn append_log(&self, log: &TaskLog) -> Result<()> {
        self.logs.write().unwrap().push(log.clone());
        Ok(())
    }

    async fn logs_for_task(&self, task_id: Uuid) -> Result<Vec<TaskLog>> {
        Ok(self
            .logs
            .read()
            .unwrap()
            .iter()
            .filter(|l| l.task_id == task_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractedArticle;
    use chrono::{Duration, NaiveDate};

    fn record(source: Uuid, url: &str, day: Option<u32>) -> CrawlRecord {
        let published = day.map(|d| {
            NaiveDate::from_ymd_opt(2025, 9, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        });
        CrawlRecord::success(Some(source), &ExtractedArticle::new(url, url, "body"), published)
    }

    #[tokio::test]
    async fn recent_successes_orders_by_publish_date_with_undated_last() {
        let store = MemoryStore::new();
        let source = Uuid::new_v4();

        store.insert_record(&record(source, "u-none", None)).await.unwrap();
        store.insert_record(&record(source, "u-10", Some(10))).await.unwrap();
        store.insert_record(&record(source, "u-12", Some(12))).await.unwrap();
        store
            .insert_record(&CrawlRecord::failed(Some(source), "u-bad", "timeout"))
            .await
            .unwrap();
        store
            .insert_record(&record(Uuid::new_v4(), "other", Some(13)))
            .await
            .unwrap();

        let since = Utc::now() - Duration::hours(1);
        let recent = store.recent_successes(source, since, 10).await.unwrap();
        let urls: Vec<&str> = recent.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["u-12", "u-10", "u-none"]);

        let capped = store.recent_successes(source, since, 1).await.unwrap();
        assert_eq!(capped.len(), 1);

        let future = store
            .recent_successes(source, Utc::now() + Duration::hours(1), 10)
            .await
            .unwrap();
        assert!(future.is_empty());
    }

    #[tokio::test]
    async fn record_exists_distinguishes_status() {
        let store = MemoryStore::new();
        store
            .insert_record(&CrawlRecord::failed(None, "https://a.example.com/1", "boom"))
            .await
            .unwrap();

        assert!(store
            .record_exists("https://a.example.com/1", RecordStatus::Failed)
            .await
            .unwrap());
        assert!(!store
            .record_exists("https://a.example.com/1", RecordStatus::Success)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn mark_source_run_sets_timestamp() {
        let store = MemoryStore::new();
        let source = SourceConfig::new("36kr", "https://36kr.com/", r"(https://36kr\.com/p/\d+)");
        store.insert_source(&source).await.unwrap();

        let at = Utc::now();
        store.mark_source_run(source.id, at).await.unwrap();

        let loaded = store.get_source(source.id).await.unwrap().unwrap();
        assert_eq!(loaded.last_run_at, Some(at));
        assert!(store.find_source_by_name("36kr").await.unwrap().is_some());
    }
}
