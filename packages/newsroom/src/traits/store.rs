//! Storage traits for sources, crawl records, reports, and task logs.
//!
//! The storage layer is split into focused traits:
//! - `SourceStore`: crawl source configuration
//! - `RecordStore`: one row per attempted URL
//! - `ReportStore`: report configuration and generated reports
//! - `TaskLogStore`: audit trail
//! - `Store`: composite trait combining all four

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    CrawlRecord, RecordStatus, ReportConfig, ReportRecord, SourceConfig, TaskLog,
};

#[async_trait]
pub trait SourceStore: Send + Sync {
    /// List sources, optionally only the active ones.
    async fn list_sources(&self, active_only: bool) -> Result<Vec<SourceConfig>>;

    async fn get_source(&self, id: Uuid) -> Result<Option<SourceConfig>>;

    async fn find_source_by_name(&self, name: &str) -> Result<Option<SourceConfig>>;

    async fn insert_source(&self, source: &SourceConfig) -> Result<()>;

    /// Record that a run of this source was attempted at `at`.
    async fn mark_source_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether any record with this url and status exists.
    async fn record_exists(&self, url: &str, status: RecordStatus) -> Result<bool>;

    async fn insert_record(&self, record: &CrawlRecord) -> Result<()>;

    /// Success records of one source ingested at or after `since`.
    ///
    /// Ordered by publish date descending with missing dates last, then by
    /// ingestion time descending.
    async fn recent_successes(
        &self,
        source_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CrawlRecord>>;

    /// All records of one source, newest first.
    async fn records_for_source(&self, source_id: Uuid) -> Result<Vec<CrawlRecord>>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn list_reports(&self, active_only: bool) -> Result<Vec<ReportConfig>>;

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportConfig>>;

    async fn insert_report(&self, report: &ReportConfig) -> Result<()>;

    async fn mark_report_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn insert_report_record(&self, record: &ReportRecord) -> Result<()>;

    /// Generated reports for one config, newest first.
    async fn report_history(&self, report_id: Uuid, limit: usize) -> Result<Vec<ReportRecord>>;
}

#[async_trait]
pub trait TaskLogStore: Send + Sync {
    async fn append_log(&self, log: &TaskLog) -> Result<()>;

    async fn logs_for_task(&self, task_id: Uuid) -> Result<Vec<TaskLog>>;
}

/// Composite store trait.
pub trait Store: SourceStore + RecordStore + ReportStore + TaskLogStore {}

// Blanket implementation: anything implementing all four traits is a Store
impl<T: SourceStore + RecordStore + ReportStore + TaskLogStore> Store for T {}
