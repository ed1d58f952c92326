//! SQLite storage.
//!
//! Ids are stored as TEXT, instants as RFC 3339 TEXT with fixed precision so
//! lexical order matches time order. Publish times are naive wall-clock
//! `YYYY-MM-DD HH:MM:SS` TEXT.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{NewsroomError, Result};
use crate::traits::{RecordStore, ReportStore, SourceStore, TaskLogStore};
use crate::types::{
    CrawlRecord, LogLevel, NotifierKind, NotifyTarget, RecordStatus, ReportConfig, ReportRecord,
    ReportStatus, SourceConfig, TaskKind, TaskLog, TimeRange,
};

const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-backed store for every table.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create tables if missing.
    ///
    /// # Example URLs
    /// - `sqlite://newsroom.db?mode=rwc` - file, created if absent
    /// - `sqlite::memory:` - ephemeral
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 5).await
    }

    /// Ephemeral store. A single connection, since every SQLite in-memory
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(NewsroomError::storage)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                listing_url TEXT NOT NULL,
                pattern TEXT NOT NULL,
                frequency_seconds INTEGER NOT NULL,
                active INTEGER NOT NULL,
                last_run_at TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS crawl_records (
                id TEXT PRIMARY KEY,
                source_id TEXT,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                author TEXT,
                published_at TEXT,
                crawled_at TEXT NOT NULL,
                status TEXT NOT NULL,
                error TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_crawl_records_url ON crawl_records(url, status)",
            "CREATE INDEX IF NOT EXISTS idx_crawl_records_source ON crawl_records(source_id, crawled_at)",
            r#"
            CREATE TABLE IF NOT EXISTS report_configs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                source_ids TEXT NOT NULL DEFAULT '[]',
                keywords TEXT NOT NULL DEFAULT '[]',
                time_range TEXT NOT NULL,
                purpose TEXT NOT NULL,
                focus TEXT NOT NULL,
                deep_research INTEGER NOT NULL,
                notifier_kind TEXT,
                notifier_destination TEXT,
                active INTEGER NOT NULL,
                last_run_at TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS report_records (
                id TEXT PRIMARY KEY,
                report_id TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                summary TEXT NOT NULL,
                status TEXT NOT NULL,
                notification_sent INTEGER NOT NULL,
                error TEXT,
                generated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_report_records_report ON report_records(report_id, generated_at)",
            r#"
            CREATE TABLE IF NOT EXISTS task_logs (
                id TEXT PRIMARY KEY,
                task_type TEXT NOT NULL,
                task_id TEXT NOT NULL,
                level TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_task_logs_task ON task_logs(task_id, created_at)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(NewsroomError::storage)?;
        }
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn instant(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(NewsroomError::storage)
}

fn parse_optional_instant(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_instant).transpose()
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(NewsroomError::storage)
}

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct SourceRow {
    id: String,
    name: String,
    listing_url: String,
    pattern: String,
    frequency_seconds: i64,
    active: bool,
    last_run_at: Option<String>,
    created_at: String,
}

impl SourceRow {
    fn into_source(self) -> Result<SourceConfig> {
        Ok(SourceConfig {
            id: parse_uuid(&self.id)?,
            name: self.name,
            listing_url: self.listing_url,
            pattern: self.pattern,
            frequency_seconds: self.frequency_seconds,
            active: self.active,
            last_run_at: parse_optional_instant(self.last_run_at)?,
            created_at: parse_instant(&self.created_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: String,
    source_id: Option<String>,
    url: String,
    title: String,
    body: String,
    author: Option<String>,
    published_at: Option<String>,
    crawled_at: String,
    status: String,
    error: Option<String>,
}

impl RecordRow {
    fn into_record(self) -> Result<CrawlRecord> {
        let published_at = self
            .published_at
            .as_deref()
            .map(|raw| NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT))
            .transpose()
            .map_err(NewsroomError::storage)?;

        Ok(CrawlRecord {
            id: parse_uuid(&self.id)?,
            source_id: self.source_id.as_deref().map(parse_uuid).transpose()?,
            url: self.url,
            title: self.title,
            body: self.body,
            author: self.author,
            published_at,
            crawled_at: parse_instant(&self.crawled_at)?,
            status: self.status.parse().map_err(NewsroomError::storage)?,
            error: self.error,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReportRow {
    id: String,
    name: String,
    source_ids: String,
    keywords: String,
    time_range: String,
    purpose: String,
    focus: String,
    deep_research: bool,
    notifier_kind: Option<String>,
    notifier_destination: Option<String>,
    active: bool,
    last_run_at: Option<String>,
    created_at: String,
}

impl ReportRow {
    fn into_report(self) -> Result<ReportConfig> {
        let source_ids: Vec<Uuid> =
            serde_json::from_str(&self.source_ids).map_err(NewsroomError::storage)?;
        let keywords: Vec<String> =
            serde_json::from_str(&self.keywords).map_err(NewsroomError::storage)?;

        let notify = match (self.notifier_kind, self.notifier_destination) {
            (Some(kind), Some(destination)) if !destination.trim().is_empty() => Some(NotifyTarget {
                kind: kind.parse::<NotifierKind>().map_err(NewsroomError::storage)?,
                destination,
            }),
            _ => None,
        };

        Ok(ReportConfig {
            id: parse_uuid(&self.id)?,
            name: self.name,
            source_ids,
            keywords,
            time_range: TimeRange::parse_or_default(&self.time_range),
            purpose: self.purpose,
            focus: self.focus,
            deep_research: self.deep_research,
            notify,
            active: self.active,
            last_run_at: parse_optional_instant(self.last_run_at)?,
            created_at: parse_instant(&self.created_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReportRecordRow {
    id: String,
    report_id: String,
    title: String,
    content: String,
    summary: String,
    status: String,
    notification_sent: bool,
    error: Option<String>,
    generated_at: String,
}

impl ReportRecordRow {
    fn into_record(self) -> Result<ReportRecord> {
        Ok(ReportRecord {
            id: parse_uuid(&self.id)?,
            report_id: parse_uuid(&self.report_id)?,
            title: self.title,
            content: self.content,
            summary: self.summary,
            status: ReportStatus::parse(&self.status).ok_or_else(|| {
                NewsroomError::storage(format!("unknown report status: {}", self.status))
            })?,
            notification_sent: self.notification_sent,
            error: self.error,
            generated_at: parse_instant(&self.generated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct TaskLogRow {
    id: String,
    task_type: String,
    task_id: String,
    level: String,
    message: String,
    created_at: String,
}

impl TaskLogRow {
    fn into_log(self) -> Result<TaskLog> {
        Ok(TaskLog {
            id: parse_uuid(&self.id)?,
            task_type: TaskKind::parse(&self.task_type).ok_or_else(|| {
                NewsroomError::storage(format!("unknown task type: {}", self.task_type))
            })?,
            task_id: parse_uuid(&self.task_id)?,
            level: LogLevel::parse(&self.level).ok_or_else(|| {
                NewsroomError::storage(format!("unknown log level: {}", self.level))
            })?,
            message: self.message,
            created_at: parse_instant(&self.created_at)?,
        })
    }
}

const SOURCE_COLUMNS: &str =
    "id, name, listing_url, pattern, frequency_seconds, active, last_run_at, created_at";
const RECORD_COLUMNS: &str =
    "id, source_id, url, title, body, author, published_at, crawled_at, status, error";
const REPORT_COLUMNS: &str = "id, name, source_ids, keywords, time_range, purpose, focus, deep_research, notifier_kind, notifier_destination, active, last_run_at, created_at";
const REPORT_RECORD_COLUMNS: &str =
    "id, report_id, title, content, summary, status, notification_sent, error, generated_at";

#[async_trait]
impl SourceStore for SqliteStore {
    async fn list_sources(&self, active_only: bool) -> Result<Vec<SourceConfig>> {
        let sql = if active_only {
            format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE active = 1 ORDER BY created_at, name")
        } else {
            format!("SELECT {SOURCE_COLUMNS} FROM sources ORDER BY created_at, name")
        };

        let rows = sqlx::query_as::<_, SourceRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(NewsroomError::storage)?;

        rows.into_iter().map(SourceRow::into_source).collect()
    }

    async fn get_source(&self, id: Uuid) -> Result<Option<SourceConfig>> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        row.map(SourceRow::into_source).transpose()
    }

    async fn find_source_by_name(&self, name: &str) -> Result<Option<SourceConfig>> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE name = ? ORDER BY created_at LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        row.map(SourceRow::into_source).transpose()
    }

    async fn insert_source(&self, source: &SourceConfig) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sources (id, name, listing_url, pattern, frequency_seconds, active, last_run_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                listing_url = excluded.listing_url,
                pattern = excluded.pattern,
                frequency_seconds = excluded.frequency_seconds,
                active = excluded.active,
                last_run_at = excluded.last_run_at
            "#,
        )
        .bind(source.id.to_string())
        .bind(&source.name)
        .bind(&source.listing_url)
        .bind(&source.pattern)
        .bind(source.frequency_seconds)
        .bind(source.active)
        .bind(source.last_run_at.as_ref().map(instant))
        .bind(instant(&source.created_at))
        .execute(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        Ok(())
    }

    async fn mark_source_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE sources SET last_run_at = ? WHERE id = ?")
            .bind(instant(&at))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(NewsroomError::storage)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn record_exists(&self, url: &str, status: RecordStatus) -> Result<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM crawl_records WHERE url = ? AND status = ? LIMIT 1")
                .bind(url)
                .bind(status.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(NewsroomError::storage)?;

        Ok(found.is_some())
    }

    async fn insert_record(&self, record: &CrawlRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO crawl_records (id, source_id, url, title, body, author, published_at, crawled_at, status, error)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.source_id.map(|id| id.to_string()))
        .bind(&record.url)
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.author)
        .bind(record.published_at.map(|p| p.format(NAIVE_FORMAT).to_string()))
        .bind(instant(&record.crawled_at))
        .bind(record.status.as_str())
        .bind(&record.error)
        .execute(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        Ok(())
    }

    async fn recent_successes(
        &self,
        source_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CrawlRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM crawl_records
            WHERE source_id = ? AND status = ? AND crawled_at >= ?
            ORDER BY published_at IS NULL, published_at DESC, crawled_at DESC
            LIMIT ?
            "#
        ))
        .bind(source_id.to_string())
        .bind(RecordStatus::Success.as_str())
        .bind(instant(&since))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    async fn records_for_source(&self, source_id: Uuid) -> Result<Vec<CrawlRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM crawl_records WHERE source_id = ? ORDER BY crawled_at DESC"
        ))
        .bind(source_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }
}

#[async_trait]
impl ReportStore for SqliteStore {
    async fn list_reports(&self, active_only: bool) -> Result<Vec<ReportConfig>> {
        let sql = if active_only {
            format!("SELECT {REPORT_COLUMNS} FROM report_configs WHERE active = 1 ORDER BY created_at, name")
        } else {
            format!("SELECT {REPORT_COLUMNS} FROM report_configs ORDER BY created_at, name")
        };

        let rows = sqlx::query_as::<_, ReportRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(NewsroomError::storage)?;

        rows.into_iter().map(ReportRow::into_report).collect()
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportConfig>> {
        let row = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {REPORT_COLUMNS} FROM report_configs WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        row.map(ReportRow::into_report).transpose()
    }

    async fn insert_report(&self, report: &ReportConfig) -> Result<()> {
        let source_ids = serde_json::to_string(&report.source_ids).map_err(NewsroomError::storage)?;
        let keywords = serde_json::to_string(&report.keywords).map_err(NewsroomError::storage)?;

        sqlx::query(
            r#"
            INSERT INTO report_configs (id, name, source_ids, keywords, time_range, purpose, focus,
                deep_research, notifier_kind, notifier_destination, active, last_run_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                source_ids = excluded.source_ids,
                keywords = excluded.keywords,
                time_range = excluded.time_range,
                purpose = excluded.purpose,
                focus = excluded.focus,
                deep_research = excluded.deep_research,
                notifier_kind = excluded.notifier_kind,
                notifier_destination = excluded.notifier_destination,
                active = excluded.active,
                last_run_at = excluded.last_run_at
            "#,
        )
        .bind(report.id.to_string())
        .bind(&report.name)
        .bind(&source_ids)
        .bind(&keywords)
        .bind(report.time_range.as_str())
        .bind(&report.purpose)
        .bind(&report.focus)
        .bind(report.deep_research)
        .bind(report.notify.as_ref().map(|n| n.kind.as_str()))
        .bind(report.notify.as_ref().map(|n| n.destination.clone()))
        .bind(report.active)
        .bind(report.last_run_at.as_ref().map(instant))
        .bind(instant(&report.created_at))
        .execute(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        Ok(())
    }

    async fn mark_report_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE report_configs SET last_run_at = ? WHERE id = ?")
            .bind(instant(&at))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(NewsroomError::storage)?;
        Ok(())
    }

    async fn insert_report_record(&self, record: &ReportRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO report_records (id, report_id, title, content, summary, status, notification_sent, error, generated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.report_id.to_string())
        .bind(&record.title)
        .bind(&record.content)
        .bind(&record.summary)
        .bind(record.status.as_str())
        .bind(record.notification_sent)
        .bind(&record.error)
        .bind(instant(&record.generated_at))
        .execute(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        Ok(())
    }

    async fn report_history(&self, report_id: Uuid, limit: usize) -> Result<Vec<ReportRecord>> {
        let rows = sqlx::query_as::<_, ReportRecordRow>(&format!(
            "SELECT {REPORT_RECORD_COLUMNS} FROM report_records WHERE report_id = ? ORDER BY generated_at DESC LIMIT ?"
        ))
        .bind(report_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        rows.into_iter().map(ReportRecordRow::into_record).collect()
    }
}

#[async_trait]
impl TaskLogStore for SqliteStore {
    async fn append_log(&self, log: &TaskLog) -> Result<()> {
        sqlx::query(
            "INSERT INTO task_logs (id, task_type, task_id, level, message, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(log.id.to_string())
        .bind(log.task_type.as_str())
        .bind(log.task_id.to_string())
        .bind(log.level.as_str())
        .bind(&log.message)
        .bind(instant(&log.created_at))
        .execute(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        Ok(())
    }

    async fn logs_for_task(&self, task_id: Uuid) -> Result<Vec<TaskLog>> {
        let rows = sqlx::query_as::<_, TaskLogRow>(
            "SELECT id, task_type, task_id, level, message, created_at FROM task_logs WHERE task_id = ? ORDER BY created_at",
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(NewsroomError::storage)?;

        rows.into_iter().map(TaskLogRow::into_log).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractedArticle;
    use chrono::{Duration, NaiveDate};

    #[tokio::test]
    async fn sources_round_trip_through_sqlite() {
        let store = SqliteStore::in_memory().await.unwrap();
        let source = SourceConfig::new("虎嗅", "https://www.huxiu.com/", r"(https://www\.huxiu\.com/article/\d+\.html)")
            .with_frequency(1800);
        store.insert_source(&source).await.unwrap();
        store.insert_source(&SourceConfig::research_bucket()).await.unwrap();

        let active = store.list_sources(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "虎嗅");
        assert_eq!(active[0].frequency_seconds, 1800);

        let at = Utc::now();
        store.mark_source_run(source.id, at).await.unwrap();
        let loaded = store.get_source(source.id).await.unwrap().unwrap();
        assert_eq!(
            loaded.last_run_at.map(|t| t.timestamp_micros()),
            Some(at.timestamp_micros())
        );
        assert!(store.find_source_by_name("research").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn records_keep_publish_order_and_status() {
        let store = SqliteStore::in_memory().await.unwrap();
        let source = Uuid::now_v7();
        let published = NaiveDate::from_ymd_opt(2025, 9, 12)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();

        let undated = CrawlRecord::success(
            Some(source),
            &ExtractedArticle::new("https://a.example.com/1", "undated", "body"),
            None,
        );
        let dated = CrawlRecord::success(
            Some(source),
            &ExtractedArticle::new("https://a.example.com/2", "dated", "body").with_author("Li"),
            Some(published),
        );
        store.insert_record(&undated).await.unwrap();
        store.insert_record(&dated).await.unwrap();
        store
            .insert_record(&CrawlRecord::failed(Some(source), "https://a.example.com/3", "timeout"))
            .await
            .unwrap();

        let recent = store
            .recent_successes(source, Utc::now() - Duration::hours(1), 10)
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "dated");
        assert_eq!(recent[0].published_at, Some(published));
        assert_eq!(recent[0].author.as_deref(), Some("Li"));
        assert_eq!(recent[1].title, "undated");

        assert!(store
            .record_exists("https://a.example.com/3", RecordStatus::Failed)
            .await
            .unwrap());
        assert!(!store
            .record_exists("https://a.example.com/3", RecordStatus::Success)
            .await
            .unwrap());
        assert_eq!(store.records_for_source(source).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn reports_and_history_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let report = ReportConfig::new("科技新闻日报", "daily tech digest")
            .with_keywords("人工智能,AI，科技")
            .with_time_range(TimeRange::Week)
            .with_notify(NotifierKind::WeChat, "https://qyapi.example.com/hook");
        store.insert_report(&report).await.unwrap();

        let loaded = store.get_report(report.id).await.unwrap().unwrap();
        assert_eq!(loaded.keywords, vec!["人工智能", "AI", "科技"]);
        assert_eq!(loaded.time_range, TimeRange::Week);
        assert_eq!(loaded.notify, report.notify);

        let mut first = ReportRecord::success(report.id, "first", "# first\n\nbody one");
        first.generated_at = Utc::now() - Duration::minutes(5);
        let second = ReportRecord::failed(report.id, "second", "no material");
        store.insert_report_record(&first).await.unwrap();
        store.insert_report_record(&second).await.unwrap();

        let history = store.report_history(report.id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].title, "second");
        assert_eq!(history[0].status, ReportStatus::Failed);
        assert_eq!(history[1].summary, first.summary);
    }

    #[tokio::test]
    async fn task_logs_filter_by_task() {
        let store = SqliteStore::in_memory().await.unwrap();
        let task = Uuid::now_v7();
        store
            .append_log(&TaskLog::new(TaskKind::Crawler, task, LogLevel::Info, "done"))
            .await
            .unwrap();
        store
            .append_log(&TaskLog::new(TaskKind::Report, Uuid::now_v7(), LogLevel::Error, "other"))
            .await
            .unwrap();

        let logs = store.logs_for_task(task).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[0].task_type, TaskKind::Crawler);
    }
}
