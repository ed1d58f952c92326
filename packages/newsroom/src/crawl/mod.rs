//! Crawl orchestration for one source.
//!
//! A run moves through `Discover → Filter → (Fetch → Persist)* → Finalize`.
//! Fetches are sequential with retry and pacing; every result is persisted
//! as soon as it resolves. Finalize always stamps the source's last run.

pub mod discover;
pub mod suggest;

pub use discover::{compile_pattern, discover_urls};
pub use suggest::{suggest_pattern, PatternSuggestion, FALLBACK_PATTERN};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dates;
use crate::error::{FetchResult, NewsroomError, Result};
use crate::traits::{ContentExtractor, Store};
use crate::types::{
    CrawlRecord, ExtractedArticle, LogLevel, RecordStatus, SourceConfig, TaskKind, TaskLog,
};

/// Retry and pacing knobs for a crawl run.
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    /// Attempts per URL, including the first.
    pub max_attempts: u32,
    /// Sleep after failed attempt `n` is `backoff_base * 2^(n-1)`.
    pub backoff_base: Duration,
    /// Pause between URLs; doubled after a failed URL.
    pub item_delay: Duration,
    /// URLs processed per run after filtering.
    pub max_urls: usize,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            item_delay: Duration::from_secs(1),
            max_urls: 20,
        }
    }
}

impl CrawlPolicy {
    /// Same attempt budget, no sleeping. For tests and one-off runs.
    pub fn without_delays() -> Self {
        Self {
            backoff_base: Duration::ZERO,
            item_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    fn backoff(&self, failed_attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(failed_attempt.saturating_sub(1))
    }
}

/// What happened to one fetched URL at persist time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    /// A success record for the URL appeared since filtering; nothing written
    AlreadyStored,
}

/// Outcome of one source run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub source_id: Uuid,
    pub source_name: String,
    pub discovered: usize,
    pub skipped_existing: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub persist_errors: usize,
    /// Set when the run stopped early
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlSummary {
    fn start(source: &SourceConfig) -> Self {
        Self {
            source_id: source.id,
            source_name: source.name.clone(),
            discovered: 0,
            skipped_existing: 0,
            succeeded: 0,
            failed: 0,
            duplicates: 0,
            persist_errors: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn log_level(&self) -> LogLevel {
        if self.error.is_some() {
            LogLevel::Error
        } else if self.failed > 0 || self.persist_errors > 0 {
            LogLevel::Warning
        } else {
            LogLevel::Info
        }
    }

    fn describe(&self) -> String {
        let mut message = format!(
            "discovered {}, skipped {} existing, {} new, {} failed, {} duplicates",
            self.discovered, self.skipped_existing, self.succeeded, self.failed, self.duplicates
        );
        if let Some(err) = &self.error {
            message.push_str(&format!("; aborted: {err}"));
        }
        message
    }
}

/// Drives crawl runs against a store and an extractor.
#[derive(Clone)]
pub struct Crawler {
    store: Arc<dyn Store>,
    extractor: Arc<dyn ContentExtractor>,
    policy: CrawlPolicy,
}

impl Crawler {
    pub fn new(store: Arc<dyn Store>, extractor: Arc<dyn ContentExtractor>) -> Self {
        Self {
            store,
            extractor,
            policy: CrawlPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CrawlPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &CrawlPolicy {
        &self.policy
    }

    /// Load a source by id and run it.
    pub async fn run_source_by_id(&self, id: Uuid) -> Result<CrawlSummary> {
        let source = self
            .store
            .get_source(id)
            .await?
            .ok_or_else(|| NewsroomError::not_found("source", id))?;
        Ok(self.run_source(&source).await)
    }

    /// Run one source to completion. Never fails; problems land in the summary.
    pub async fn run_source(&self, source: &SourceConfig) -> CrawlSummary {
        let mut summary = CrawlSummary::start(source);
        info!(source = %source.name, listing = %source.listing_url, "Crawl run started");

        if let Err(e) = self.crawl(source, &mut summary).await {
            error!(source = %source.name, error = %e, "Crawl run aborted");
            summary.error = Some(e.to_string());
        }

        self.finalize(source, &mut summary).await;
        summary
    }

    async fn crawl(&self, source: &SourceConfig, summary: &mut CrawlSummary) -> Result<()> {
        // Discover
        let pattern = compile_pattern(&source.pattern)?;
        let listing = fetch_with_retry(
            self.extractor.as_ref(),
            &self.policy,
            &source.listing_url,
            |e, url| e.render(url),
        )
        .await?;
        let candidates = discover_urls(&pattern, &listing, &source.listing_url);
        summary.discovered = candidates.len();
        debug!(source = %source.name, count = candidates.len(), "Discovered candidate URLs");

        // Filter
        let mut pending = Vec::new();
        for url in candidates {
            if self.store.record_exists(&url, RecordStatus::Success).await? {
                summary.skipped_existing += 1;
            } else {
                pending.push(url);
            }
        }
        if pending.len() > self.policy.max_urls {
            debug!(
                source = %source.name,
                pending = pending.len(),
                cap = self.policy.max_urls,
                "Capping URLs for this run"
            );
            pending.truncate(self.policy.max_urls);
        }

        // Fetch → Persist
        let total = pending.len();
        for (index, url) in pending.iter().enumerate() {
            let fetched = fetch_with_retry(
                self.extractor.as_ref(),
                &self.policy,
                url,
                |e, url| e.extract(url),
            )
            .await;
            let fetched_ok = fetched.is_ok();

            let record = match fetched {
                Ok(article) => success_record(Some(source.id), &article),
                Err(e) => {
                    warn!(url = %url, error = %e, "Giving up on URL");
                    CrawlRecord::failed(Some(source.id), url.as_str(), &e)
                }
            };

            match persist_once(self.store.as_ref(), &record).await {
                Ok(PersistOutcome::Inserted) if record.is_success() => summary.succeeded += 1,
                Ok(PersistOutcome::Inserted) => summary.failed += 1,
                Ok(PersistOutcome::AlreadyStored) => summary.duplicates += 1,
                Err(e) => {
                    error!(url = %url, error = %e, "Failed to persist crawl record");
                    summary.persist_errors += 1;
                }
            }

            if index + 1 < total {
                let pause = if fetched_ok {
                    self.policy.item_delay
                } else {
                    self.policy.item_delay * 2
                };
                tokio::time::sleep(pause).await;
            }
        }

        Ok(())
    }

    async fn finalize(&self, source: &SourceConfig, summary: &mut CrawlSummary) {
        let finished = Utc::now();
        summary.finished_at = Some(finished);

        if let Err(e) = self.store.mark_source_run(source.id, finished).await {
            error!(source = %source.name, error = %e, "Failed to update last run");
        }

        let log = TaskLog::new(TaskKind::Crawler, source.id, summary.log_level(), summary.describe());
        if let Err(e) = self.store.append_log(&log).await {
            warn!(source = %source.name, error = %e, "Failed to append task log");
        }

        info!(
            source = %source.name,
            discovered = summary.discovered,
            new = summary.succeeded,
            failed = summary.failed,
            duplicates = summary.duplicates,
            "Crawl run finished"
        );
    }
}

/// Build a success record, resolving the publish date from the page's date
/// text or, failing that, its body.
pub fn success_record(source_id: Option<Uuid>, article: &ExtractedArticle) -> CrawlRecord {
    let published = dates::resolve(&article.date_text, Some(&article.body));
    CrawlRecord::success(source_id, article, published)
}

/// Insert `record` unless a success record for its URL already exists.
///
/// This is check-then-insert with no lock held in between, so two runs
/// racing on one URL can both insert. Callers tolerate that.
pub async fn persist_once(store: &dyn Store, record: &CrawlRecord) -> Result<PersistOutcome> {
    if store.record_exists(&record.url, RecordStatus::Success).await? {
        debug!(url = %record.url, "Already stored, skipping insert");
        return Ok(PersistOutcome::AlreadyStored);
    }
    store.insert_record(record).await?;
    Ok(PersistOutcome::Inserted)
}

/// Run `op` up to `policy.max_attempts` times with exponential backoff
/// between attempts.
pub(crate) async fn fetch_with_retry<'a, T, F, Fut>(
    extractor: &'a dyn ContentExtractor,
    policy: &CrawlPolicy,
    url: &'a str,
    op: F,
) -> FetchResult<T>
where
    F: Fn(&'a dyn ContentExtractor, &'a str) -> Fut,
    Fut: std::future::Future<Output = FetchResult<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(extractor, url).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                let wait = policy.backoff(attempt);
                debug!(url = %url, attempt, error = %e, wait_ms = wait.as_millis() as u64, "Fetch failed, retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
