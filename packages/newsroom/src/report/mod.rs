//! Report runs: knowledge base, optional research, composition, delivery.

pub mod compose;

pub use compose::{citation_footer, compose_deep, composer_prompt, digest, ComposedReport};

use chrono::{Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{NewsroomError, Result};
use crate::knowledge::{KnowledgeBuilder, KnowledgePolicy};
use crate::research::{DecisionLogEntry, ResearchEngine, ResearchPolicy};
use crate::traits::{
    AiContext, ContentExtractor, LanguageModel, Notification, Notifier, Store, WebSearcher,
};
use crate::types::{LogLevel, ReportConfig, ReportRecord, ReportStatus, TaskKind, TaskLog};

/// How a report was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    Deep,
    Simple,
}

/// Everything one report run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub record: ReportRecord,
    pub mode: ReportMode,
    /// Knowledge-base size when composition started
    pub articles: usize,
    /// Judge iterations; zero for simple reports
    pub iterations: u32,
    pub decisions: Vec<DecisionLogEntry>,
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        self.record.status == ReportStatus::Success
    }
}

struct Composed {
    content: String,
    articles: usize,
    iterations: u32,
    decisions: Vec<DecisionLogEntry>,
}

pub struct ReportRunner {
    store: Arc<dyn Store>,
    model: Arc<dyn LanguageModel>,
    notifier: Arc<dyn Notifier>,
    knowledge: KnowledgeBuilder,
    research: ResearchEngine,
}

impl ReportRunner {
    pub fn new(
        store: Arc<dyn Store>,
        extractor: Arc<dyn ContentExtractor>,
        model: Arc<dyn LanguageModel>,
        searcher: Arc<dyn WebSearcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            knowledge: KnowledgeBuilder::new(store.clone()),
            research: ResearchEngine::new(store.clone(), extractor, model.clone(), searcher),
            store,
            model,
            notifier,
        }
    }

    pub fn with_knowledge_policy(mut self, policy: KnowledgePolicy) -> Self {
        self.knowledge = self.knowledge.with_policy(policy);
        self
    }

    pub fn with_research_policy(mut self, policy: ResearchPolicy) -> Self {
        self.research = self.research.with_policy(policy);
        self
    }

    /// Load a report config by id and run it.
    pub async fn run_by_id(&self, ctx: &AiContext, id: Uuid) -> Result<ReportOutcome> {
        let report = self
            .store
            .get_report(id)
            .await?
            .ok_or_else(|| NewsroomError::not_found("report", id))?;
        Ok(self.run(ctx, &report).await)
    }

    /// Run one report. Failures end up in the returned record, never as `Err`.
    pub async fn run(&self, ctx: &AiContext, report: &ReportConfig) -> ReportOutcome {
        let mode = if report.deep_research {
            ReportMode::Deep
        } else {
            ReportMode::Simple
        };
        let title = format!("{} - {}", report.name, Local::now().format("%Y-%m-%d %H:%M"));
        info!(report = %report.name, mode = ?mode, "Report run started");

        let composed = match mode {
            ReportMode::Deep => self.deep(ctx, report).await,
            ReportMode::Simple => self.simple(report).await,
        };

        let mut outcome = match composed {
            Ok(composed) => ReportOutcome {
                record: ReportRecord::success(report.id, title, composed.content),
                mode,
                articles: composed.articles,
                iterations: composed.iterations,
                decisions: composed.decisions,
            },
            Err(e) => {
                error!(report = %report.name, error = %e, "Report run failed");
                ReportOutcome {
                    record: ReportRecord::failed(report.id, format!("{title} (failed)"), &e),
                    mode,
                    articles: 0,
                    iterations: 0,
                    decisions: Vec::new(),
                }
            }
        };

        self.deliver(report, &mut outcome.record).await;
        self.finalize(report, &outcome).await;
        outcome
    }

    async fn deep(&self, ctx: &AiContext, report: &ReportConfig) -> Result<Composed> {
        let knowledge = self.knowledge.build(report).await;
        if knowledge.is_empty() {
            return Err(NewsroomError::NoMaterial);
        }

        let research = self.research.run(ctx, report, knowledge).await;
        let composed = compose_deep(
            self.model.as_ref(),
            ctx,
            report,
            &research.knowledge,
            Local::now(),
        )
        .await;

        Ok(Composed {
            content: composed.content,
            articles: research.knowledge.len(),
            iterations: research.iterations,
            decisions: research.log,
        })
    }

    async fn simple(&self, report: &ReportConfig) -> Result<Composed> {
        let knowledge = self.knowledge.build(report).await;
        Ok(Composed {
            content: digest(report, &knowledge, Local::now()),
            articles: knowledge.len(),
            iterations: 0,
            decisions: Vec::new(),
        })
    }

    async fn deliver(&self, report: &ReportConfig, record: &mut ReportRecord) {
        let Some(target) = &report.notify else {
            return;
        };
        if record.error.is_some() {
            return;
        }

        let notification = Notification {
            kind: target.kind,
            destination: target.destination.clone(),
            title: record.title.clone(),
            body: record.content.clone(),
        };
        match self.notifier.send(&notification).await {
            Ok(()) => record.notification_sent = true,
            Err(e) => {
                warn!(report = %report.name, kind = %target.kind, error = %e, "Notification failed");
                record.error = Some(format!("notification failed: {e}"));
            }
        }
    }

    async fn finalize(&self, report: &ReportConfig, outcome: &ReportOutcome) {
        if let Err(e) = self.store.insert_report_record(&outcome.record).await {
            error!(report = %report.name, error = %e, "Failed to store report record");
        }
        if let Err(e) = self.store.mark_report_run(report.id, Utc::now()).await {
            error!(report = %report.name, error = %e, "Failed to update report last run");
        }

        let (level, message) = match (&outcome.record.status, &outcome.record.error) {
            (ReportStatus::Failed, error) => (
                LogLevel::Error,
                format!("report failed: {}", error.as_deref().unwrap_or("unknown error")),
            ),
            (_, Some(error)) => (LogLevel::Warning, format!("report generated; {error}")),
            (_, None) => (
                LogLevel::Info,
                format!(
                    "{:?} report generated from {} articles in {} iterations",
                    outcome.mode, outcome.articles, outcome.iterations
                ),
            ),
        };
        let log = TaskLog::new(TaskKind::Report, report.id, level, message);
        if let Err(e) = self.store.append_log(&log).await {
            warn!(report = %report.name, error = %e, "Failed to append task log");
        }

        info!(
            report = %report.name,
            status = outcome.record.status.as_str(),
            articles = outcome.articles,
            iterations = outcome.iterations,
            notified = outcome.record.notification_sent,
            "Report run finished"
        );
    }
}
