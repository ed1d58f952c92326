//! AI-guided research loop.
//!
//! Each iteration shows the judge the current knowledge base. The judge
//! either finishes the loop or names keywords; keywords trigger a search
//! round that extracts new pages into the knowledge base and the research
//! bucket. The loop is capped by iteration count only.

pub mod prompts;
pub mod protocol;
pub mod ranking;

pub use protocol::{
    escape_xml, knowledge_base_xml, parse_decision, parse_ranked_urls, user_prompt_xml, Action,
    Decision,
};
pub use ranking::{rank_by_recency, recency_score, top_urls};

use chrono::{DateTime, Datelike, Local, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::crawl::{persist_once, success_record, PersistOutcome};
use crate::knowledge::ensure_research_source;
use crate::traits::{AiContext, ContentExtractor, LanguageModel, SearchHit, Store, WebSearcher};
use crate::types::{KnowledgeArticle, RecordStatus, ReportConfig};

/// Bounds for one research run.
#[derive(Debug, Clone)]
pub struct ResearchPolicy {
    pub max_iterations: u32,
    /// Keywords taken from one judge reply.
    pub max_keywords: usize,
    /// Pages read per keyword.
    pub urls_per_keyword: usize,
    /// Search hits shown to the ranker.
    pub ranker_candidates: usize,
    pub round_timeout: Duration,
    /// Pause between keywords in a round.
    pub keyword_pacing: Duration,
}

impl Default for ResearchPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            max_keywords: 3,
            urls_per_keyword: 3,
            ranker_candidates: 10,
            round_timeout: Duration::from_secs(60),
            keyword_pacing: Duration::from_secs(2),
        }
    }
}

impl ResearchPolicy {
    pub fn without_delays() -> Self {
        Self {
            keyword_pacing: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// One line of the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionLogEntry {
    pub iteration: u32,
    #[serde(flatten)]
    pub action: Action,
    pub rationale: String,
    pub at: DateTime<Utc>,
}

/// Result of a finished loop.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub knowledge: Vec<KnowledgeArticle>,
    pub iterations: u32,
    pub log: Vec<DecisionLogEntry>,
}

impl ResearchOutcome {
    /// Search actions taken, in order.
    pub fn searches(&self) -> Vec<&[String]> {
        self.log
            .iter()
            .filter_map(|entry| match &entry.action {
                Action::Search { keywords } => Some(keywords.as_slice()),
                Action::Finish => None,
            })
            .collect()
    }
}

pub struct ResearchEngine {
    store: Arc<dyn Store>,
    extractor: Arc<dyn ContentExtractor>,
    model: Arc<dyn LanguageModel>,
    searcher: Arc<dyn WebSearcher>,
    policy: ResearchPolicy,
}

impl ResearchEngine {
    pub fn new(
        store: Arc<dyn Store>,
        extractor: Arc<dyn ContentExtractor>,
        model: Arc<dyn LanguageModel>,
        searcher: Arc<dyn WebSearcher>,
    ) -> Self {
        Self {
            store,
            extractor,
            model,
            searcher,
            policy: ResearchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the judge/search loop starting from `knowledge`.
    pub async fn run(
        &self,
        ctx: &AiContext,
        report: &ReportConfig,
        mut knowledge: Vec<KnowledgeArticle>,
    ) -> ResearchOutcome {
        let mut log = Vec::new();
        let mut iterations = 0;
        let user_prompt = user_prompt_xml(report);

        info!(report = %report.name, articles = knowledge.len(), "Research started");

        while iterations < self.policy.max_iterations {
            iterations += 1;
            let decision = self.judge(ctx, report, &user_prompt, &knowledge, iterations).await;

            let action = match decision.action {
                Action::Search { keywords } => Action::Search {
                    keywords: keywords.into_iter().take(self.policy.max_keywords).collect(),
                },
                Action::Finish => Action::Finish,
            };

            info!(
                iteration = iterations,
                decision = ?action,
                rationale = %decision.rationale,
                "Research decision"
            );
            log.push(DecisionLogEntry {
                iteration: iterations,
                action: action.clone(),
                rationale: decision.rationale,
                at: Utc::now(),
            });

            let Action::Search { keywords } = action else {
                break;
            };

            let mut found = Vec::new();
            let round = self.search_round(ctx, &keywords, &knowledge, &mut found);
            if tokio::time::timeout(self.policy.round_timeout, round).await.is_err() {
                warn!(iteration = iterations, kept = found.len(), "Search round timed out");
            }
            info!(iteration = iterations, added = found.len(), "Search round finished");
            knowledge.extend(found);
        }

        info!(
            report = %report.name,
            iterations,
            articles = knowledge.len(),
            "Research finished"
        );
        ResearchOutcome {
            knowledge,
            iterations,
            log,
        }
    }

    async fn judge(
        &self,
        ctx: &AiContext,
        report: &ReportConfig,
        user_prompt: &str,
        knowledge: &[KnowledgeArticle],
        iteration: u32,
    ) -> Decision {
        let prompt = prompts::judge_prompt(
            &report.purpose,
            user_prompt,
            &knowledge_base_xml(knowledge),
            iteration,
        );

        match self.model.complete(ctx, &prompt).await {
            Ok(reply) => {
                let decision = parse_decision(&reply);
                if decision.is_finish() && !reply.contains("<finish") {
                    warn!(iteration, reply = %reply, "Judge reply did not parse, finishing");
                }
                decision
            }
            Err(e) => {
                warn!(iteration, error = %e, "Judge call failed, finishing");
                Decision::finish(format!("judge call failed: {e}"))
            }
        }
    }

    async fn search_round(
        &self,
        ctx: &AiContext,
        keywords: &[String],
        knowledge: &[KnowledgeArticle],
        found: &mut Vec<KnowledgeArticle>,
    ) {
        let bucket_id = match ensure_research_source(self.store.as_ref()).await {
            Ok(bucket) => Some(bucket.id),
            Err(e) => {
                warn!(error = %e, "Research source unavailable, results will not be stored");
                None
            }
        };
        let mut known: HashSet<String> = knowledge.iter().map(|a| a.url.clone()).collect();

        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.policy.keyword_pacing).await;
            }

            let hits = match self.searcher.search(keyword).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "Search failed");
                    continue;
                }
            };
            if hits.is_empty() {
                debug!(keyword = %keyword, "No search results");
                continue;
            }

            let urls = self.choose_urls(ctx, keyword, &hits).await;
            for url in urls.into_iter().take(self.policy.urls_per_keyword) {
                if !known.insert(url.clone()) {
                    continue;
                }
                if let Some(article) = self.ingest(bucket_id, keyword, &url).await {
                    found.push(article);
                }
            }
        }
    }

    /// Pick URLs for one keyword: ranker model first, recency score as fallback.
    async fn choose_urls(&self, ctx: &AiContext, keyword: &str, hits: &[SearchHit]) -> Vec<String> {
        let ranked = rank_by_recency(hits, Local::now().year());
        let fallback = || top_urls(&ranked, self.policy.urls_per_keyword);

        let candidates: Vec<&SearchHit> = ranked
            .iter()
            .take(self.policy.ranker_candidates)
            .map(|(hit, _)| hit)
            .collect();
        let prompt = prompts::ranker_prompt(keyword, &candidates);

        match self.model.complete(ctx, &prompt).await {
            Ok(reply) => parse_ranked_urls(&reply).unwrap_or_else(|| {
                debug!(keyword = %keyword, "Ranker reply had no URL block, using recency order");
                fallback()
            }),
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "Ranker call failed, using recency order");
                fallback()
            }
        }
    }

    /// Extract one search result and store it in the research bucket.
    async fn ingest(&self, bucket_id: Option<Uuid>, keyword: &str, url: &str) -> Option<KnowledgeArticle> {
        match self.store.record_exists(url, RecordStatus::Success).await {
            Ok(true) => {
                debug!(url = %url, "Already stored, not refetching");
                return None;
            }
            Ok(false) => {}
            Err(e) => warn!(url = %url, error = %e, "Existence check failed, fetching anyway"),
        }

        let article = match self.extractor.extract(url).await {
            Ok(article) => article,
            Err(e) => {
                warn!(url = %url, error = %e, "Search result extraction failed");
                return None;
            }
        };

        if bucket_id.is_some() {
            let record = success_record(bucket_id, &article);
            match persist_once(self.store.as_ref(), &record).await {
                Ok(PersistOutcome::Inserted) => debug!(url = %url, "Stored search result"),
                Ok(PersistOutcome::AlreadyStored) => debug!(url = %url, "Search result stored concurrently"),
                Err(e) => warn!(url = %url, error = %e, "Failed to store search result"),
            }
        }

        Some(KnowledgeArticle::from_search(&article, keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{test_context, MockExtractor, ScriptedModel};
    use crate::traits::{MockWebSearcher, RecordStore, SourceStore};
    use crate::types::ExtractedArticle;

    fn engine(
        store: Arc<MemoryStore>,
        extractor: Arc<MockExtractor>,
        model: Arc<ScriptedModel>,
        searcher: MockWebSearcher,
    ) -> ResearchEngine {
        ResearchEngine::new(store, extractor, model, Arc::new(searcher))
            .with_policy(ResearchPolicy::without_delays())
    }

    #[tokio::test]
    async fn search_round_stores_into_research_bucket() {
        let store = Arc::new(MemoryStore::new());
        let extractor = Arc::new(MockExtractor::new());
        extractor.add_article(ExtractedArticle::new("https://r.example.com/1", "Found", "found body"));

        let model = Arc::new(
            ScriptedModel::new()
                .then_reply("<keywords_to_search>chips</keywords_to_search>")
                .then_reply("<urls_to_crawl>\nhttps://r.example.com/1\n</urls_to_crawl>")
                .then_reply("<finish />"),
        );
        let searcher = MockWebSearcher::new().with_urls("chips", &["https://r.example.com/1"]);

        let report = ReportConfig::new("weekly", "chips");
        let outcome = engine(store.clone(), extractor, model, searcher)
            .run(&test_context(), &report, Vec::new())
            .await;

        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.searches(), vec![&["chips".to_string()][..]]);
        assert_eq!(outcome.knowledge.len(), 1);
        assert_eq!(outcome.knowledge[0].provenance, "search: chips");

        let bucket = store.find_source_by_name("research").await.unwrap().unwrap();
        assert_eq!(store.records_for_source(bucket.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ranker_failure_falls_back_to_recency() {
        let store = Arc::new(MemoryStore::new());
        let extractor = Arc::new(MockExtractor::new());
        extractor.add_article(ExtractedArticle::new("https://fresh.example.com", "Fresh", "body"));

        let model = Arc::new(
            ScriptedModel::new()
                .then_reply("<keywords_to_search>gpu</keywords_to_search>")
                .then_fail("ranker down")
                .then_reply("<finish />"),
        );
        let searcher = MockWebSearcher::new().with_results(
            "gpu",
            vec![
                SearchHit::new("https://stale.example.com").with_date("2019-01-01"),
                SearchHit::new("https://none.example.com"),
                SearchHit::new("https://other.example.com"),
                SearchHit::new("https://fresh.example.com").with_title("latest gpu"),
            ],
        );

        let outcome = engine(store, extractor.clone(), model, searcher)
            .run(&test_context(), &ReportConfig::new("w", "gpu"), Vec::new())
            .await;

        // fresh (100) then stale (10) then provider order
        assert_eq!(extractor.attempts("https://fresh.example.com"), 1);
        assert_eq!(extractor.attempts("https://stale.example.com"), 1);
        assert_eq!(extractor.attempts("https://none.example.com"), 1);
        assert_eq!(extractor.attempts("https://other.example.com"), 0);
        assert_eq!(outcome.knowledge.len(), 1);
    }

    #[tokio::test]
    async fn already_stored_urls_are_not_refetched() {
        let store = Arc::new(MemoryStore::new());
        let article = ExtractedArticle::new("https://seen.example.com", "Seen", "body");
        store.insert_record(&success_record(None, &article)).await.unwrap();

        let extractor = Arc::new(MockExtractor::new());
        extractor.add_article(article);
        let model = Arc::new(
            ScriptedModel::new()
                .then_reply("<keywords_to_search>seen</keywords_to_search>")
                .then_reply("<urls_to_crawl>\nhttps://seen.example.com\n</urls_to_crawl>")
                .then_reply("<finish />"),
        );
        let searcher = MockWebSearcher::new().with_urls("seen", &["https://seen.example.com"]);

        let outcome = engine(store, extractor.clone(), model, searcher)
            .run(&test_context(), &ReportConfig::new("w", "seen"), Vec::new())
            .await;

        assert_eq!(extractor.attempts("https://seen.example.com"), 0);
        assert!(outcome.knowledge.is_empty());
    }

    #[tokio::test]
    async fn judge_failure_finishes() {
        let model = Arc::new(ScriptedModel::new().then_fail("offline"));
        let outcome = engine(
            Arc::new(MemoryStore::new()),
            Arc::new(MockExtractor::new()),
            model,
            MockWebSearcher::new(),
        )
        .run(&test_context(), &ReportConfig::new("w", "p"), Vec::new())
        .await;

        assert_eq!(outcome.iterations, 1);
        assert!(outcome.searches().is_empty());
        assert!(outcome.log[0].rationale.starts_with("judge call failed"));
    }

    #[tokio::test]
    async fn keywords_are_capped() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_reply("<keywords_to_search>a,b,c,d,e</keywords_to_search>")
                .then_reply("<finish />"),
        );
        let searcher = MockWebSearcher::new();
        let outcome = ResearchEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MockExtractor::new()),
            model,
            Arc::new(searcher),
        )
        .with_policy(ResearchPolicy::without_delays())
        .run(&test_context(), &ReportConfig::new("w", "p"), Vec::new())
        .await;

        assert_eq!(outcome.searches()[0].len(), 3);
    }
}
