//! News harvesting and AI-guided research engine.
//!
//! Sources describe a listing page and a URL pattern. A crawl discovers
//! article links on the listing, fetches each article with retries, and
//! stores one record per attempted URL. Reports gather recent records into
//! a knowledge base; deep reports let a language model decide whether to
//! search the web for more material before writing the final narrative.
//!
//! # Usage
//!
//! ```rust,ignore
//! use newsroom::{Crawler, HttpExtractor, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::new("sqlite://newsroom.db?mode=rwc").await?);
//! let crawler = Crawler::new(store, Arc::new(HttpExtractor::new()?));
//!
//! let summary = crawler.run_source_by_id(source_id).await?;
//! println!("{} new articles", summary.succeeded);
//! ```
//!
//! # Modules
//!
//! - [`crawl`] - Listing discovery and the per-source crawl run
//! - [`extractor`] - HTTP fetching and article extraction
//! - [`knowledge`] - Knowledge-base assembly for a report
//! - [`research`] - Judge/search loop and its wire protocol
//! - [`report`] - Report composition and delivery
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore)
//! - [`testing`] - Doubles for the collaborator traits

pub mod ai;
pub mod crawl;
pub mod dates;
pub mod defaults;
pub mod error;
pub mod extractor;
pub mod knowledge;
pub mod notify;
pub mod report;
pub mod research;
pub mod schedule;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use ai::OpenAiModel;
pub use crawl::{CrawlPolicy, CrawlSummary, Crawler, PersistOutcome};
pub use error::{FetchError, FetchResult, NewsroomError, Result};
pub use extractor::HttpExtractor;
pub use knowledge::{KnowledgeBuilder, KnowledgePolicy};
pub use notify::WebhookNotifier;
pub use report::{ReportMode, ReportOutcome, ReportRunner};
pub use research::{Action, Decision, DecisionLogEntry, ResearchEngine, ResearchOutcome, ResearchPolicy};
pub use schedule::{due_sources, is_due};
pub use stores::MemoryStore;
#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;
pub use traits::{
    AiContext, ContentExtractor, LanguageModel, Notification, Notifier, Prompt, SearchHit,
    SerpApiSearcher, Store, WebSearcher,
};
pub use types::*;
