//! Seams between the engine and the outside world.

pub mod ai;
pub mod extractor;
pub mod notifier;
pub mod searcher;
pub mod store;

pub use ai::{AiContext, LanguageModel, Prompt};
pub use extractor::ContentExtractor;
pub use notifier::{Notification, Notifier};
pub use searcher::{MockWebSearcher, SearchHit, SerpApiSearcher, WebSearcher};
pub use store::{RecordStore, ReportStore, SourceStore, Store, TaskLogStore};
