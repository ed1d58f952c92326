//! Domain types shared by the crawl, knowledge, and research stages.

pub mod article;
pub mod record;
pub mod report;
pub mod source;
pub mod task;

pub use article::{ExtractedArticle, KnowledgeArticle};
pub use record::{CrawlRecord, RecordStatus};
pub use report::{
    split_keywords, NotifierKind, NotifyTarget, ReportConfig, ReportRecord, ReportStatus,
    TimeRange,
};
pub use source::{SourceConfig, RESEARCH_SOURCE_NAME};
pub use task::{LogLevel, TaskKind, TaskLog};
