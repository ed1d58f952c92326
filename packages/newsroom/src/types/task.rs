//! Audit trail rows for crawl and report runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Crawler,
    Report,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawler => "crawler",
            Self::Report => "report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "crawler" => Some(Self::Crawler),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLog {
    pub id: Uuid,
    pub task_type: TaskKind,
    pub task_id: Uuid,
    pub level: LogLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl TaskLog {
    pub fn new(task_type: TaskKind, task_id: Uuid, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            task_type,
            task_id,
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
