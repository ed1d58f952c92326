//! Report configuration and the records each report run leaves behind.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Named look-back window for knowledge-base queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "14d")]
    TwoWeeks,
    #[serde(rename = "30d")]
    Month,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::ThreeDays => "3d",
            Self::Week => "7d",
            Self::TwoWeeks => "14d",
            Self::Month => "30d",
        }
    }

    /// Parse a range name; anything unrecognized means the last 24 hours.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim() {
            "3d" => Self::ThreeDays,
            "7d" => Self::Week,
            "14d" => Self::TwoWeeks,
            "30d" => Self::Month,
            _ => Self::Day,
        }
    }

    pub fn hours(&self) -> i64 {
        match self {
            Self::Day => 24,
            Self::ThreeDays => 72,
            Self::Week => 168,
            Self::TwoWeeks => 336,
            Self::Month => 720,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::hours(self.hours())
    }

    /// Earliest ingestion time included when evaluated at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Webhook flavor for report delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// WeCom group robot
    WeChat,
    /// Kingsoft (WPS) collaboration robot
    Jinshan,
}

impl NotifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeChat => "wechat",
            Self::Jinshan => "jinshan",
        }
    }
}

impl fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wechat" => Ok(Self::WeChat),
            "jinshan" => Ok(Self::Jinshan),
            other => Err(format!("unsupported notification type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyTarget {
    pub kind: NotifierKind,
    pub destination: String,
}

/// What a report run should read, what it is for, and where it goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub id: Uuid,
    pub name: String,

    /// Sources whose records seed the knowledge base
    pub source_ids: Vec<Uuid>,

    /// Match-any filter over title and body; empty passes everything
    pub keywords: Vec<String>,

    pub time_range: TimeRange,
    pub purpose: String,
    pub focus: String,

    /// Run the iterative research loop instead of a plain digest
    pub deep_research: bool,

    pub notify: Option<NotifyTarget>,
    pub active: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReportConfig {
    pub fn new(name: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            source_ids: Vec::new(),
            keywords: Vec::new(),
            time_range: TimeRange::default(),
            purpose: purpose.into(),
            focus: String::new(),
            deep_research: false,
            notify: None,
            active: true,
            last_run_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_sources(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.source_ids = ids.into_iter().collect();
        self
    }

    pub fn with_keywords(mut self, raw: &str) -> Self {
        self.keywords = split_keywords(raw);
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = range;
        self
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = focus.into();
        self
    }

    pub fn with_deep_research(mut self, enabled: bool) -> Self {
        self.deep_research = enabled;
        self
    }

    pub fn with_notify(mut self, kind: NotifierKind, destination: impl Into<String>) -> Self {
        let destination = destination.into();
        self.notify = if destination.trim().is_empty() {
            None
        } else {
            Some(NotifyTarget { kind, destination })
        };
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Keywords joined back into their stored form.
    pub fn keywords_text(&self) -> String {
        self.keywords.join(",")
    }
}

/// Split a comma-separated keyword list (ASCII or full-width commas).
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split([',', '，'])
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Output of one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub report_id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub status: ReportStatus,
    pub notification_sent: bool,
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn success(report_id: Uuid, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: Uuid::now_v7(),
            report_id,
            title: title.into(),
            summary: summarize(&content),
            content,
            status: ReportStatus::Success,
            notification_sent: false,
            error: None,
            generated_at: Utc::now(),
        }
    }

    pub fn failed(report_id: Uuid, title: impl Into<String>, error: impl ToString) -> Self {
        Self {
            id: Uuid::now_v7(),
            report_id,
            title: title.into(),
            content: String::new(),
            summary: String::new(),
            status: ReportStatus::Failed,
            notification_sent: false,
            error: Some(error.to_string()),
            generated_at: Utc::now(),
        }
    }
}

const SUMMARY_CHARS: usize = 200;

/// First non-heading lines of a markdown report, capped at 200 chars.
pub fn summarize(content: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut len = 0;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push(line);
        len += line.chars().count() + 1;
        if len > SUMMARY_CHARS {
            break;
        }
    }

    let summary = lines.join("\n");
    if summary.chars().count() > SUMMARY_CHARS {
        let cut: String = summary.chars().take(SUMMARY_CHARS).collect();
        format!("{}...", cut)
    } else {
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_time_range_defaults_to_a_day() {
        assert_eq!(TimeRange::parse_or_default("7d"), TimeRange::Week);
        assert_eq!(TimeRange::parse_or_default("14d").hours(), 336);
        assert_eq!(TimeRange::parse_or_default("fortnight"), TimeRange::Day);
        assert_eq!(TimeRange::parse_or_default(""), TimeRange::Day);
    }

    #[test]
    fn keywords_split_on_both_comma_widths() {
        assert_eq!(
            split_keywords("AI, 大模型，芯片,, "),
            vec!["AI".to_string(), "大模型".to_string(), "芯片".to_string()]
        );
        assert!(split_keywords("  ").is_empty());
    }

    #[test]
    fn blank_webhook_means_no_target() {
        let report = ReportConfig::new("daily", "digest").with_notify(NotifierKind::WeChat, " ");
        assert!(report.notify.is_none());
    }

    #[test]
    fn summary_skips_headings_and_caps_length() {
        let body = format!("# Title\n\nfirst line\n## Section\n{}", "x".repeat(300));
        let summary = summarize(&body);
        assert!(summary.starts_with("first line\nxxx"));
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), 203);
    }

    #[test]
    fn notifier_kind_parses_case_insensitively() {
        assert_eq!("WeChat".parse::<NotifierKind>().unwrap(), NotifierKind::WeChat);
        assert!("slack".parse::<NotifierKind>().is_err());
    }
}
