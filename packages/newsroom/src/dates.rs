//! Publish-date resolution.
//!
//! Turns the free-form date text found on a page into a wall-clock
//! timestamp. Matchers run in a fixed order: relative terms, CJK numeric
//! dates, separator dates, then a list of common written formats. Results
//! in the future are clamped to the resolution time. Anything unresolvable
//! is `None`; a missing date is normal, not an error.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref RELATIVE_DAY: Regex = Regex::new(
        r"(?i)(今天|昨天|前天|today|day before yesterday|yesterday)(?:\s*(\d{1,2})[:：](\d{2}))?"
    )
    .unwrap();
    static ref UNITS_AGO: Regex = Regex::new(
        r"(?i)(\d+)\s*(小时|分钟|天|hours?|hrs?|minutes?|mins?|days?)\s*(前|ago)"
    )
    .unwrap();
    static ref JUST_NOW: Regex = Regex::new(r"(?i)(刚刚|just now)").unwrap();
    static ref CJK_FULL: Regex = Regex::new(
        r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日(?:\s*(\d{1,2})[:：](\d{2}))?"
    )
    .unwrap();
    static ref CJK_MONTH_DAY: Regex = Regex::new(
        r"(\d{1,2})\s*月\s*(\d{1,2})\s*日(?:\s*(\d{1,2})[:：](\d{2}))?"
    )
    .unwrap();
    static ref SEPARATED: Regex = Regex::new(
        r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[T\s]+(\d{1,2}):(\d{2})(?::(\d{2}))?)?"
    )
    .unwrap();

    /// Date-like substrings searched for in surrounding text, highest priority first.
    static ref TEXT_PATTERNS: Vec<&'static Regex> =
        vec![&*CJK_FULL, &*SEPARATED, &*RELATIVE_DAY, &*UNITS_AGO, &*JUST_NOW];
}

/// Written formats tried last, after the structured matchers.
const WRITTEN_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%m/%d/%Y",
    "%Y%m%d",
];

/// Resolve against the current local time.
pub fn resolve(raw: &str, context: Option<&str>) -> Option<NaiveDateTime> {
    resolve_at(raw, context, Local::now().naive_local())
}

/// Resolve `raw`, falling back to the first date-like text in `context`.
pub fn resolve_at(raw: &str, context: Option<&str>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let resolved = resolve_candidate(raw.trim(), now).or_else(|| {
        let found = find_date_text(context?)?;
        resolve_candidate(found, now)
    })?;

    Some(resolved.min(now))
}

/// First date-like substring of `text`, by pattern priority.
pub fn find_date_text(text: &str) -> Option<&str> {
    TEXT_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str())
}

fn resolve_candidate(candidate: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if candidate.is_empty() {
        return None;
    }
    relative(candidate, now)
        .or_else(|| cjk_numeric(candidate, now))
        .or_else(|| separated(candidate))
        .or_else(|| written(candidate))
}

fn relative(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some(caps) = RELATIVE_DAY.captures(text) {
        let days_back = match caps[1].to_lowercase().as_str() {
            "今天" | "today" => 0,
            "昨天" | "yesterday" => 1,
            _ => 2,
        };
        let day = now - Duration::days(days_back);
        return match time_of(&caps, 2, 3, None) {
            Some(time) => Some(day.date().and_time(time)),
            None if caps.get(2).is_some() => None,
            None => Some(day),
        };
    }

    if let Some(caps) = UNITS_AGO.captures(text) {
        let amount: i64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        // Page text can hold any number; out-of-range amounts are unresolvable
        let delta = if unit.starts_with('小') || unit.starts_with('h') {
            Duration::try_hours(amount)
        } else if unit.starts_with('分') || unit.starts_with('m') {
            Duration::try_minutes(amount)
        } else {
            Duration::try_days(amount)
        }?;
        return now.checked_sub_signed(delta);
    }

    if JUST_NOW.is_match(text) {
        return Some(now - Duration::minutes(5));
    }

    None
}

fn cjk_numeric(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0);

    if let Some(caps) = CJK_FULL.captures(text) {
        let date = ymd(&caps[1], &caps[2], &caps[3])?;
        return Some(date.and_time(time_of(&caps, 4, 5, None).or(noon)?));
    }

    if let Some(caps) = CJK_MONTH_DAY.captures(text) {
        let date = NaiveDate::from_ymd_opt(now.year(), caps[1].parse().ok()?, caps[2].parse().ok()?)?;
        return Some(date.and_time(time_of(&caps, 3, 4, None).or(noon)?));
    }

    None
}

fn separated(text: &str) -> Option<NaiveDateTime> {
    let caps = SEPARATED.captures(text)?;
    let date = ymd(&caps[1], &caps[2], &caps[3])?;
    match time_of(&caps, 4, 5, Some(6)) {
        Some(time) => Some(date.and_time(time)),
        None => date.and_hms_opt(0, 0, 0),
    }
}

fn written(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    WRITTEN_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

fn time_of(caps: &Captures<'_>, h: usize, m: usize, s: Option<usize>) -> Option<NaiveTime> {
    let hour = caps.get(h)?.as_str().parse().ok()?;
    let minute = caps.get(m)?.as_str().parse().ok()?;
    let second = s
        .and_then(|i| caps.get(i))
        .and_then(|c| c.as_str().parse().ok())
        .unwrap_or(0);
    NaiveTime::from_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn cjk_date_with_time() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(
            resolve_at("2025年9月11日 08:02", None, now),
            Some(at("2025-09-11 08:02:00"))
        );
    }

    #[test]
    fn cjk_date_without_time_defaults_to_noon() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(
            resolve_at("2025年9月11日", None, now),
            Some(at("2025-09-11 12:00:00"))
        );
        assert_eq!(resolve_at("9月11日", None, now), Some(at("2025-09-11 12:00:00")));
    }

    #[test]
    fn oversized_relative_amounts_are_unresolvable() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(resolve_at("", Some("评论 999999999999999 天前"), now), None);
        assert_eq!(resolve_at("99999999999999999 hours ago", None, now), None);
        assert_eq!(resolve_at("9999999999999999 minutes ago", None, now), None);
    }

    #[test]
    fn hours_ago() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(resolve_at("3小时前", None, now), Some(at("2025-10-01 06:00:00")));
        assert_eq!(resolve_at("45 minutes ago", None, now), Some(at("2025-10-01 08:15:00")));
    }

    #[test]
    fn yesterday_with_time() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(resolve_at("昨天 08:02", None, now), Some(at("2025-09-30 08:02:00")));
        assert_eq!(resolve_at("前天", None, now), Some(at("2025-09-29 09:00:00")));
    }

    #[test]
    fn just_now_is_five_minutes_back() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(resolve_at("刚刚", None, now), Some(at("2025-10-01 08:55:00")));
    }

    #[test]
    fn separator_formats() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(
            resolve_at("2025-09-11 08:02:30", None, now),
            Some(at("2025-09-11 08:02:30"))
        );
        assert_eq!(resolve_at("2025/09/11", None, now), Some(at("2025-09-11 00:00:00")));
    }

    #[test]
    fn written_formats() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(resolve_at("Sep 3, 2025", None, now), Some(at("2025-09-03 00:00:00")));
    }

    #[test]
    fn future_dates_clamp_to_now() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(resolve_at("今天 23:30", None, now), Some(now));
        assert_eq!(resolve_at("2026-01-01", None, now), Some(now));
    }

    #[test]
    fn garbage_is_none() {
        let now = at("2025-10-01 09:00:00");
        assert_eq!(resolve_at("not a date", None, now), None);
        assert_eq!(resolve_at("", None, now), None);
        assert_eq!(resolve_at("", Some("no dates in here"), now), None);
        assert_eq!(resolve_at("2025年13月40日", None, now), None);
    }

    #[test]
    fn falls_back_to_surrounding_text() {
        let now = at("2025-10-01 09:00:00");
        let body = "新华社北京9月30日电 记者报道 2025年9月30日 10:15 来源：新华网";
        assert_eq!(resolve_at("", Some(body), now), Some(at("2025-09-30 10:15:00")));
        assert_eq!(
            resolve_at("not a date", Some("posted 2 hours ago"), now),
            Some(at("2025-10-01 07:00:00"))
        );
    }

    #[test]
    fn text_search_prefers_explicit_dates() {
        let text = "昨天 发布 2025-09-01 12:00";
        assert_eq!(find_date_text(text), Some("2025-09-01 12:00"));
    }
}
