//! Which sources are due for a crawl.

use chrono::{DateTime, Duration, Utc};

use crate::types::SourceConfig;

/// True for an active, periodic source whose last run is absent or at
/// least one interval old. The research bucket is never due.
pub fn is_due(source: &SourceConfig, now: DateTime<Utc>) -> bool {
    if !source.active || source.frequency_seconds <= 0 || source.is_research_bucket() {
        return false;
    }
    let Some(last) = source.last_run_at else {
        return true;
    };
    // An interval too large to represent never elapses
    match Duration::try_seconds(source.frequency_seconds) {
        Some(interval) => now - last >= interval,
        None => false,
    }
}

/// Filter `sources` down to the due ones.
pub fn due_sources(sources: &[SourceConfig], now: DateTime<Utc>) -> Vec<SourceConfig> {
    sources.iter().filter(|s| is_due(s, now)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceConfig {
        SourceConfig::new("s", "https://s.example.com/", ".*").with_frequency(3600)
    }

    #[test]
    fn never_run_source_is_due() {
        assert!(is_due(&source(), Utc::now()));
    }

    #[test]
    fn due_after_interval() {
        let now = Utc::now();
        let mut s = source();
        s.last_run_at = Some(now - Duration::minutes(30));
        assert!(!is_due(&s, now));
        s.last_run_at = Some(now - Duration::hours(1));
        assert!(is_due(&s, now));
    }

    #[test]
    fn oversized_frequency_is_never_due_after_first_run() {
        let now = Utc::now();
        let mut s = source().with_frequency(i64::MAX);
        assert!(is_due(&s, now));

        s.last_run_at = Some(now - Duration::days(365));
        assert!(!is_due(&s, now));
    }

    #[test]
    fn inactive_zero_frequency_and_research_are_never_due() {
        let now = Utc::now();
        assert!(!is_due(&source().inactive(), now));
        assert!(!is_due(&source().with_frequency(0), now));

        let mut bucket = SourceConfig::research_bucket();
        bucket.active = true;
        bucket.frequency_seconds = 60;
        assert!(!is_due(&bucket, now));

        assert_eq!(due_sources(&[source(), source().inactive()], now).len(), 1);
    }
}
