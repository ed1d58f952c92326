//! Deterministic freshness score for search hits.
//!
//! Used to pre-sort what the ranker model sees, and as the whole selection
//! when the ranker is unavailable.

use crate::traits::SearchHit;

const VERY_RECENT_WORDS: &[&str] = &["最新", "今日", "刚刚", "latest", "today", "just now"];
const RECENT_WORDS: &[&str] = &["近期", "最近", "recent", "recently", "new"];

/// Score one hit as of `current_year`.
///
/// +100 for a very-recent marker and +50 for a recent marker in the title
/// or snippet (each counted once), plus +90/+60/+30/+10 when a date field
/// names the current year, the previous year, two years prior, or anything
/// else.
pub fn recency_score(hit: &SearchHit, current_year: i32) -> u32 {
    let text = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    let this_year = current_year.to_string();
    let last_year = (current_year - 1).to_string();

    let mut score = 0;

    if text.contains(&this_year) || VERY_RECENT_WORDS.iter().any(|w| text.contains(w)) {
        score += 100;
    }
    if text.contains(&last_year) || RECENT_WORDS.iter().any(|w| text.contains(w)) {
        score += 50;
    }

    if let Some(date) = hit.date.as_deref().filter(|d| !d.trim().is_empty()) {
        score += if date.contains(&this_year) {
            90
        } else if date.contains(&last_year) {
            60
        } else if date.contains(&(current_year - 2).to_string()) {
            30
        } else {
            10
        };
    }

    score
}

/// Sort hits by score, highest first. Ties keep provider order.
pub fn rank_by_recency(hits: &[SearchHit], current_year: i32) -> Vec<(SearchHit, u32)> {
    let mut scored: Vec<(SearchHit, u32)> = hits
        .iter()
        .map(|h| (h.clone(), recency_score(h, current_year)))
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

/// The `limit` best URLs by score, skipping hits without one.
pub fn top_urls(ranked: &[(SearchHit, u32)], limit: usize) -> Vec<String> {
    ranked
        .iter()
        .filter(|(hit, _)| !hit.url.trim().is_empty())
        .take(limit)
        .map(|(hit, _)| hit.url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2025;

    #[test]
    fn dated_current_year_beats_plain() {
        let a = SearchHit::new("https://a.example.com").with_title("Chip report").with_date("Sep 3, 2025");
        let b = SearchHit::new("https://b.example.com").with_title("Chip report");

        assert!(recency_score(&a, YEAR) > recency_score(&b, YEAR));
        assert_eq!(recency_score(&b, YEAR), 0);

        let ranked = rank_by_recency(&[b, a], YEAR);
        assert_eq!(top_urls(&ranked, 3)[0], "https://a.example.com");
    }

    #[test]
    fn markers_count_once_each() {
        let hit = SearchHit::new("https://a.example.com")
            .with_title("最新 today latest 2025")
            .with_snippet("recent new 2024");
        assert_eq!(recency_score(&hit, YEAR), 150);
    }

    #[test]
    fn date_bands() {
        let dated = |d: &str| SearchHit::new("https://x.example.com").with_date(d);
        assert_eq!(recency_score(&dated("2025-01-02"), YEAR), 90);
        assert_eq!(recency_score(&dated("2024-01-02"), YEAR), 60);
        assert_eq!(recency_score(&dated("2023-01-02"), YEAR), 30);
        assert_eq!(recency_score(&dated("3 days ago"), YEAR), 10);
    }

    #[test]
    fn ties_keep_provider_order() {
        let hits: Vec<SearchHit> = (1..=5)
            .map(|i| SearchHit::new(format!("https://{i}.example.com")))
            .collect();
        let ranked = rank_by_recency(&hits, YEAR);
        assert_eq!(
            top_urls(&ranked, 3),
            vec!["https://1.example.com", "https://2.example.com", "https://3.example.com"]
        );
    }

    #[test]
    fn hits_without_url_are_skipped() {
        let hits = vec![
            SearchHit::default().with_title("latest"),
            SearchHit::new("https://ok.example.com"),
        ];
        let ranked = rank_by_recency(&hits, YEAR);
        assert_eq!(top_urls(&ranked, 3), vec!["https://ok.example.com"]);
    }
}
