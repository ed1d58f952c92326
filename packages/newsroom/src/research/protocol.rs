//! Tagged-text protocol spoken with the judge and ranker models.
//!
//! Requests embed the knowledge base as XML-ish text. Replies are scanned
//! for a small set of tags; anything that does not parse resolves to
//! [`Action::Finish`].

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::types::{KnowledgeArticle, ReportConfig};

/// Characters of article body sent per article.
pub const BODY_CHAR_LIMIT: usize = 2000;

/// URLs taken from one ranker reply.
pub const RANKED_URL_LIMIT: usize = 3;

lazy_static! {
    static ref KEYWORDS_BLOCK: Regex =
        Regex::new(r"(?s)<keywords_to_search>(.*?)</keywords_to_search>").unwrap();
    static ref URLS_BLOCK: Regex = Regex::new(r"(?s)<urls_to_crawl>(.*?)</urls_to_crawl>").unwrap();
}

/// What the judge asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Finish,
    Search { keywords: Vec<String> },
}

/// A parsed judge reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub rationale: String,
}

impl Decision {
    pub fn finish(rationale: impl Into<String>) -> Self {
        Self {
            action: Action::Finish,
            rationale: rationale.into(),
        }
    }

    pub fn search(keywords: Vec<String>, rationale: impl Into<String>) -> Self {
        Self {
            action: Action::Search { keywords },
            rationale: rationale.into(),
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self.action, Action::Finish)
    }
}

/// Escape the five XML-reserved characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize the knowledge base, numbering articles from 1.
pub fn knowledge_base_xml(articles: &[KnowledgeArticle]) -> String {
    let mut xml = String::from("<knowledge_base>\n");
    for (i, article) in articles.iter().enumerate() {
        let body: String = article.body.chars().take(BODY_CHAR_LIMIT).collect();
        xml.push_str(&format!("<article id='{}'>\n", i + 1));
        xml.push_str(&format!("<title>{}</title>\n", escape_xml(&article.title)));
        xml.push_str(&format!("<url>{}</url>\n", escape_xml(&article.url)));
        xml.push_str(&format!("<source>{}</source>\n", escape_xml(&article.provenance)));
        xml.push_str(&format!("<date>{}</date>\n", escape_xml(&article.date)));
        xml.push_str(&format!("<content>{}</content>\n", escape_xml(&body)));
        xml.push_str("</article>\n");
    }
    xml.push_str("</knowledge_base>");
    xml
}

/// The report's goals as sent to the judge and composer.
pub fn user_prompt_xml(report: &ReportConfig) -> String {
    format!(
        "<user_prompt>\n<report_purpose>{}</report_purpose>\n<research_focus>{}</research_focus>\n<filter_keywords>{}</filter_keywords>\n</user_prompt>",
        escape_xml(&report.purpose),
        escape_xml(&report.focus),
        escape_xml(&report.keywords_text()),
    )
}

/// Parse a judge reply. Never fails: unknown shapes mean finish.
pub fn parse_decision(reply: &str) -> Decision {
    let reply = reply.trim();

    if reply.contains("<finish />") || reply.contains("<finish/>") {
        return Decision::finish("judge reports the material is sufficient");
    }

    if let Some(caps) = KEYWORDS_BLOCK.captures(reply) {
        let keywords: Vec<String> = caps[1]
            .split([',', '，'])
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        if keywords.is_empty() {
            return Decision::finish("judge asked to search but named no keywords");
        }
        let rationale = format!("judge asked to search: {}", keywords.join(", "));
        return Decision::search(keywords, rationale);
    }

    Decision::finish("unrecognized judge reply")
}

/// Parse a ranker reply into at most [`RANKED_URL_LIMIT`] URLs.
///
/// `None` when the reply has no block or the block holds no http(s) line.
pub fn parse_ranked_urls(reply: &str) -> Option<Vec<String>> {
    let caps = URLS_BLOCK.captures(reply)?;
    let urls: Vec<String> = caps[1]
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("http://") || l.starts_with("https://"))
        .take(RANKED_URL_LIMIT)
        .map(str::to_string)
        .collect();

    (!urls.is_empty()).then_some(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, body: &str) -> KnowledgeArticle {
        KnowledgeArticle {
            title: title.into(),
            url: "https://news.example.com/a?x=1&y=2".into(),
            body: body.into(),
            provenance: "crawler: example".into(),
            date: "2025-09-11T08:02:00".into(),
            author: None,
        }
    }

    #[test]
    fn finish_marker_in_either_form() {
        assert!(parse_decision("<finish />").is_finish());
        assert!(parse_decision("ok then <finish/> done").is_finish());
    }

    #[test]
    fn keywords_block_becomes_search() {
        let decision = parse_decision("<keywords_to_search>OpenAI o3, 英伟达财报，Apple M5</keywords_to_search>");
        assert_eq!(
            decision.action,
            Action::Search {
                keywords: vec!["OpenAI o3".into(), "英伟达财报".into(), "Apple M5".into()]
            }
        );
    }

    #[test]
    fn finish_wins_over_keywords() {
        let decision = parse_decision("<finish /><keywords_to_search>a</keywords_to_search>");
        assert!(decision.is_finish());
    }

    #[test]
    fn empty_keywords_or_garbage_means_finish() {
        assert!(parse_decision("<keywords_to_search> , </keywords_to_search>").is_finish());
        assert!(parse_decision("I think we need more about chips.").is_finish());
        assert!(parse_decision("").is_finish());
        assert!(parse_decision("<keywords_to_search>unterminated").is_finish());
    }

    #[test]
    fn ranker_block_takes_first_three_http_lines() {
        let reply = "<urls_to_crawl>\n1. https://skip.example.com\nhttps://a.example.com\nnot a url\nhttp://b.example.com\nhttps://c.example.com\nhttps://d.example.com\n</urls_to_crawl>";
        assert_eq!(
            parse_ranked_urls(reply).unwrap(),
            vec!["https://a.example.com", "http://b.example.com", "https://c.example.com"]
        );
    }

    #[test]
    fn ranker_without_block_is_none() {
        assert_eq!(parse_ranked_urls("https://a.example.com"), None);
        assert_eq!(parse_ranked_urls("<urls_to_crawl>none</urls_to_crawl>"), None);
    }

    #[test]
    fn knowledge_base_escapes_and_caps_body() {
        let long_body = "字".repeat(BODY_CHAR_LIMIT + 50);
        let xml = knowledge_base_xml(&[article("A <b> & \"c\" 'd'", &long_body)]);

        assert!(xml.starts_with("<knowledge_base>\n<article id='1'>"));
        assert!(xml.contains("<title>A &lt;b&gt; &amp; &quot;c&quot; &#39;d&#39;</title>"));
        assert!(xml.contains("<url>https://news.example.com/a?x=1&amp;y=2</url>"));
        assert!(xml.contains("<source>crawler: example</source>"));
        assert!(xml.contains(&format!("<content>{}</content>", "字".repeat(BODY_CHAR_LIMIT))));
        assert!(xml.ends_with("</knowledge_base>"));
    }

    #[test]
    fn user_prompt_carries_report_goals() {
        let report = ReportConfig::new("weekly", "track AI chips")
            .with_focus("supply chain")
            .with_keywords("AI,芯片");
        let xml = user_prompt_xml(&report);
        assert!(xml.contains("<report_purpose>track AI chips</report_purpose>"));
        assert!(xml.contains("<research_focus>supply chain</research_focus>"));
        assert!(xml.contains("<filter_keywords>AI,芯片</filter_keywords>"));
    }
}
