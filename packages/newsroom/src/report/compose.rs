//! Report text: the AI narrative for deep reports and the plain digest.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::research::{knowledge_base_xml, user_prompt_xml};
use crate::traits::{AiContext, LanguageModel, Prompt};
use crate::types::{KnowledgeArticle, ReportConfig};

/// Articles listed in a digest.
pub const DIGEST_LIMIT: usize = 10;
/// Characters of body shown per digest entry.
pub const PREVIEW_CHARS: usize = 200;
/// Entries in the citation list before the "more" line.
pub const CITATION_LIMIT: usize = 20;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const COMPOSER_SYSTEM_PROMPT: &str = r#"You are a news analyst writing an in-depth report on the concrete developments found in the knowledge base. Do not write a generic industry overview.

Structure:
1. Overview: what happened, who was involved, when
2. Analysis: causes, technical detail, business logic
3. Impact: on the industry, users and competitors
4. Outlook: likely next developments
5. Recommendations: concrete advice for different roles

Every section needs real content with data and examples. When citing a fact, link its source as [source](URL).

Purpose: {purpose}
Focus: {focus}"#;

pub const COMPOSER_USER_PROMPT: &str = r#"Write the detailed analysis report from the knowledge base below.

{user_prompt}

{knowledge_base}"#;

pub fn composer_prompt(report: &ReportConfig, knowledge: &[KnowledgeArticle]) -> Prompt {
    Prompt::new(
        COMPOSER_SYSTEM_PROMPT
            .replace("{purpose}", &report.purpose)
            .replace("{focus}", &report.focus),
        COMPOSER_USER_PROMPT
            .replace("{user_prompt}", &user_prompt_xml(report))
            .replace("{knowledge_base}", &knowledge_base_xml(knowledge)),
    )
    .with_temperature(0.7)
}

/// A finished report body.
#[derive(Debug, Clone)]
pub struct ComposedReport {
    pub content: String,
    /// False when the composer call failed and the digest stood in
    pub ai_narrative: bool,
}

/// Header, narrative, and citation footer for a deep report.
///
/// The composer is called once. If it fails the digest body takes the
/// narrative's place so the report still lists its material.
pub async fn compose_deep(
    model: &dyn LanguageModel,
    ctx: &AiContext,
    report: &ReportConfig,
    knowledge: &[KnowledgeArticle],
    generated_at: DateTime<Local>,
) -> ComposedReport {
    info!(report = %report.name, articles = knowledge.len(), "Composing report");

    let (narrative, ai_narrative) = match model.complete(ctx, &composer_prompt(report, knowledge)).await {
        Ok(text) if !text.trim().is_empty() => (text, true),
        Ok(_) => {
            warn!(report = %report.name, "Composer returned nothing, using digest");
            (digest_entries(knowledge), false)
        }
        Err(e) => {
            warn!(report = %report.name, error = %e, "Composer call failed, using digest");
            (digest_entries(knowledge), false)
        }
    };

    let content = format!(
        "{}{}{}",
        deep_header(report, knowledge.len(), generated_at),
        narrative.trim(),
        citation_footer(knowledge)
    );
    ComposedReport {
        content,
        ai_narrative,
    }
}

fn deep_header(report: &ReportConfig, articles: usize, generated_at: DateTime<Local>) -> String {
    format!(
        "# {} - Research Report\n\n\
         - **Generated:** {}\n\
         - **Purpose:** {}\n\
         - **Focus:** {}\n\
         - **Knowledge base:** {} articles\n\n\
         ---\n\n",
        report.name,
        generated_at.format(TIME_FORMAT),
        report.purpose,
        if report.focus.is_empty() { "-" } else { report.focus.as_str() },
        articles
    )
}

/// Per-provenance counts and the numbered citation list.
pub fn citation_footer(knowledge: &[KnowledgeArticle]) -> String {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for article in knowledge {
        *counts.entry(article.provenance.as_str()).or_insert(0) += 1;
    }

    let mut footer = format!(
        "\n\n---\n\n## Sources\n\nThis report draws on {} articles:\n\n",
        knowledge.len()
    );
    for (provenance, count) in &counts {
        footer.push_str(&format!("- **{provenance}**: {count}\n"));
    }

    footer.push_str("\n### Citations\n\n");
    for (i, article) in knowledge.iter().take(CITATION_LIMIT).enumerate() {
        let title = if article.title.is_empty() { "untitled" } else { article.title.as_str() };
        footer.push_str(&format!(
            "{}. [{}]({}) - {}\n",
            i + 1,
            title,
            article.url,
            article.provenance
        ));
    }
    if knowledge.len() > CITATION_LIMIT {
        footer.push_str(&format!("\n*{} more articles not listed*\n", knowledge.len() - CITATION_LIMIT));
    }

    footer
}

/// Plain digest of the newest articles. Needs no AI call.
pub fn digest(report: &ReportConfig, knowledge: &[KnowledgeArticle], generated_at: DateTime<Local>) -> String {
    let mut text = format!(
        "# {}\n\n\
         **Generated:** {}\n\
         **Keywords:** {}\n\
         **Time range:** {}\n\n",
        report.name,
        generated_at.format(TIME_FORMAT),
        if report.keywords.is_empty() { "-".to_string() } else { report.keywords_text() },
        report.time_range
    );

    if knowledge.is_empty() {
        text.push_str("No matching news in this period.\n");
        return text;
    }

    text.push_str(&format!("## News digest\n\n{} matching articles:\n\n", knowledge.len()));
    text.push_str(&digest_entries(knowledge));
    text
}

fn digest_entries(knowledge: &[KnowledgeArticle]) -> String {
    knowledge
        .iter()
        .take(DIGEST_LIMIT)
        .enumerate()
        .map(|(i, article)| {
            let mut entry = format!("{}. **{}**\n", i + 1, article.title);
            if let Some(author) = article.author.as_deref().filter(|a| !a.is_empty()) {
                entry.push_str(&format!("   Author: {author}\n"));
            }
            if !article.date.is_empty() {
                entry.push_str(&format!("   Date: {}\n", article.date));
            }
            entry.push_str(&format!("   Link: {}\n", article.url));
            if !article.body.is_empty() {
                entry.push_str(&format!("   Preview: {}\n", preview(&article.body)));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        format!("{}...", flat.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, ScriptedModel};

    fn kb(n: usize) -> Vec<KnowledgeArticle> {
        (1..=n)
            .map(|i| KnowledgeArticle {
                title: format!("Story {i}"),
                url: format!("https://news.example.com/{i}"),
                body: "x".repeat(250),
                provenance: if i % 2 == 0 { "crawler: a".into() } else { "search: chips".into() },
                date: "2025-09-11T08:02:00".into(),
                author: (i == 1).then(|| "Li Wei".to_string()),
            })
            .collect()
    }

    #[test]
    fn footer_counts_and_caps_citations() {
        let footer = citation_footer(&kb(23));
        assert!(footer.contains("- **search: chips**: 12"));
        assert!(footer.contains("- **crawler: a**: 11"));
        assert!(footer.contains("20. [Story 20](https://news.example.com/20) - crawler: a"));
        assert!(!footer.contains("21. [Story 21]"));
        assert!(footer.contains("*3 more articles not listed*"));
    }

    #[test]
    fn digest_lists_ten_with_previews() {
        let text = digest(&ReportConfig::new("daily", "p"), &kb(12), Local::now());
        assert!(text.contains("12 matching articles"));
        assert!(text.contains("10. **Story 10**"));
        assert!(!text.contains("11. **Story 11**"));
        assert!(text.contains("   Author: Li Wei"));
        assert!(text.contains(&format!("   Preview: {}...", "x".repeat(PREVIEW_CHARS))));
    }

    #[test]
    fn empty_digest_says_so() {
        let text = digest(&ReportConfig::new("daily", "p"), &[], Local::now());
        assert!(text.contains("No matching news"));
    }

    #[tokio::test]
    async fn composer_failure_keeps_citations() {
        let model = ScriptedModel::new().then_fail("down");
        let report = ReportConfig::new("weekly", "chips");
        let composed = compose_deep(&model, &test_context(), &report, &kb(2), Local::now()).await;

        assert!(!composed.ai_narrative);
        assert!(composed.content.starts_with("# weekly - Research Report"));
        assert!(composed.content.contains("1. **Story 1**"));
        assert!(composed.content.contains("2. [Story 2](https://news.example.com/2) - crawler: a"));
    }

    #[tokio::test]
    async fn narrative_sits_between_header_and_footer() {
        let model = ScriptedModel::new().then_reply("## Overview\n\nChips are up.");
        let report = ReportConfig::new("weekly", "chips");
        let composed = compose_deep(&model, &test_context(), &report, &kb(1), Local::now()).await;

        assert!(composed.ai_narrative);
        let narrative = composed.content.find("Chips are up.").unwrap();
        let footer = composed.content.find("## Sources").unwrap();
        assert!(narrative < footer);
        assert!(composed.content.contains("**Knowledge base:** 1 articles"));

        let prompt = &model.prompts()[0];
        assert!(prompt.user.contains("<knowledge_base>"));
    }
}
