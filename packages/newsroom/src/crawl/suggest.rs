//! Model-assisted discovery patterns for a new listing page.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::discover::compile_pattern;
use crate::traits::{AiContext, LanguageModel, Prompt};

/// Used when the model fails or replies with something that does not compile.
pub const FALLBACK_PATTERN: &str = r#"href="([^"]*\.html[^"]*)""#;

/// Listing text beyond this many characters is not sent to the model.
pub const PAGE_SAMPLE_CHARS: usize = 3000;

pub const PATTERN_SYSTEM_PROMPT: &str = r#"You are a regular expression expert. Given a news listing page rendered as markdown, write one regex that matches the links to article detail pages. Links appear as [title](url). Capture group 1 must be the URL.

Reply with the regex on a single line and nothing else.

Example:
\((https://www\.news\.cn/comments/\d{8}/[a-f0-9]{32}/c\.html)\)

Escape dots. Do not leave character sets unclosed."#;

pub const PATTERN_USER_PROMPT: &str = r#"Listing page: {listing_url}

Requirement: match the article detail page links.

Page content:
{page}"#;

lazy_static! {
    static ref HREF_FORM: Regex = Regex::new(r#"href="\(.+\)""#).unwrap();
}

/// A discovery pattern and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSuggestion {
    pub pattern: String,
    /// False when [`FALLBACK_PATTERN`] was substituted
    pub from_model: bool,
}

impl PatternSuggestion {
    fn fallback() -> Self {
        Self {
            pattern: FALLBACK_PATTERN.to_string(),
            from_model: false,
        }
    }
}

pub fn pattern_prompt(listing_url: &str, page_text: &str) -> Prompt {
    let page: String = page_text.chars().take(PAGE_SAMPLE_CHARS).collect();
    Prompt::new(
        PATTERN_SYSTEM_PROMPT,
        PATTERN_USER_PROMPT
            .replace("{listing_url}", listing_url)
            .replace("{page}", &page),
    )
    .with_temperature(0.3)
}

/// Pull a compiling pattern out of a model reply.
///
/// Code fences and backticks are stripped. An `href="(...)"` form anywhere
/// in the reply wins; otherwise the first non-empty line is the pattern.
pub fn extract_pattern(reply: &str) -> Option<String> {
    let cleaned = reply
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .replace('`', "");

    let candidate = match HREF_FORM.find(&cleaned) {
        Some(m) => m.as_str().to_string(),
        None => cleaned.lines().map(str::trim).find(|l| !l.is_empty())?.to_string(),
    };

    compile_pattern(&candidate).ok().map(|_| candidate)
}

/// Ask the model for a discovery pattern for `listing_url`.
///
/// Never fails: any model error or unusable reply yields [`FALLBACK_PATTERN`].
pub async fn suggest_pattern(
    model: &dyn LanguageModel,
    ctx: &AiContext,
    listing_url: &str,
    page_text: &str,
) -> PatternSuggestion {
    let reply = match model.complete(ctx, &pattern_prompt(listing_url, page_text)).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(listing_url, error = %e, "Pattern suggestion failed, using fallback");
            return PatternSuggestion::fallback();
        }
    };

    match extract_pattern(&reply) {
        Some(pattern) => {
            info!(listing_url, pattern = %pattern, "Model suggested discovery pattern");
            PatternSuggestion {
                pattern,
                from_model: true,
            }
        }
        None => {
            warn!(listing_url, reply = %reply, "Suggested pattern unusable, using fallback");
            PatternSuggestion::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::discover_urls;
    use crate::testing::{test_context, ScriptedModel};

    #[test]
    fn href_form_is_taken_from_fenced_reply() {
        let reply = "```regex\nhref=\"(https://www\\.news\\.cn/tech/\\d{8}/[a-f0-9]+/c\\.html)\"\n```";
        assert_eq!(
            extract_pattern(reply).as_deref(),
            Some(r#"href="(https://www\.news\.cn/tech/\d{8}/[a-f0-9]+/c\.html)""#)
        );
    }

    #[test]
    fn bare_first_line_is_accepted() {
        let reply = "`\\((https://36kr\\.com/p/\\d+)\\)`\nThis matches article links.";
        assert_eq!(extract_pattern(reply).as_deref(), Some(r"\((https://36kr\.com/p/\d+)\)"));
    }

    #[test]
    fn uncompilable_reply_is_rejected() {
        assert_eq!(extract_pattern("href=\"([a-z\"\n"), None);
        assert_eq!(extract_pattern("   \n```\n```"), None);
    }

    #[test]
    fn fallback_pattern_compiles_and_matches_html_links() {
        let pattern = compile_pattern(FALLBACK_PATTERN).unwrap();
        let urls = discover_urls(
            &pattern,
            r#"<a href="/tech/20250911/abc/c.html">x</a> <a href="/about">y</a>"#,
            "https://www.news.cn/tech/",
        );
        assert_eq!(urls, vec!["https://www.news.cn/tech/20250911/abc/c.html"]);
    }

    #[test]
    fn prompt_caps_page_sample() {
        let page = "新".repeat(PAGE_SAMPLE_CHARS + 500);
        let prompt = pattern_prompt("https://www.news.cn/tech/", &page);

        assert!(prompt.user.contains("https://www.news.cn/tech/"));
        assert_eq!(prompt.user.matches('新').count(), PAGE_SAMPLE_CHARS);
        assert_eq!(prompt.temperature, 0.3);
    }

    #[tokio::test]
    async fn model_pattern_is_used_when_it_compiles() {
        let model = ScriptedModel::new().then_reply(r#"href="(https://www\.huxiu\.com/article/\d+\.html)""#);

        let suggestion = suggest_pattern(&model, &test_context(), "https://www.huxiu.com/", "listing").await;

        assert!(suggestion.from_model);
        assert_eq!(suggestion.pattern, r#"href="(https://www\.huxiu\.com/article/\d+\.html)""#);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn invalid_regex_falls_back() {
        let model = ScriptedModel::new().then_reply("([unclosed");

        let suggestion = suggest_pattern(&model, &test_context(), "https://www.huxiu.com/", "listing").await;

        assert_eq!(suggestion, PatternSuggestion::fallback());
    }

    #[tokio::test]
    async fn model_error_falls_back() {
        let model = ScriptedModel::new().then_fail("upstream 500");

        let suggestion = suggest_pattern(&model, &test_context(), "https://www.huxiu.com/", "listing").await;

        assert_eq!(suggestion.pattern, FALLBACK_PATTERN);
        assert!(!suggestion.from_model);
    }
}
