//! Heuristic article reconstruction from a page's rendered text.
//!
//! Cleaning runs as an ordered pipeline of named rules so a deployment can
//! swap the patterns for another locale without changing the stages:
//!
//! 1. navigation-block removal
//! 2. share/UI-chrome removal
//! 3. title/trailer boundary detection
//! 4. whitespace collapse

use regex::Regex;
use std::borrow::Cow;

use super::structured::tidy;
use crate::error::{NewsroomError, Result};

/// One named regex substitution.
#[derive(Debug, Clone)]
pub struct CleanupRule {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl CleanupRule {
    /// Rule that deletes every match.
    pub fn remove(name: &'static str, pattern: &str) -> Result<Self> {
        Self::replace(name, pattern, "")
    }

    /// Rule that substitutes every match (`$1` refers to capture groups).
    pub fn replace(name: &'static str, pattern: &str, replacement: &'static str) -> Result<Self> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern).map_err(NewsroomError::InvalidPattern)?,
            replacement,
        })
    }

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(text, self.replacement)
    }
}

/// Markers used to find where the article starts and stops.
#[derive(Debug, Clone)]
pub struct Boundaries {
    /// A heading line counts as the title when it contains one of these...
    pub title_hints: Vec<&'static str>,
    /// ...or is longer than this many characters.
    pub min_title_chars: usize,

    /// Without a heading, the first long line containing one of these starts the body.
    pub lead_hints: Vec<&'static str>,
    /// Suffixes that mark a dateline ("...电").
    pub lead_suffixes: Vec<&'static str>,
    pub min_lead_chars: usize,

    /// Lines containing these are navigation, never the body start.
    pub nav_words: Vec<&'static str>,

    /// The first line after the start containing one of these ends the article.
    pub trailer_markers: Vec<&'static str>,
}

impl Default for Boundaries {
    fn default() -> Self {
        Self {
            title_hints: vec!["新华网", "评"],
            min_title_chars: 15,
            lead_hints: vec!["新华网", "记者", "日", "reporter", "reports"],
            lead_suffixes: vec!["电"],
            min_lead_chars: 20,
            nav_words: vec!["首页", "导航", "菜单", "登录", "注册", "搜索", "网站地图", "home", "login", "sign in"],
            trailer_markers: vec!["copyright", "版权所有", "制作单位", "责任编辑", "纠错", "all rights reserved"],
        }
    }
}

impl Boundaries {
    fn is_title(&self, line: &str) -> bool {
        line.starts_with('#')
            && (line.chars().count() > self.min_title_chars
                || self.title_hints.iter().any(|h| line.contains(h)))
    }

    fn is_lead(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        line.chars().count() > self.min_lead_chars
            && !self.nav_words.iter().any(|w| lower.contains(w))
            && (self.lead_hints.iter().any(|h| lower.contains(h))
                || self.lead_suffixes.iter().any(|s| line.ends_with(s)))
    }

    fn is_trailer(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.trailer_markers.iter().any(|m| lower.contains(m))
    }

    /// Slice `lines` to the article span.
    fn span<'a>(&self, lines: &'a [&'a str]) -> &'a [&'a str] {
        let start = lines
            .iter()
            .position(|l| self.is_title(l.trim()))
            .or_else(|| lines.iter().position(|l| self.is_lead(l.trim())))
            .unwrap_or(0);

        let end = lines
            .iter()
            .enumerate()
            .skip(start + 1)
            .find(|(_, l)| self.is_trailer(l.trim()))
            .map(|(i, _)| i)
            .unwrap_or(lines.len());

        &lines[start..end.max(start)]
    }
}

/// The full cleaning pipeline.
#[derive(Debug, Clone)]
pub struct CleanupRules {
    pub navigation: Vec<CleanupRule>,
    pub chrome: Vec<CleanupRule>,
    pub boundaries: Boundaries,
}

impl CleanupRules {
    /// Rules tuned for Chinese-language news portals.
    pub fn news_portal() -> Result<Self> {
        Ok(Self {
            navigation: vec![
                CleanupRule::remove("site-navigation", r"(?s)\[?首页.{0,300}?网站地图")?,
                CleanupRule::remove(
                    "channel-lists",
                    r"(?s)(?:地方频道|多语种频道|新华报刊|承建网站)\s*[*\[].{0,600}?(?:多语种频道|新华报刊|承建网站|客户端)",
                )?,
                CleanupRule::remove("mobile-navigation", r"(?s)手机版.{0,300}?站内搜索")?,
                CleanupRule::remove("link-chains", r"(?:\[[^\]\n]*\]\([^)\n]*\)\s*\*\s*){2,}\[[^\]\n]*\]\([^)\n]*\)")?,
                CleanupRule::remove("copyright-block", r"(?is)copyright.{0,300}?all rights reserved[^\n]*")?,
                CleanupRule::remove("production-credits", r"(?m)^.*(?:制作单位|版权所有)[：:].*$")?,
            ],
            chrome: vec![
                CleanupRule::remove("javascript-links", r"(?i)\(?javascript:void\([^)]*\)\)?")?,
                CleanupRule::remove("font-size-switch", r"字体[：:]\s*小\s*中\s*大")?,
                CleanupRule::remove("share-buttons", r"(?i)(?:分享到|share to)[：:][^#\n]*")?,
                CleanupRule::remove("accessibility-toggles", r"网站无障碍|无障碍浏览|PC版本?")?,
                CleanupRule::remove("images", r"!\[[^\]\n]*\]\([^)\n]*\)")?,
                CleanupRule::remove("bullet-link-lines", r"(?m)^[ \t]*[*-][ \t]*\[[^\]\n]*\]\([^)\n]*\)[ \t]*$")?,
                CleanupRule::remove("lone-link-lines", r"(?m)^[ \t]*\[[^\]\n]*\]\([^)\n]*\)[ \t]*$")?,
                CleanupRule::replace("inline-links", r"\[([^\]\n]*)\]\([^)\n]*\)", "$1")?,
                CleanupRule::remove("bare-urls", r"https?://[^\s)]+")?,
            ],
            boundaries: Boundaries::default(),
        })
    }

    /// Tidy a body captured by selectors: chrome rules and whitespace only.
    pub fn clean_structured(&self, body: &str) -> String {
        tidy(&apply_all(&self.chrome, body))
    }

    /// Rebuild an article from the page's rendered markdown.
    pub fn reconstruct(&self, rendered: &str) -> String {
        let text = apply_all(&self.navigation, rendered);
        let text = apply_all(&self.chrome, &text);

        let lines: Vec<&str> = text.lines().collect();
        let article = self.boundaries.span(&lines).join("\n");

        tidy(&article)
    }
}

fn apply_all(rules: &[CleanupRule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc).into_owned())
}
