//! Selector-driven field capture for common article markup.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements that wrap the article as a whole.
const CONTAINER: &str =
    "article, .article, .content, .post, main, .article-content, .news-content, .post-body";
const TITLE: &str = "h1, h2, .title, .headline, .article-title, .news-title, .post-title";
const BODY: &str = ".content, .article-body, .post-content, .news-body, .article-text, .main-content, .entry-content";
const AUTHOR: &str = ".author, .byline, .writer, .article-author, .news-author";
const DATE: &str = ".date, .publish-date, .article-date, time, .news-date, .post-date";

/// Page chrome never counted as article text.
const CHROME: &[&str] = &[
    "nav",
    "footer",
    "aside",
    "script",
    "style",
    "noscript",
    "iframe",
    "header",
    "menu",
    ".sidebar",
    ".advertisement",
    ".ad",
    ".ads",
    ".banner",
    ".breadcrumb",
    ".pagination",
    ".related",
    ".comment",
    ".comments",
    ".social",
    ".share",
    ".widget",
    ".toolbar",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "section", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "pre", "table", "tr", "figure", "figcaption",
];

lazy_static! {
    static ref SELECTORS: FieldSelectors = FieldSelectors::new();
    static ref SPACES: Regex = Regex::new(r"[ \t\u{a0}\u{3000}]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n(\s*\n)+").unwrap();
}

struct FieldSelectors {
    container: Selector,
    title: Selector,
    body: Selector,
    author: Selector,
    date: Selector,
    page_title: Selector,
    chrome: Vec<Selector>,
}

impl FieldSelectors {
    fn new() -> Self {
        let parse = |s: &str| Selector::parse(s).unwrap();
        Self {
            container: parse(CONTAINER),
            title: parse(TITLE),
            body: parse(BODY),
            author: parse(AUTHOR),
            date: parse(DATE),
            page_title: parse("title"),
            chrome: CHROME.iter().map(|s| parse(*s)).collect(),
        }
    }
}

/// Fields captured from the first article container on the page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StructuredFields {
    pub title: Option<String>,
    pub body: String,
    pub author: Option<String>,
    pub date_text: Option<String>,
}

/// Capture title, body, author, and date from article markup.
///
/// An empty `body` means the markup did not match and the caller should
/// fall back to text reconstruction.
pub fn extract_fields(document: &Html) -> StructuredFields {
    let sel = &*SELECTORS;
    let Some(container) = document.select(&sel.container).next() else {
        return StructuredFields::default();
    };

    let first_text = |selector: &Selector| {
        container
            .select(selector)
            .filter(|el| !is_chrome(el, &sel.chrome))
            .map(|el| visible_text(el, &sel.chrome))
            .find(|text| !text.is_empty())
    };

    let title = container
        .select(&sel.title)
        .map(|el| collapse(&el.text().collect::<String>()))
        .find(|t| !t.is_empty());

    StructuredFields {
        title,
        body: first_text(&sel.body).unwrap_or_default(),
        author: first_text(&sel.author),
        date_text: first_text(&sel.date),
    }
}

/// The document's `<title>`, if any.
pub fn page_title(document: &Html) -> Option<String> {
    document
        .select(&SELECTORS.page_title)
        .next()
        .map(|el| collapse(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn is_chrome(el: &ElementRef<'_>, chrome: &[Selector]) -> bool {
    chrome.iter().any(|s| s.matches(el))
}

/// Text under `root`, skipping chrome subtrees and keeping block breaks.
fn visible_text(root: ElementRef<'_>, chrome: &[Selector]) -> String {
    let mut out = String::new();
    collect_text(root, chrome, &mut out);
    tidy(&out)
}

fn collect_text(el: ElementRef<'_>, chrome: &[Selector], out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_chrome(&child_el, chrome) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&child_el.value().name());
                if block {
                    out.push('\n');
                }
                collect_text(child_el, chrome, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of spaces and blank lines, trimming each line.
pub(crate) fn tidy(text: &str) -> String {
    let spaced = SPACES.replace_all(text, " ");
    let trimmed: Vec<&str> = spaced.lines().map(str::trim).collect();
    BLANK_LINES
        .replace_all(&trimmed.join("\n"), "\n\n")
        .trim()
        .to_string()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
