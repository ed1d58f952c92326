//! Candidate URL discovery on a listing page.

use indexmap::IndexSet;
use regex::Regex;
use url::Url;

use crate::error::Result;

/// Compile a source's discovery pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(pattern)?)
}

/// Apply `pattern` to the listing text and return unique URLs in order of
/// first occurrence.
///
/// Capture group 1 is the URL when the pattern has one, otherwise the whole
/// match. Relative matches are joined onto `base`; matches that still do not
/// form an http(s) URL are dropped.
pub fn discover_urls(pattern: &Regex, text: &str, base: &str) -> Vec<String> {
    let base = Url::parse(base).ok();
    let mut found = IndexSet::new();

    for caps in pattern.captures_iter(text) {
        let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
            continue;
        };
        if let Some(url) = absolutize(m.as_str().trim(), base.as_ref()) {
            found.insert(url);
        }
    }

    found.into_iter().collect()
}

fn absolutize(candidate: &str, base: Option<&Url>) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }

    let parsed = match Url::parse(candidate) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(candidate).ok()?,
        Err(_) => return None,
    };

    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}
