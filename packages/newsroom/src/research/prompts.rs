//! Prompts for the judge and ranker calls.
//!
//! Only the tags matter to the parser; the wording can change freely.

use crate::traits::{Prompt, SearchHit};

pub const JUDGE_SYSTEM_PROMPT: &str = r#"You are a news analyst deciding whether the collected articles are enough to write an in-depth report on one concrete development.

Enough material means: specific events, companies, products or policy changes, with the detail needed to cover what happened, why, the impact, and what comes next.
Not enough means: only generic industry coverage, missing background, or missing the latest developments.

Reply format:
- If the report can be written: <finish />
- If more material is needed: <keywords_to_search>keyword1,keyword2,keyword3</keywords_to_search>

Search keywords must be specific (company, product, event or policy names), at most 3, comma separated.

Report purpose: {purpose}"#;

pub const JUDGE_USER_PROMPT: &str = r#"Research iteration {iteration}.

{user_prompt}

{knowledge_base}

Reply <finish /> if these articles support a detailed analysis; otherwise name what to search for."#;

pub const RANKER_SYSTEM_PROMPT: &str = r#"Pick the most valuable search results to read in full.

Reply in this format, one URL per line:
<urls_to_crawl>
URL1
URL2
URL3
</urls_to_crawl>

Prefer, in order: the most recent coverage, authoritative outlets, relevance to the keyword, and depth. Pick at most 3."#;

pub const RANKER_USER_PROMPT: &str = r#"Search keyword: {keyword}

Results, freshest first:
{results}

Pick up to 3 URLs."#;

pub fn judge_prompt(purpose: &str, user_prompt: &str, knowledge_base: &str, iteration: u32) -> Prompt {
    Prompt::new(
        JUDGE_SYSTEM_PROMPT.replace("{purpose}", purpose),
        JUDGE_USER_PROMPT
            .replace("{iteration}", &iteration.to_string())
            .replace("{user_prompt}", user_prompt)
            .replace("{knowledge_base}", knowledge_base),
    )
    .with_temperature(0.3)
}

pub fn ranker_prompt(keyword: &str, candidates: &[&SearchHit]) -> Prompt {
    let results = candidates
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. title: {}\n   source: {}\n   snippet: {}\n   date: {}\n   url: {}\n",
                i + 1,
                hit.title,
                hit.source,
                hit.snippet,
                hit.date.as_deref().unwrap_or("unknown"),
                hit.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Prompt::new(
        RANKER_SYSTEM_PROMPT,
        RANKER_USER_PROMPT
            .replace("{keyword}", keyword)
            .replace("{results}", &results),
    )
    .with_temperature(0.2)
}
