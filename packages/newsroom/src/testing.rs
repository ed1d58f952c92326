//! Test doubles for the collaborator traits.
//!
//! These let crawl, research, and report runs execute without network or
//! model access. Every double records what it was asked for.

use async_trait::async_trait;
use openai_client::Endpoint;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult, NewsroomError, Result};
use crate::traits::{AiContext, ContentExtractor, LanguageModel, Notification, Notifier, Prompt};
use crate::types::ExtractedArticle;

/// An AI context pointing nowhere, for doubles that ignore it.
pub fn test_context() -> AiContext {
    AiContext::new(Endpoint::new("http://llm.test/v1", "test-key"), "test-model")
}

#[derive(Debug, Clone)]
struct ScriptedFailure {
    /// `None` fails forever
    remaining: Option<u32>,
    error: FetchError,
}

/// Extractor serving canned listings and articles.
///
/// Unknown URLs fail with HTTP 404.
#[derive(Default, Clone)]
pub struct MockExtractor {
    listings: Arc<RwLock<HashMap<String, String>>>,
    articles: Arc<RwLock<HashMap<String, ExtractedArticle>>>,
    failures: Arc<RwLock<HashMap<String, ScriptedFailure>>>,

    /// Call tracking for assertions
    attempts: Arc<RwLock<HashMap<String, u32>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` as the rendered listing at `url`.
    pub fn set_listing(&self, url: &str, text: &str) {
        self.listings
            .write()
            .unwrap()
            .insert(url.to_string(), text.to_string());
    }

    pub fn add_article(&self, article: ExtractedArticle) {
        self.articles
            .write()
            .unwrap()
            .insert(article.url.clone(), article);
    }

    /// Fail the next `times` calls for `url`, then behave normally.
    pub fn fail_times(&self, url: &str, times: u32, error: FetchError) {
        self.failures.write().unwrap().insert(
            url.to_string(),
            ScriptedFailure {
                remaining: Some(times),
                error,
            },
        );
    }

    /// Fail every call for `url`.
    pub fn always_fail(&self, url: &str, error: FetchError) {
        self.failures.write().unwrap().insert(
            url.to_string(),
            ScriptedFailure {
                remaining: None,
                error,
            },
        );
    }

    /// Calls made for `url`, render and extract combined.
    pub fn attempts(&self, url: &str) -> u32 {
        self.attempts.read().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Every URL requested, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    fn begin(&self, url: &str) -> FetchResult<()> {
        *self
            .attempts
            .write()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
        self.calls.write().unwrap().push(url.to_string());

        let mut failures = self.failures.write().unwrap();
        let Some(failure) = failures.get_mut(url) else {
            return Ok(());
        };
        match failure.remaining {
            None => Err(failure.error.clone()),
            Some(0) => Ok(()),
            Some(n) => {
                failure.remaining = Some(n - 1);
                Err(failure.error.clone())
            }
        }
    }

    fn not_found(url: &str) -> FetchError {
        FetchError::Status {
            url: url.to_string(),
            status: 404,
        }
    }
}

#[async_trait]
impl ContentExtractor for MockExtractor {
    async fn render(&self, url: &str) -> FetchResult<String> {
        self.begin(url)?;
        self.listings
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }

    async fn extract(&self, url: &str) -> FetchResult<ExtractedArticle> {
        self.begin(url)?;
        self.articles
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }
}

/// Language model replaying queued replies in order.
///
/// Once the queue is empty it answers with the fallback reply, or fails
/// when none is set.
#[derive(Default, Clone)]
pub struct ScriptedModel {
    replies: Arc<RwLock<VecDeque<std::result::Result<String, String>>>>,
    fallback: Option<String>,

    /// Call tracking for assertions
    prompts: Arc<RwLock<Vec<Prompt>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.replies.write().unwrap().push_back(Ok(reply.into()));
        self
    }

    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.replies.write().unwrap().push_back(Err(message.into()));
        self
    }

    /// Reply used after the queue runs dry.
    pub fn otherwise(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.read().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _ctx: &AiContext, prompt: &Prompt) -> Result<String> {
        self.prompts.write().unwrap().push(prompt.clone());

        let next = self.replies.write().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(NewsroomError::AI(message.into())),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| NewsroomError::AI("no scripted reply left".into())),
        }
    }
}

/// Notifier that keeps what it was sent.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<Notification>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.sent.write().unwrap().push(notification.clone());
        if self.fail {
            return Err(NewsroomError::Notify("webhook rejected the message".into()));
        }
        Ok(())
    }
}
