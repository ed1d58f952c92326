use anyhow::{Context, Result};
use dotenvy::dotenv;
use openai_client::{Endpoint, SecretString};
use std::env;
use std::time::Duration;

use newsroom::AiContext;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_base_url: String,
    pub llm_api_key: Option<SecretString>,
    pub llm_model: String,
    pub serpapi_api_key: Option<SecretString>,
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let poll_seconds: u64 = env::var("NEWSROOM_POLL_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("NEWSROOM_POLL_SECONDS must be a whole number of seconds")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://newsroom.db?mode=rwc".to_string()),
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or_else(|_| {
                "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
            }),
            llm_api_key: secret("LLM_API_KEY"),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "qwen-plus".to_string()),
            serpapi_api_key: secret("SERPAPI_API_KEY"),
            poll_interval: Duration::from_secs(poll_seconds.max(1)),
        })
    }

    /// AI context for one run. A missing key yields calls that fail fast.
    pub fn ai_context(&self) -> AiContext {
        let key = self
            .llm_api_key
            .clone()
            .unwrap_or_else(|| SecretString::new(""));
        AiContext::new(Endpoint::new(&self.llm_base_url, key), &self.llm_model)
    }
}

fn secret(name: &str) -> Option<SecretString> {
    env::var(name)
        .ok()
        .map(SecretString::from)
        .filter(|s| !s.is_empty())
}
