//! Endpoint and credential values passed into every call.
//!
//! The client holds no credentials of its own. Callers build an [`Endpoint`]
//! once per run and hand it to each request, so two runs with different
//! providers never observe each other's settings.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use in a request header or query.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where and how to reach an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: String,
    api_key: SecretString,
}

impl Endpoint {
    /// Create an endpoint for any OpenAI-compatible base URL
    /// (e.g. `https://dashscope.aliyuncs.com/compatible-mode/v1`).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<SecretString>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// The public OpenAI API.
    pub fn openai(api_key: impl Into<SecretString>) -> Self {
        Self::new("https://api.openai.com/v1", api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted() {
        let key = SecretString::new("sk-live-123");
        assert_eq!(format!("{:?}", key), "[REDACTED]");
        assert_eq!(format!("{}", key), "[REDACTED]");
        assert_eq!(key.expose(), "sk-live-123");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let endpoint = Endpoint::new("https://llm.example.com/v1/", "key");
        assert_eq!(
            endpoint.chat_completions_url(),
            "https://llm.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn endpoint_debug_hides_key() {
        let endpoint = Endpoint::openai("sk-secret");
        let debug = format!("{:?}", endpoint);
        assert!(!debug.contains("sk-secret"));
    }
}
