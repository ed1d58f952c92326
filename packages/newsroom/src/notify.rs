//! Webhook delivery for composed reports.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{NewsroomError, Result};
use crate::traits::{Notification, Notifier};
use crate::types::NotifierKind;

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts markdown messages to chat-bot webhooks.
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| NewsroomError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// Markdown body with the title as a level-2 heading.
fn markdown(notification: &Notification) -> String {
    format!("## {}\n\n{}", notification.title, notification.body)
}

/// Request body for the destination's webhook dialect.
pub fn payload(notification: &Notification) -> Value {
    let text = markdown(notification);
    match notification.kind {
        NotifierKind::WeChat => json!({
            "msgtype": "markdown",
            "markdown": { "content": text }
        }),
        NotifierKind::Jinshan => json!({
            "msgtype": "markdown",
            "markdown": { "text": text }
        }),
    }
}

/// WeChat answers 200 even on rejection; `errcode` says what happened.
pub fn check_wechat_reply(reply: &Value) -> Result<()> {
    match reply.get("errcode").and_then(Value::as_i64) {
        Some(0) => Ok(()),
        code => Err(NewsroomError::Notify(format!(
            "wechat rejected message (errcode {}): {}",
            code.map(|c| c.to_string()).unwrap_or_else(|| "missing".into()),
            reply.get("errmsg").and_then(Value::as_str).unwrap_or("")
        ))),
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&notification.destination)
            .json(&payload(notification))
            .send()
            .await
            .map_err(|e| {
                warn!(kind = %notification.kind, error = %e, "Webhook request failed");
                NewsroomError::Notify(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(kind = %notification.kind, status = %status, "Webhook returned error status");
            return Err(NewsroomError::Notify(format!("HTTP {status}")));
        }

        if notification.kind == NotifierKind::WeChat {
            let reply: Value = response
                .json()
                .await
                .map_err(|e| NewsroomError::Notify(format!("unreadable wechat reply: {e}")))?;
            check_wechat_reply(&reply)?;
        }

        info!(kind = %notification.kind, title = %notification.title, "Notification sent");
        Ok(())
    }
}
