//! Chat webhook integration for build notifications.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Serialize;

/// JSON payload accepted by the chat webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub channel: String,
    pub username: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Thin client posting chat messages to a single webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Deliver one message. Any non-success status is an error carrying the
    /// response body.
    pub async fn post(&self, message: &ChatMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .with_context(|| format!("failed to reach webhook at {}", self.url))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("webhook returned {status}: {body}"))
    }
}
