//! Outbound chat delivery

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::render::Reply;
use crate::types::{BotError, Result};

/// Capability handle for posting to the chat platform
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn post(&self, reply: &Reply) -> Result<()>;

    fn name(&self) -> &str;
}

/// Posts replies to a Discord channel webhook
#[derive(Clone)]
pub struct DiscordWebhook {
    url: String,
    client: Client,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl ChatGateway for DiscordWebhook {
    async fn post(&self, reply: &Reply) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(reply)
            .send()
            .await
            .map_err(|e| BotError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Gateway(format!(
                "Discord webhook failed: {} - {}",
                status, body
            )));
        }

        debug!("Discord webhook message sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "discord_webhook"
    }
}

/// Stand-in when no webhook is configured: the message is only logged
pub struct LogGateway;

#[async_trait]
impl ChatGateway for LogGateway {
    async fn post(&self, reply: &Reply) -> Result<()> {
        let titles: Vec<&str> = reply.embeds.iter().map(|e| e.title.as_str()).collect();
        tracing::info!(
            content = reply.content.as_deref().unwrap_or(""),
            embeds = ?titles,
            "No chat gateway configured, broadcast logged only"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
