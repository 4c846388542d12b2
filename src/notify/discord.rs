use super::{env_value, Notifier};
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord rejects message content longer than this.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Every reminder sentence closes with the deadline in parentheses.
const SENTENCE_END: &str = ").";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscordTarget {
    /// Bot token posting into a channel.
    Channel { token: String, channel_id: String },
    Webhook(String),
}

impl DiscordTarget {
    pub fn from_env() -> Option<Self> {
        if let Some(url) = env_value("DISCORD_WEBHOOK_URL") {
            return Some(Self::Webhook(url));
        }
        match (env_value("DISCORD_TOKEN"), env_value("DISCORD_CHANNEL_ID")) {
            (Some(token), Some(channel_id)) => Some(Self::Channel { token, channel_id }),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct DiscordNotifier {
    target: DiscordTarget,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordNotifier {
    pub fn new(target: DiscordTarget) -> Self {
        Self {
            target,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    fn request(&self, payload: &MessagePayload) -> reqwest::RequestBuilder {
        let builder = match &self.target {
            DiscordTarget::Channel { token, channel_id } => self
                .client
                .post(format!("{API_BASE}/channels/{channel_id}/messages"))
                .header("Authorization", format!("Bot {token}")),
            DiscordTarget::Webhook(url) => self.client.post(url),
        };
        builder.timeout(self.timeout).json(payload)
    }

    async fn post_with_retries(&self, payload: &MessagePayload) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self.request(payload).send().await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("Discord HTTP error: {e}"),
                },
                Err(e) => anyhow!("Discord request failed: {e}"),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(attempt, error = %err, "discord send retry");
            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        for chunk in chunk_message(message, MAX_MESSAGE_CHARS) {
            self.post_with_retries(&MessagePayload { content: chunk }).await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.target {
            DiscordTarget::Channel { .. } => "discord-channel",
            DiscordTarget::Webhook(_) => "discord-webhook",
        }
    }
}

#[derive(Serialize)]
struct MessagePayload {
    content: String,
}

/// Split into pieces of at most `limit` chars, preferring to cut after a
/// sentence end (`").`"). A bare '.' is not a boundary: prices like `$99.50` stay whole.
pub fn chunk_message(message: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for piece in message.split_inclusive(SENTENCE_END) {
        let piece_len = piece.chars().count();
        if current_len + piece_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if piece_len > limit {
            // one sentence longer than the limit: hard cut
            let chars: Vec<char> = piece.chars().collect();
            for part in chars.chunks(limit) {
                chunks.push(part.iter().collect());
            }
            continue;
        }
        current.push_str(piece);
        current_len += piece_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
