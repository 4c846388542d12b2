// src/notify/mod.rs
pub mod discord;

use anyhow::Result;
use std::sync::Mutex;

pub use discord::{DiscordNotifier, DiscordTarget};

/// Delivery channel for reminder text. Callers only send non-empty messages.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Used when no Discord credentials are configured: the message only reaches the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        tracing::info!(target: "notify", %message, "reminder (log only, Discord disabled)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Pick a channel from env:
/// 1) DISCORD_WEBHOOK_URL
/// 2) DISCORD_TOKEN + DISCORD_CHANNEL_ID
/// 3) log only
pub fn notifier_from_env() -> Box<dyn Notifier> {
    match DiscordTarget::from_env() {
        Some(target) => Box::new(DiscordNotifier::new(target)),
        None => {
            tracing::warn!("no Discord credentials in env; reminders go to the log only");
            Box::new(LogNotifier)
        }
    }
}

/// Non-blank, trimmed env value.
pub(crate) fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// --- Test helper ---
pub struct MockNotifier {
    pub sent: Mutex<Vec<String>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail: false,
        }
    }

    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("mock notifier configured to fail");
        }
        if let Ok(mut v) = self.sent.lock() {
            v.push(message.to_string());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[serial_test::serial]
    #[test]
    fn env_selection_order() {
        for k in ["DISCORD_WEBHOOK_URL", "DISCORD_TOKEN", "DISCORD_CHANNEL_ID"] {
            env::remove_var(k);
        }
        assert_eq!(notifier_from_env().name(), "log");

        env::set_var("DISCORD_TOKEN", "  tok ");
        env::set_var("DISCORD_CHANNEL_ID", "   ");
        assert_eq!(notifier_from_env().name(), "log", "blank channel id counts as missing");

        env::set_var("DISCORD_CHANNEL_ID", "123");
        assert_eq!(notifier_from_env().name(), "discord-channel");

        env::set_var("DISCORD_WEBHOOK_URL", "https://example.invalid/hook");
        assert_eq!(notifier_from_env().name(), "discord-webhook");

        for k in ["DISCORD_WEBHOOK_URL", "DISCORD_TOKEN", "DISCORD_CHANNEL_ID"] {
            env::remove_var(k);
        }
    }

    #[tokio::test]
    async fn mock_records_and_fails_on_demand() {
        let ok = MockNotifier::new();
        ok.send("hello").await.unwrap();
        assert_eq!(ok.messages(), vec!["hello".to_string()]);

        let bad = MockNotifier::failing();
        assert!(bad.send("hello").await.is_err());
        assert!(bad.messages().is_empty());
    }
}
