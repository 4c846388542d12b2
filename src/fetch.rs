// src/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::ReminderConfig;

/// Where the membership page comes from. Retries are not this layer's job;
/// a failed fetch simply fails the current run.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self) -> Result<String>;
    fn name(&self) -> &'static str;
}

pub struct MembershipPage {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl MembershipPage {
    /// Serve a stored document; used by tests and offline runs.
    pub fn from_fixture(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
        }
    }

    pub fn from_url(url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }

    pub fn from_config(cfg: &ReminderConfig) -> Result<Self> {
        Self::from_url(
            &cfg.membership_url,
            &cfg.user_agent,
            Duration::from_secs(cfg.fetch_timeout_secs),
        )
    }
}

#[async_trait]
impl PageSource for MembershipPage {
    async fn fetch_html(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?
                    .error_for_status()
                    .with_context(|| format!("GET {url} non-2xx"))?;
                resp.text().await.context("membership page .text()")
            }
        }
    }

    fn name(&self) -> &'static str {
        match self.mode {
            Mode::Fixture(_) => "fixture",
            Mode::Http { .. } => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_returns_document_verbatim() {
        let page = MembershipPage::from_fixture("<h2>x</h2>");
        assert_eq!(page.fetch_html().await.unwrap(), "<h2>x</h2>");
        assert_eq!(page.name(), "fixture");
    }

    #[test]
    fn http_mode_builds_from_config() {
        let page = MembershipPage::from_config(&ReminderConfig::default()).unwrap();
        assert_eq!(page.name(), "http");
    }
}
