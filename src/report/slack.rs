//! Threaded Slack delivery
//!
//! The header and one parent message per section are posted first; each
//! entry is then posted as a reply in its section's thread. Replies are
//! throttled to stay under Slack's rate limits. A failed parent aborts the
//! delivery, a failed reply is logged and skipped.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{Report, ReportError};
use crate::config::SlackConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub parents: usize,
    pub replies_sent: usize,
    pub replies_failed: usize,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SlackPoster {
    base_url: String,
    token: String,
    channel: String,
    throttle: Duration,
    client: Client,
}

impl SlackPoster {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        channel: impl Into<String>,
        throttle: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            channel: channel.into(),
            throttle,
            client: Client::new(),
        }
    }

    /// Build a poster from the token and channel environment variables named in config.
    pub fn from_config(config: &SlackConfig) -> Result<Self, ReportError> {
        let token = read_env(&config.token_env)?;
        let channel = read_env(&config.channel_env)?;
        Ok(Self::new(
            config.base_url.clone(),
            token,
            channel,
            Duration::from_millis(config.throttle_ms),
        ))
    }

    async fn post_message(
        &self,
        text: &str,
        blocks: Option<serde_json::Value>,
        thread_ts: Option<&str>,
    ) -> Result<String, ReportError> {
        let mut body = json!({
            "channel": self.channel,
            "text": text,
        });
        if let Some(blocks) = blocks {
            body["blocks"] = blocks;
        }
        if let Some(ts) = thread_ts {
            body["thread_ts"] = json!(ts);
        }

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Slack(format!("HTTP {}", status.as_u16())));
        }

        let reply: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Slack(format!("invalid response: {}", e)))?;

        match (reply.ok, reply.ts) {
            (true, Some(ts)) => Ok(ts),
            (true, None) => Err(ReportError::Slack("response without timestamp".to_string())),
            (false, _) => Err(ReportError::Slack(
                reply.error.unwrap_or_else(|| "unknown_error".to_string()),
            )),
        }
    }

    async fn post_parent(&self, text: &str) -> Result<String, ReportError> {
        let blocks = json!([
            { "type": "divider" },
            { "type": "section", "text": { "type": "mrkdwn", "text": text } },
        ]);
        self.post_message(text, Some(blocks), None).await
    }

    /// Post the whole report as one header plus a thread per section.
    pub async fn post(&self, report: &Report) -> Result<PostSummary, ReportError> {
        let mut summary = PostSummary::default();

        self.post_parent(&report.header).await?;
        summary.parents += 1;

        let mut threads = Vec::with_capacity(report.sections.len());
        for section in &report.sections {
            let ts = self.post_parent(&section.title()).await?;
            summary.parents += 1;
            threads.push((section, ts));
        }

        for (section, ts) in threads {
            tracing::info!(
                kind = %section.kind,
                replies = section.len(),
                "Sending throttled Slack replies"
            );
            for entry in &section.entries {
                match self.post_message(&entry.to_mrkdwn(), None, Some(&ts)).await {
                    Ok(_) => {
                        summary.replies_sent += 1;
                        if !self.throttle.is_zero() {
                            tokio::time::sleep(self.throttle).await;
                        }
                    }
                    Err(e) => {
                        summary.replies_failed += 1;
                        tracing::warn!(kind = %section.kind, id = %entry.id, error = %e, "Unable to send Slack reply");
                    }
                }
            }
        }

        Ok(summary)
    }
}

fn read_env(name: &str) -> Result<String, ReportError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ReportError::MissingEnv(name.to_string())),
    }
}
