//! Report configuration

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

/// Report rendering and delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// chrono format string for creation dates
    pub date_format: String,
    pub slack: SlackConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            date_format: "%-d %b, %Y at %-I:%M%P (UTC)".to_string(),
            slack: SlackConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Reject date formats chrono cannot render.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Validation {
                field: "report.date_format".to_string(),
                message: format!("invalid date format '{}'", self.date_format),
            });
        }
        Ok(())
    }
}

/// Slack delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub base_url: String,
    /// Environment variable holding the bot token
    pub token_env: String,
    /// Environment variable holding the channel ID
    pub channel_env: String,
    /// Delay between threaded replies
    pub throttle_ms: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://slack.com/api".to_string(),
            token_env: "SLACK_BOT_TOKEN".to_string(),
            channel_env: "SLACK_CHANNEL_ID".to_string(),
            throttle_ms: 1000,
        }
    }
}
