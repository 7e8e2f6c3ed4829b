//! Cloud account configuration

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

const IAM_ARN_PREFIX: &str = "arn:aws:iam::";

/// One cloud account to audit.
///
/// Either `id` or `role_arn` must be set. When only the role ARN is given,
/// the account ID is read from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AccountConfig {
    pub fn from_role_arn(role_arn: impl Into<String>) -> Self {
        Self {
            role_arn: Some(role_arn.into()),
            ..Default::default()
        }
    }

    /// Resolve the account ID, preferring the explicit `id`.
    pub fn account_id(&self) -> Result<String, ConfigError> {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        match self.role_arn.as_deref() {
            Some(arn) => account_id_from_role_arn(arn)
                .map(str::to_string)
                .ok_or_else(|| ConfigError::Validation {
                    field: "accounts.role_arn".to_string(),
                    message: format!("cannot read an account ID from '{}'", arn),
                }),
            None => Err(ConfigError::MissingField("accounts.id".to_string())),
        }
    }
}

/// Extract the account ID from `arn:aws:iam::<id>:role/...`.
pub fn account_id_from_role_arn(arn: &str) -> Option<&str> {
    let rest = arn.strip_prefix(IAM_ARN_PREFIX)?;
    let (id, _) = rest.split_once(':')?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(id)
}
