use serde::{Deserialize, Serialize};

use crate::errors::SocialError;

/// Configuration stored in `snug-social.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialConfig {
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub engagement: EngagementSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_service")]
    pub service: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            prefix: default_prefix(),
            service: default_service(),
        }
    }
}

impl RedisSettings {
    /// Returns the connection URL, expanding a `${VAR}` placeholder from the environment.
    pub fn resolved_url(&self) -> Result<String, SocialError> {
        let url = self.url.as_str();
        if url.starts_with("${") && url.ends_with('}') {
            let var_name = &url[2..url.len() - 1];
            std::env::var(var_name)
                .map_err(|_| SocialError::invalid(format!("environment variable {var_name} not set")))
        } else {
            Ok(url.to_string())
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

fn default_prefix() -> String {
    "snug".to_string()
}

fn default_service() -> String {
    "social".to_string()
}

/// Limits applied by the engagement engine and the post service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementSettings {
    /// Attempts made when a write loses an optimistic version race.
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,
    /// Maximum characters in a post message, comment or reply.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

impl Default for EngagementSettings {
    fn default() -> Self {
        Self {
            write_attempts: default_write_attempts(),
            max_text_length: default_max_text_length(),
        }
    }
}

impl EngagementSettings {
    /// Never less than one attempt, whatever the file says.
    pub fn attempts(&self) -> u32 {
        self.write_attempts.max(1)
    }

    /// Trims `text` and enforces the non-blank and length rules.
    pub fn checked_text(&self, field: &'static str, text: Option<&str>) -> Result<String, SocialError> {
        let trimmed = text.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Err(SocialError::invalid(format!("{field} must not be empty")));
        }
        if trimmed.chars().count() > self.max_text_length {
            return Err(SocialError::invalid(format!(
                "{field} exceeds {} characters",
                self.max_text_length
            )));
        }
        Ok(trimmed.to_string())
    }
}

fn default_write_attempts() -> u32 {
    3
}

fn default_max_text_length() -> usize {
    2000
}
