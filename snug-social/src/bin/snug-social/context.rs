use anyhow::{Context, Result};
use snug_social::SocialConfig;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "snug-social.toml";

/// Configuration resolved for one CLI invocation
pub struct CliContext {
    /// File the configuration came from, if any
    pub config_path: Option<PathBuf>,
    pub config: SocialConfig,
}

impl CliContext {
    /// Load an explicit config file, or search the current directory and its ancestors
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let current_dir = std::env::current_dir().context("Failed to get current directory")?;
                Self::find_from(&current_dir)
            }
        }
    }

    /// Walk up from `start` looking for `snug-social.toml`; defaults when none exists
    pub fn find_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
            if !current.pop() {
                log::debug!("no {CONFIG_FILE_NAME} above {}, using defaults", start.display());
                return Ok(Self {
                    config_path: None,
                    config: SocialConfig::default(),
                });
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SocialConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(Self {
            config_path: Some(path.to_path_buf()),
            config,
        })
    }
}
