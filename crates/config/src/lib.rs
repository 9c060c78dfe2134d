//! Configuration loading, validation, and management for ContextClaw.
//!
//! Loads configuration from `~/.contextclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Context assembly settings.
///
/// Maps directly to `~/.contextclaw/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Token budget for one assembled prompt
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// Initial number of window messages to include (messages, not pairs)
    #[serde(default = "default_keep_turns")]
    pub keep_turns: usize,

    /// Maximum number of raw messages kept in the recency window
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Maximum number of facts rendered into a prompt
    #[serde(default = "default_prompt_facts")]
    pub prompt_facts: usize,

    /// Maximum number of facts retained after cleanup
    #[serde(default = "default_max_facts")]
    pub max_facts: usize,

    /// Character cap for tool output digests
    #[serde(default = "default_digest_max_chars")]
    pub digest_max_chars: usize,
}

fn default_max_input_tokens() -> usize {
    3500
}
fn default_keep_turns() -> usize {
    4
}
fn default_window_capacity() -> usize {
    6
}
fn default_prompt_facts() -> usize {
    20
}
fn default_max_facts() -> usize {
    50
}
fn default_digest_max_chars() -> usize {
    800
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: default_max_input_tokens(),
            keep_turns: default_keep_turns(),
            window_capacity: default_window_capacity(),
            prompt_facts: default_prompt_facts(),
            max_facts: default_max_facts(),
            digest_max_chars: default_digest_max_chars(),
        }
    }
}

impl ContextConfig {
    /// Load configuration from the default location.
    ///
    /// Priority: env vars > config file > defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply env var overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_overrides(path, |name| std::env::var(name).ok())
    }

    /// Load configuration from `path`, then apply overrides resolved by
    /// `lookup` (an env var name → value function).
    pub fn load_with_overrides<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".contextclaw")
    }

    /// Apply `CONTEXTCLAW_MAX_INPUT_TOKENS` / `CONTEXTCLAW_KEEP_TURNS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, "CONTEXTCLAW_MAX_INPUT_TOKENS")? {
            self.max_input_tokens = v;
        }
        if let Some(v) = parse_override(&lookup, "CONTEXTCLAW_KEEP_TURNS")? {
            self.keep_turns = v;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_input_tokens must be > 0".into(),
            ));
        }

        // Degradation drops whole user/assistant pairs.
        if self.window_capacity == 0 || self.window_capacity % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "window_capacity must be a positive, even number of messages".into(),
            ));
        }

        if self.prompt_facts > self.max_facts {
            return Err(ConfigError::ValidationError(
                "prompt_facts must not exceed max_facts".into(),
            ));
        }

        if self.digest_max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "digest_max_chars must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn parse_override<F>(lookup: &F, name: &str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigError::ValidationError(format!("{name} must be a non-negative integer, got {raw:?}"))
        }),
        None => Ok(None),
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
