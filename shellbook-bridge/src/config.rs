//! Runtime configuration.
//!
//! Resolution order, later wins:
//! 1. built-in defaults (Gemini's OpenAI-compatible endpoint)
//! 2. `<config_dir>/config.json`
//! 3. `SHELLBOOK_*` environment variables (a `.env` file is loaded first)

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenAI-compatible API root (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Redact API keys and bearer tokens from prompts before sending.
    pub scrub_prompts: bool,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            scrub_prompts: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// `~/.config/shellbook/config.json` on Linux, platform equivalent elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "shellbook").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Apply `SHELLBOOK_BASE_URL`, `SHELLBOOK_MODEL` and `SHELLBOOK_LOG`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SHELLBOOK_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = v;
        }
        if let Some(v) = lookup("SHELLBOOK_MODEL").filter(|v| !v.is_empty()) {
            self.model = v;
        }
        if let Some(v) = lookup("SHELLBOOK_LOG").filter(|v| !v.is_empty()) {
            self.log_level = v;
        }
    }

    /// Maximum tracing level; unknown names fall back to `INFO`.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// The API key, if its environment variable is set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}
