//! Settings Models
//!
//! Application configuration. Values are layered: built-in defaults, then the
//! TOML file, then environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use siteline_llm::ProviderConfig;
use siteline_tools::source::{DEFAULT_ACCESS_FILE, DEFAULT_SERVICE_FILE};

use crate::utils::error::{AppError, AppResult};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "siteline.toml";

pub const ENV_DATA_DIR: &str = "SITELINE_DATA_DIR";
pub const ENV_SITE_ID: &str = "SITELINE_SITE_ID";
pub const ENV_MODEL: &str = "SITELINE_MODEL";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Site the report is generated for
    pub site_id: String,
    /// Directory holding the CSV datasets
    pub data_dir: PathBuf,
    /// Access-metric file name inside `data_dir`
    pub access_file: String,
    /// Service file name inside `data_dir`
    pub service_file: String,
    /// Chat model used by every capability
    pub model: String,
    /// Chat-completions endpoint override
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Rounds the date confirmation loop may take
    pub max_date_rounds: u32,
    /// Rounds the column confirmation loop may take
    pub max_column_rounds: u32,
    /// Model turns one routing call may take
    pub max_routing_turns: u32,
    /// HTTP(S)/SOCKS proxy for provider requests
    pub proxy_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_id: "111".to_string(),
            data_dir: PathBuf::from("."),
            access_file: DEFAULT_ACCESS_FILE.to_string(),
            service_file: DEFAULT_SERVICE_FILE.to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            max_tokens: 4096,
            temperature: 0.7,
            max_date_rounds: 5,
            max_column_rounds: 5,
            max_routing_turns: 12,
            proxy_url: None,
        }
    }
}

/// Partial override from the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub site_id: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl AppConfig {
    /// Load from `path`, or from `siteline.toml` in the working directory.
    ///
    /// An explicit path must exist; the implicit file is optional.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if required {
                return Err(AppError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::config(format!("failed to parse {}: {}", path.display(), e)))?;
        tracing::debug!("[Config] loaded {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(site_id) = get(ENV_SITE_ID) {
            self.site_id = site_id;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model = model;
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
    }

    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(site_id) = update.site_id {
            self.site_id = site_id;
        }
        if let Some(dir) = update.data_dir {
            self.data_dir = dir;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(url) = update.base_url {
            self.base_url = Some(url);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.site_id.trim().is_empty() {
            return Err(AppError::config("site_id must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::config("model must not be empty"));
        }
        if self.access_file.trim().is_empty() || self.service_file.trim().is_empty() {
            return Err(AppError::config("dataset file names must not be empty"));
        }
        for (name, value) in [
            ("max_date_rounds", self.max_date_rounds),
            ("max_column_rounds", self.max_column_rounds),
            ("max_routing_turns", self.max_routing_turns),
            ("max_tokens", self.max_tokens),
        ] {
            if value == 0 {
                return Err(AppError::config(format!("{} must be at least 1", name)));
            }
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Provider settings for the given API key.
    pub fn provider_config(&self, api_key: impl Into<String>) -> ProviderConfig {
        ProviderConfig {
            api_key: Some(api_key.into()),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            proxy_url: self.proxy_url.clone(),
        }
    }
}
