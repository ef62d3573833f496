//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.techwatch.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Document polling settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "briefing_report.md".to_string()
}

/// Analysis backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend base URL.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Extra attempts after a transport failure (0 disables retries).
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout() -> u64 {
    60 // Live briefing generation can take up to 30s; leave headroom
}

fn default_retries() -> u32 {
    2
}

/// Document polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between document polls.
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,

    /// Maximum number of polls before giving up.
    #[serde(default = "default_max_polls")]
    pub max_attempts: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
            max_attempts: default_max_polls(),
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}

fn default_max_polls() -> usize {
    12
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the per-document analysis section.
    #[serde(default = "default_true")]
    pub include_documents: bool,

    /// Maximum documents to include in the report.
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_documents: true,
            max_documents: default_max_documents(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_documents() -> usize {
    50
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".techwatch.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Backend URL - always override since it has a default in CLI
        self.backend.url = args.backend_url.clone();

        // Timeout - only override if explicitly provided via CLI
        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }

        // Polling - only override if explicitly provided via CLI
        if let Some(interval) = args.poll_interval {
            self.polling.interval_seconds = interval;
        }
        if let Some(max_polls) = args.max_polls {
            self.polling.max_attempts = max_polls;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
        if args.skip_documents {
            self.report.include_documents = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
