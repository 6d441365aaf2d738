use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Process-wide SDK configuration. Built once at startup, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: String,
    #[serde(default = "default_metrics_url")]
    pub metrics_url: String,
    #[serde(default = "default_readme_api_url")]
    pub readme_api_url: String,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Config {
            api_key: api_key.into(),
            metrics_url: default_metrics_url(),
            readme_api_url: default_readme_api_url(),
        }
    }
}

fn default_metrics_url() -> String {
    "https://metrics.readme.io/v1/request".to_string()
}

fn default_readme_api_url() -> String {
    "https://dash.readme.com/api".to_string()
}

/// Redaction and batching policy applied to every captured exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogOptions {
    /// Lowercase field/header names to keep; everything else is removed.
    /// A non-empty allowlist always takes precedence over the denylist.
    #[serde(default)]
    pub allowlist: HashSet<String>,
    /// Lowercase field/header names to redact.
    #[serde(default)]
    pub denylist: HashSet<String>,
    #[serde(default)]
    pub development: bool,
    /// Submit batches without waiting for the collector's response.
    #[serde(default)]
    pub fire_and_forget: bool,
    /// Overrides the documentation URL otherwise resolved per API key.
    #[serde(default)]
    pub base_log_url: Option<String>,
    /// Number of envelopes to buffer before a flush.
    #[serde(default = "default_buffer_length")]
    pub buffer_length: usize,
}

fn default_buffer_length() -> usize {
    1
}

impl Default for LogOptions {
    fn default() -> Self {
        LogOptions {
            allowlist: HashSet::new(),
            denylist: HashSet::new(),
            development: false,
            fire_and_forget: false,
            base_log_url: None,
            buffer_length: default_buffer_length(),
        }
    }
}
