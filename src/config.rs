//! Runtime configuration for notes-stream.
//!
//! Configuration is loaded from a JSON file (falling back to defaults) and then
//! overlaid with the upstream credential and base URL from the environment.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "notes-stream", about = "Streaming study-notes generator")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address. Overrides `server.listen` from the config file.
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Upstream completion API configuration.
    pub upstream: UpstreamConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:5000").
    pub listen: String,

    /// Attach a permissive CORS layer.
    pub cors: bool,

    /// Interval for SSE keep-alive comments. `None` disables them.
    pub sse_keep_alive_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
            cors: true,
            sse_keep_alive_secs: None,
        }
    }
}

/// Upstream chat-completion API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible API, without the `/chat/completions` suffix.
    pub base_url: String,

    /// Model identifier sent with every completion request.
    pub model: String,

    /// Cap on generated tokens per request.
    pub max_completion_tokens: u32,

    /// TCP connect timeout for the upstream client.
    pub connect_timeout_secs: u64,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Environment variable that overrides `base_url` when set.
    pub base_url_env: String,

    /// API key. Never read from the config file; filled from `api_key_env`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-5-mini".to_string(),
            max_completion_tokens: 8192,
            connect_timeout_secs: 10,
            api_key_env: "AI_INTEGRATIONS_OPENAI_API_KEY".to_string(),
            base_url_env: "AI_INTEGRATIONS_OPENAI_BASE_URL".to_string(),
            api_key: None,
        }
    }
}

impl UpstreamConfig {
    /// Overlay the credential and base URL override using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key = lookup(&self.api_key_env).filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup(&self.base_url_env).filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let config: Config = serde_json::from_str(&data)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Load the file, then apply the process environment.
    pub fn from_file_and_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.upstream.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.upstream.model, "gpt-5-mini");
        assert_eq!(cfg.upstream.max_completion_tokens, 8192);
        assert!(cfg.upstream.api_key.is_none());
        assert!(cfg.server.sse_keep_alive_secs.is_none());
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [
            ("AI_INTEGRATIONS_OPENAI_API_KEY", "sk-test"),
            ("AI_INTEGRATIONS_OPENAI_BASE_URL", "http://localhost:9999/v1/"),
        ]
        .into_iter()
        .collect();

        let mut upstream = UpstreamConfig::default();
        upstream.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(upstream.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            upstream.completions_url(),
            "http://localhost:9999/v1/chat/completions"
        );
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut upstream = UpstreamConfig::default();
        upstream.apply_env(|_| Some("  ".to_string()));
        assert!(upstream.api_key.is_none());
        assert_eq!(upstream.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"upstream": {{"model": "gpt-4o-mini"}}}}"#).unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.upstream.model, "gpt-4o-mini");
        assert_eq!(cfg.upstream.max_completion_tokens, 8192);
        assert_eq!(cfg.server.listen, "0.0.0.0:5000");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.upstream.base_url, "https://api.openai.com/v1");
    }
}
