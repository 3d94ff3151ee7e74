use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    /// `[server]` table.
    #[serde(default)]
    pub server: FileServerConfig,
    /// `[completion]` table.
    #[serde(default)]
    pub completion: FileCompletionConfig,
    /// `[cors]` table.
    #[serde(default)]
    pub cors: FileCorsConfig,
    /// Relaxes CORS guard rails.
    pub dev_mode: Option<bool>,
}

/// `[server]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    /// Listen host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Listen port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// `[completion]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCompletionConfig {
    /// Provider API key. Prefer `GROQ_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// OpenAI-compatible API root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Completion length cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Human-readable duration such as `"30s"` or `"1m 30s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// `[cors]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    /// Origins allowed outside dev mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    /// `SERVER_HOST`
    pub server_host: Option<String>,
    /// `SERVER_PORT`
    pub server_port: Option<u16>,
    /// `GROQ_API_KEY`
    pub api_key: Option<String>,
    /// `GROQ_BASE_URL`
    pub base_url: Option<String>,
    /// `GROQ_MODEL`
    pub model: Option<String>,
    /// `COMPLETION_TEMPERATURE`
    pub temperature: Option<f32>,
    /// `COMPLETION_MAX_TOKENS`
    pub max_tokens: Option<u32>,
    /// `COMPLETION_TIMEOUT`, humantime syntax.
    pub timeout: Option<String>,
    /// `CORS_ALLOWED_ORIGINS`, comma separated.
    pub cors_allowed_origins: Option<Vec<String>>,
    /// `DEV_MODE`
    pub dev_mode: Option<bool>,
    /// `QUILL_CONFIG_PATH`
    pub config_path: Option<PathBuf>,
}

impl EnvConfig {
    /// Read every supported variable from the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };

        Self {
            server_host: non_empty("SERVER_HOST"),
            server_port: lookup("SERVER_PORT").and_then(|s| s.trim().parse().ok()),
            api_key: non_empty("GROQ_API_KEY"),
            base_url: non_empty("GROQ_BASE_URL"),
            model: non_empty("GROQ_MODEL"),
            temperature: lookup("COMPLETION_TEMPERATURE")
                .and_then(|s| s.trim().parse().ok()),
            max_tokens: lookup("COMPLETION_MAX_TOKENS")
                .and_then(|s| s.trim().parse().ok()),
            timeout: non_empty("COMPLETION_TIMEOUT"),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_csv(&raw)),
            dev_mode: lookup("DEV_MODE").and_then(|raw| parse_bool(&raw)),
            config_path: non_empty("QUILL_CONFIG_PATH").map(PathBuf::from),
        }
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
