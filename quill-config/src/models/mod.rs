use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

const REDACTED: &str = "<redacted>";

/// Fully resolved configuration for the Quill server.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Listener settings.
    pub server: ServerConfig,
    /// Upstream completion provider.
    pub completion: CompletionConfig,
    /// Cross-origin policy.
    pub cors: CorsConfig,
    /// Development mode: permissive CORS.
    pub dev_mode: bool,
    /// Provenance, not serialized.
    #[serde(skip)]
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Render the effective configuration as TOML with secrets redacted.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Host or IP to bind.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` string handed to the listener.
    pub fn bind_address(&self) -> String {
        match self.host.parse::<std::net::IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}

/// Chat-completion provider settings. `Debug` never prints the key.
#[derive(Clone, Serialize)]
pub struct CompletionConfig {
    /// Bearer token; reflections fall back when absent.
    #[serde(serialize_with = "serialize_secret")]
    pub api_key: Option<String>,
    /// OpenAI-compatible API root.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Whole-request timeout.
    #[serde(serialize_with = "serialize_duration")]
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Whether a non-blank API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Cross-origin policy applied outside dev mode.
#[derive(Debug, Clone, Serialize)]
pub struct CorsConfig {
    /// Exact origins to allow.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Whether `*` appears in the allow-list.
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin.trim() == "*")
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    /// TOML file that was loaded, if any.
    pub config_path: Option<PathBuf>,
    /// Whether a `.env` file was applied.
    pub env_file_loaded: bool,
}

fn serialize_secret<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_str(REDACTED),
        None => serializer.serialize_none(),
    }
}

fn serialize_duration<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
            },
            completion: CompletionConfig {
                api_key: Some("gsk_live_secret".into()),
                base_url: "https://api.groq.com/openai/v1".into(),
                model: "openai/gpt-oss-20b".into(),
                temperature: 0.7,
                max_tokens: 120,
                timeout: Duration::from_secs(30),
            },
            cors: CorsConfig {
                allowed_origins: vec!["http://localhost:3000".into()],
            },
            dev_mode: false,
            metadata: ConfigMetadata::default(),
        }
    }

    #[test]
    fn redacted_toml_hides_the_api_key() {
        let rendered = sample().to_redacted_toml().expect("serializable");
        assert!(!rendered.contains("gsk_live_secret"));
        assert!(rendered.contains("api_key = \"<redacted>\""));
        assert!(rendered.contains("timeout = \"30s\""));
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let rendered = format!("{:?}", sample().completion);
        assert!(!rendered.contains("gsk_live_secret"));
    }

    #[test]
    fn bind_address_formats_ipv6_hosts() {
        let server = ServerConfig {
            host: "::1".into(),
            port: 3000,
        };
        assert_eq!(server.bind_address(), "[::1]:3000");
        let named = ServerConfig {
            host: "localhost".into(),
            port: 3000,
        };
        assert_eq!(named.bind_address(), "localhost:3000");
    }
}
