//! Layered configuration loading: `.env`, then an optional TOML file, then
//! the process environment on top. Defaults fill whatever is left.

mod error;
/// Raw file and environment inputs.
pub mod sources;

pub use error::ConfigLoadError;

use once_cell::sync::Lazy;
use quill_core::reflection::{
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT,
};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;
use url::Url;

use crate::models::{
    CompletionConfig, Config, ConfigMetadata, CorsConfig, ServerConfig,
};
use crate::validation::{self, ConfigWarnings};
use sources::{EnvConfig, FileConfig};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![PathBuf::from("quill.toml"), PathBuf::from("config/quill.toml")]
});

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    /// The resolved configuration.
    pub config: Config,
    /// Non-fatal findings worth logging at startup.
    pub warnings: ConfigWarnings,
}

/// Explicit overrides for file discovery.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    /// TOML file to load instead of the default locations.
    pub config_path: Option<PathBuf>,
    /// `.env` file to load instead of `./.env`.
    pub env_file: Option<PathBuf>,
}

/// Resolves a [`Config`] from every configured source.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    /// Loader using the default file locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with explicit options.
    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Load this TOML file; it must exist.
    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Load this `.env` file instead of `./.env`.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env` into the process environment, then resolve the
    /// configuration from it. A missing `.env` file is not an error.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.resolve(EnvConfig::gather(), env_file_loaded)
    }

    /// Resolve against an explicit environment snapshot, leaving the process
    /// environment untouched.
    pub fn load_from_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        self.resolve(env, false)
    }

    fn resolve(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No quill.toml detected; using environment variables and defaults",
                "Create quill.toml or point QUILL_CONFIG_PATH at a configuration file",
            );
        }

        let metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };
        let config = compose_config(file_config.unwrap_or_default(), env, metadata)?;

        let guard_warnings = validation::apply_guard_rails(&config)?;
        warnings.extend(guard_warnings);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.clone(),
                None => return Ok((None, None)),
            },
        };

        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
                path: path.clone(),
                source,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| {
                ConfigLoadError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        server: file_server,
        completion: file_completion,
        cors: file_cors,
        dev_mode: file_dev_mode,
    } = file;

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
    };

    let base_url = env
        .base_url
        .or(file_completion.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    validate_base_url(&base_url)?;

    let timeout = match env.timeout.or(file_completion.timeout) {
        Some(raw) => parse_duration("completion.timeout", &raw)?,
        None => DEFAULT_TIMEOUT,
    };

    let completion = CompletionConfig {
        api_key: env
            .api_key
            .or(file_completion.api_key)
            .filter(|key| !key.trim().is_empty()),
        base_url,
        model: env
            .model
            .or(file_completion.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: env
            .temperature
            .or(file_completion.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: env
            .max_tokens
            .or(file_completion.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS),
        timeout,
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file_cors.allowed_origins)
            .unwrap_or_else(default_cors_origins),
    };

    let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

    Ok(Config {
        server,
        completion,
        cors,
        dev_mode,
        metadata,
    })
}

fn validate_base_url(value: &str) -> Result<(), ConfigLoadError> {
    let parsed =
        Url::parse(value).map_err(|err| ConfigLoadError::InvalidBaseUrl {
            value: value.to_string(),
            reason: err.to_string(),
        })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigLoadError::InvalidBaseUrl {
            value: value.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn parse_duration(
    field: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            field,
            value: raw.to_string(),
            source,
        }
    })
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}
