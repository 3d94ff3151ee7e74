use thiserror::Error;

use super::models::Config;

/// Accepted sampling temperature range for chat completions.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// A resolved value that would make the server misbehave.
#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    /// Temperature outside [`TEMPERATURE_RANGE`].
    #[error("completion temperature {value} is outside 0.0..=2.0")]
    TemperatureOutOfRange {
        /// Rejected temperature.
        value: f32,
    },
    /// `max_tokens` of zero.
    #[error("completion max_tokens must be greater than zero")]
    ZeroMaxTokens,
    /// Zero request timeout.
    #[error("completion timeout must be greater than zero")]
    ZeroTimeout,
    /// `*` origin without dev mode.
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
}

/// A non-fatal configuration finding.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// What is off.
    pub message: String,
    /// How to fix it.
    pub hint: Option<String>,
}

/// Ordered collection of [`ConfigWarning`]s.
#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    /// Warnings in discovery order.
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    /// Record a warning without a hint.
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    /// Record a warning with a remediation hint.
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of warnings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append another collection.
    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

/// Reject dangerous values and collect warnings for suspicious ones.
pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let completion = &config.completion;

    if !TEMPERATURE_RANGE.contains(&completion.temperature) {
        return Err(ConfigGuardRailError::TemperatureOutOfRange {
            value: completion.temperature,
        });
    }
    if completion.max_tokens == 0 {
        return Err(ConfigGuardRailError::ZeroMaxTokens);
    }
    if completion.timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroTimeout);
    }

    if !config.dev_mode && config.cors.is_wildcard_included() {
        return Err(ConfigGuardRailError::DangerousCorsWildcard);
    }

    if !completion.has_api_key() {
        warnings.push_with_hint(
            "GROQ_API_KEY not configured; every reflection will use the fallback reply",
            "Set GROQ_API_KEY or add completion.api_key to the config file",
        );
    }

    if config.cors.allowed_origins.is_empty() {
        warnings.push(
            "No CORS origins configured; browsers on other origins cannot call the API",
        );
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CompletionConfig, ConfigMetadata, CorsConfig, ServerConfig,
    };
    use std::time::Duration;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3000,
            },
            completion: CompletionConfig {
                api_key: Some("key".into()),
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
    fn complete_config_passes_without_warnings() {
        let warnings = apply_guard_rails(&config()).expect("valid");
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_api_key_is_only_a_warning() {
        let mut config = config();
        config.completion.api_key = Some("   ".into());
        let warnings = apply_guard_rails(&config).expect("valid");
        assert_eq!(warnings.len(), 1);
        assert!(warnings.items[0].message.contains("GROQ_API_KEY"));
    }

    #[test]
    fn rejects_out_of_range_completion_parameters() {
        let mut hot = config();
        hot.completion.temperature = 2.5;
        assert!(matches!(
            apply_guard_rails(&hot),
            Err(ConfigGuardRailError::TemperatureOutOfRange { .. })
        ));

        let mut silent = config();
        silent.completion.max_tokens = 0;
        assert!(matches!(
            apply_guard_rails(&silent),
            Err(ConfigGuardRailError::ZeroMaxTokens)
        ));

        let mut instant = config();
        instant.completion.timeout = Duration::ZERO;
        assert!(matches!(
            apply_guard_rails(&instant),
            Err(ConfigGuardRailError::ZeroTimeout)
        ));
    }

    #[test]
    fn wildcard_cors_requires_dev_mode() {
        let mut config = config();
        config.cors.allowed_origins = vec!["*".into()];
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::DangerousCorsWildcard)
        ));

        config.dev_mode = true;
        assert!(apply_guard_rails(&config).is_ok());
    }
}
