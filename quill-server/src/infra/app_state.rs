use std::{fmt, sync::Arc};

use anyhow::Context;
use quill_config::Config;
use quill_core::reflection::{
    CompletionProvider, MoodReflector, OpenAiCompatibleProvider,
    ReflectionSettings,
};

#[derive(Clone)]
pub struct AppState {
    pub reflector: Arc<MoodReflector>,
    pub config: Arc<Config>,
    pub provider_configured: bool,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("provider_configured", &self.provider_configured)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State backed by an arbitrary completion provider.
    pub fn new(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        let settings = ReflectionSettings {
            model: config.completion.model.clone(),
            temperature: config.completion.temperature,
            max_tokens: config.completion.max_tokens,
        };

        Self {
            reflector: Arc::new(MoodReflector::new(provider, settings)),
            provider_configured: config.completion.has_api_key(),
            config: Arc::new(config),
        }
    }

    /// State talking to the configured OpenAI-compatible endpoint.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let provider = OpenAiCompatibleProvider::new(
            config.completion.base_url.clone(),
            config.completion.api_key.clone(),
            config.completion.timeout,
        )
        .context("failed to build completion HTTP client")?;

        Ok(Self::new(config, Arc::new(provider)))
    }

    pub fn reflector(&self) -> &MoodReflector {
        &self.reflector
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
