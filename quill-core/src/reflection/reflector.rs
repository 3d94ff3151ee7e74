use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use super::entry::JournalEntry;
use super::mood::MoodAnalysis;
use super::provider::{ChatMessage, CompletionProvider, CompletionRequest};
use crate::error::{ReflectionError, Result};

/// Model used unless configured otherwise.
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
/// Sampling temperature used unless configured otherwise.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Completion cap used unless configured otherwise.
pub const DEFAULT_MAX_TOKENS: u32 = 120;

const SYSTEM_PROMPT: &str = "You are a compassionate AI friend and emotional guide. \
Someone is sharing their journal entry with you.\n\n\
Remember: you're having a conversation, not giving a clinical analysis. Be genuine and caring.";

/// Completion parameters used for every reflection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionSettings {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion length cap.
    pub max_tokens: u32,
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Turns journal entries into one-line reflections.
#[derive(Clone)]
pub struct MoodReflector {
    provider: Arc<dyn CompletionProvider>,
    settings: ReflectionSettings,
}

impl fmt::Debug for MoodReflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoodReflector")
            .field("provider", &"<dyn CompletionProvider>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl MoodReflector {
    /// Reflector over `provider`.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        settings: ReflectionSettings,
    ) -> Self {
        Self { provider, settings }
    }

    /// Parameters sent with every request.
    pub fn settings(&self) -> &ReflectionSettings {
        &self.settings
    }

    /// Prompt for `entry`: persona system message plus the entry.
    pub fn build_request(&self, entry: &JournalEntry) -> CompletionRequest {
        let prompt = format!(
            "Here's my journal entry for today: \"{}\"\n\n\
             What do you think? How am I feeling? Answer in one line: poetic, genuine, human, very short.",
            entry.as_str()
        );

        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// Ask the provider for a reflection, surfacing every failure.
    pub async fn try_reflect(
        &self,
        entry: &JournalEntry,
    ) -> Result<MoodAnalysis> {
        let request = self.build_request(entry);
        let response = self.provider.complete(request).await?;

        let summary = response
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(ReflectionError::EmptyCompletion)?;

        debug!(chars = summary.len(), "reflection generated");
        Ok(MoodAnalysis::neutral(summary))
    }

    /// Reflection with the fallback policy applied: upstream failures of any
    /// kind become [`MoodAnalysis::fallback`].
    pub async fn reflect(&self, entry: &JournalEntry) -> MoodAnalysis {
        match self.try_reflect(entry).await {
            Ok(analysis) => analysis,
            Err(err) => {
                error!(error = %err, "error analyzing mood; returning fallback");
                MoodAnalysis::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::mood::{FALLBACK_SUMMARY, Mood};
    use crate::reflection::provider::{ChatRole, MockCompletionProvider};

    fn reflector(mock: MockCompletionProvider) -> MoodReflector {
        MoodReflector::new(Arc::new(mock), ReflectionSettings::default())
    }

    fn entry(text: &str) -> JournalEntry {
        JournalEntry::new(text).expect("entry")
    }

    #[tokio::test]
    async fn trims_the_completion_and_reports_neutral() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .times(1)
            .returning(|_| Ok(Some("\n  Sunlight settles on a tired heart. \n".into())));

        let analysis = reflector(mock).reflect(&entry("long day")).await;
        assert_eq!(analysis.summary, "Sunlight settles on a tired heart.");
        assert_eq!(analysis.mood, Mood::Neutral);
    }

    #[tokio::test]
    async fn request_carries_fixed_parameters_and_the_entry() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .withf(|request| {
                request.model == DEFAULT_MODEL
                    && (request.temperature - 0.7).abs() < f32::EPSILON
                    && request.max_tokens == 120
                    && request.messages.len() == 2
                    && request.messages[0].role == ChatRole::System
                    && request.messages[1].role == ChatRole::User
                    && request.messages[1].content.contains("\"rainy walk\"")
            })
            .returning(|_| Ok(Some("ok".into())));

        let analysis = reflector(mock).reflect(&entry("rainy walk")).await;
        assert_eq!(analysis.summary, "ok");
    }

    #[tokio::test]
    async fn provider_error_becomes_fallback() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .returning(|_| Err(ReflectionError::MissingApiKey));

        let analysis = reflector(mock).reflect(&entry("anything")).await;
        assert_eq!(analysis.summary, FALLBACK_SUMMARY);
        assert_eq!(analysis.mood, Mood::Neutral);
    }

    #[tokio::test]
    async fn empty_or_blank_completion_becomes_fallback() {
        for response in [None, Some(String::new()), Some("   ".to_string())] {
            let mut mock = MockCompletionProvider::new();
            mock.expect_complete()
                .returning(move |_| Ok(response.clone()));

            let reflector = reflector(mock);
            assert!(matches!(
                reflector.try_reflect(&entry("x")).await,
                Err(ReflectionError::EmptyCompletion)
            ));
            assert!(reflector.reflect(&entry("x")).await.is_fallback());
        }
    }
}
