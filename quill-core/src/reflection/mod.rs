//! Mood reflections for journal entries.
//!
//! The [`MoodReflector`] owns the prompt, the completion parameters and the
//! "never show the user a hard error" policy. The upstream API is reached
//! through the [`CompletionProvider`] port; [`OpenAiCompatibleProvider`] is
//! the production adapter.

/// Validated journal entries.
pub mod entry;
/// Response vocabulary.
pub mod mood;
/// HTTP adapter for OpenAI-compatible chat APIs.
pub mod openai;
/// The completion port and its request types.
pub mod provider;
/// Prompting and fallback policy.
pub mod reflector;

pub use entry::JournalEntry;
pub use mood::{FALLBACK_SUMMARY, Mood, MoodAnalysis};
pub use openai::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, OpenAiCompatibleProvider};
pub use provider::{
    ChatMessage, ChatRole, CompletionProvider, CompletionRequest,
};
pub use reflector::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, MoodReflector,
    ReflectionSettings,
};
