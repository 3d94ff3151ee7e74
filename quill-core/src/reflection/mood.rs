use serde::{Deserialize, Serialize};

/// Summary returned whenever the upstream call cannot produce a reflection.
pub const FALLBACK_SUMMARY: &str = "I'm here to listen whenever you're ready to share more. Take care of yourself! 💙";

/// Coarse mood label attached to a reflection.
///
/// Reflections are conversational rather than classified, so the service
/// currently always reports [`Mood::Neutral`]; the other labels are part of
/// the wire vocabulary clients already understand.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Upbeat.
    Happy,
    /// Low.
    Sad,
    /// Calm, settled.
    Peaceful,
    /// Worried or tense.
    Anxious,
    /// Energised.
    Excited,
    /// Reflective.
    Thoughtful,
    /// No particular leaning. Always reported today.
    #[default]
    Neutral,
}

impl Mood {
    /// Wire name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Peaceful => "peaceful",
            Mood::Anxious => "anxious",
            Mood::Excited => "excited",
            Mood::Thoughtful => "thoughtful",
            Mood::Neutral => "neutral",
        }
    }
}

/// Body of a successful `analyze-mood` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodAnalysis {
    /// One-line reflection, or [`FALLBACK_SUMMARY`].
    pub summary: String,
    /// Mood label.
    pub mood: Mood,
}

impl MoodAnalysis {
    /// Reflection labelled [`Mood::Neutral`].
    pub fn neutral(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            mood: Mood::Neutral,
        }
    }

    /// The canned reply used when the provider fails.
    pub fn fallback() -> Self {
        Self::neutral(FALLBACK_SUMMARY)
    }

    /// Whether this is the canned reply.
    pub fn is_fallback(&self) -> bool {
        self.summary == FALLBACK_SUMMARY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analysis_serializes_with_lowercase_mood() {
        let value = serde_json::to_value(MoodAnalysis::neutral("soft rain"))
            .expect("serialize");
        assert_eq!(value, json!({ "summary": "soft rain", "mood": "neutral" }));
    }

    #[test]
    fn every_mood_label_round_trips_through_its_wire_name() {
        for mood in [
            Mood::Happy,
            Mood::Sad,
            Mood::Peaceful,
            Mood::Anxious,
            Mood::Excited,
            Mood::Thoughtful,
            Mood::Neutral,
        ] {
            let encoded = serde_json::to_value(mood).expect("serialize");
            assert_eq!(encoded, json!(mood.as_str()));
        }
    }

    #[test]
    fn fallback_is_neutral_and_recognisable() {
        let fallback = MoodAnalysis::fallback();
        assert_eq!(fallback.mood, Mood::Neutral);
        assert!(fallback.is_fallback());
        assert!(!MoodAnalysis::neutral("hello").is_fallback());
    }
}
