use thiserror::Error;

/// Message returned to callers whose journal entry is missing or malformed.
pub const CONTENT_REQUIRED_MESSAGE: &str =
    "Content is required and must be a string";

/// Failures along the reflection path.
#[derive(Error, Debug)]
pub enum ReflectionError {
    /// The request carried no usable `content`.
    #[error("Content is required and must be a string")]
    InvalidContent,

    /// No provider API key is configured.
    #[error("completion provider API key is not configured")]
    MissingApiKey,

    /// Transport failure, including timeouts.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Upstream returned {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, for logs.
        body: String,
    },

    /// The provider answered without usable text.
    #[error("No response from completion provider")]
    EmptyCompletion,

    /// The provider's response body did not match the expected shape.
    #[error("Failed to decode completion response: {0}")]
    Decode(String),
}

impl ReflectionError {
    /// Whether the failure is the caller's fault rather than the upstream's.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidContent)
    }
}

/// Invalid visibility tracker configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisibilityError {
    /// Threshold outside `[0, 1]`.
    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),

    /// Root margin that is not valid CSS margin shorthand.
    #[error("invalid root margin '{input}': {reason}")]
    InvalidRootMargin {
        /// Rejected input.
        input: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result alias for the reflection path.
pub type Result<T> = std::result::Result<T, ReflectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_content_renders_the_client_message() {
        let err = ReflectionError::InvalidContent;
        assert_eq!(err.to_string(), CONTENT_REQUIRED_MESSAGE);
        assert!(err.is_client_error());
        assert!(!ReflectionError::EmptyCompletion.is_client_error());
    }
}
