use serde_json::Value;

use crate::error::{ReflectionError, Result};

/// A validated journal entry: the non-empty `content` string of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry(String);

impl JournalEntry {
    /// Wrap `content`, rejecting the empty string.
    pub fn new(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if content.is_empty() {
            return Err(ReflectionError::InvalidContent);
        }
        Ok(Self(content))
    }

    /// Pull `content` out of a decoded request body.
    ///
    /// Missing, non-string and empty values are all rejected with
    /// [`ReflectionError::InvalidContent`].
    pub fn from_json(body: &Value) -> Result<Self> {
        match body.get("content") {
            Some(Value::String(content)) => Self::new(content.as_str()),
            _ => Err(ReflectionError::InvalidContent),
        }
    }

    /// The entry text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the entry text.
    pub fn into_inner(self) -> String {
        self.0
    }
}
