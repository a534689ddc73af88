//! Error types for the Scarab page controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScarabError>;

/// A shared error type for the entire page controller.
///
/// Each feature isolates its own failures: a missing page element aborts
/// setup for that feature only, and telemetry errors are captured without
/// ever reaching a user-facing path. The one deliberately fatal variant is
/// `SurveyUrlMissing` — losing the terminal redirect would corrupt the
/// study, so it surfaces loudly instead of degrading.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ScarabError {
    /// A required page element was not found during feature setup
    #[error("Page element not found: {element}")]
    MissingElement { element: String },

    /// Configuration error (unreadable or invalid config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The post-survey URL is not configured; redirect must not proceed
    #[error("Survey URL is missing. Cannot proceed.")]
    SurveyUrlMissing,

    /// Event delivery to the collector endpoint failed
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScarabError {
    /// Creates a MissingElement error
    pub fn missing_element(element: impl Into<String>) -> Self {
        Self::MissingElement {
            element: element.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Telemetry error
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error must reach the user instead of being
    /// swallowed by best-effort handling.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::SurveyUrlMissing)
    }
}

impl From<serde_json::Error> for ScarabError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ScarabError::missing_element("scarcity-message");
        assert_eq!(err.to_string(), "Page element not found: scarcity-message");

        let err = ScarabError::SurveyUrlMissing;
        assert_eq!(err.to_string(), "Survey URL is missing. Cannot proceed.");
    }

    #[test]
    fn test_only_survey_url_is_user_visible() {
        assert!(ScarabError::SurveyUrlMissing.is_user_visible());
        assert!(!ScarabError::telemetry("post failed").is_user_visible());
        assert!(!ScarabError::missing_element("timer").is_user_visible());
    }
}
