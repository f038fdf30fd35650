//! Error types for the authgate client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the client and the sign-in flow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (connection refused, DNS, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx API response with a parsed Django-style error body.
    #[error("API error ({status}): {}", errors.summary())]
    Api { status: u16, errors: FieldErrors },

    /// The refresh endpoint rejected the stored refresh token.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The consent popup could not be opened.
    #[error("Popup blocked")]
    PopupBlocked,

    /// The consent popup was closed before any message arrived.
    #[error("Sign-in cancelled by user")]
    Cancelled,

    /// No terminal message arrived within the flow timeout.
    #[error("Sign-in flow timed out")]
    FlowTimeout,

    /// The consent window reported a provider-side error.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The code exchange succeeded but the response carried no token pair.
    #[error("Backend response missing session tokens")]
    MissingTokens,

    /// Session store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Django-style field-level validation errors.
///
/// Bodies look like `{"username": ["This field is required."]}`, with the
/// special keys `non_field_errors` and `detail` for errors not tied to a
/// single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldErrors {
    /// Single human-readable message (`{"detail": "..."}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Alternate single-message key used by the OAuth callback endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Errors that do not belong to any field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_field_errors: Vec<String>,

    /// Per-field error messages.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Build from a bare message, for bodies that are not field maps.
    pub fn from_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::default()
        }
    }

    /// Parse a response body, falling back to treating it as plain text.
    pub fn parse(body: &str) -> Self {
        if let Ok(parsed) = serde_json::from_str::<FieldErrors>(body) {
            if !parsed.is_empty() {
                return parsed;
            }
        }
        Self::from_detail(body.trim())
    }

    /// True when no message of any kind is present.
    pub fn is_empty(&self) -> bool {
        self.detail.is_none()
            && self.error.is_none()
            && self.non_field_errors.is_empty()
            && self.fields.is_empty()
    }

    /// Messages for a specific field, if any.
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// One-line summary for display and logging.
    pub fn summary(&self) -> String {
        if let Some(detail) = &self.detail {
            return detail.clone();
        }
        if let Some(error) = &self.error {
            return error.clone();
        }
        if !self.non_field_errors.is_empty() {
            return self.non_field_errors.join("; ");
        }
        if !self.fields.is_empty() {
            return self
                .fields
                .iter()
                .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
                .collect::<Vec<_>>()
                .join("; ");
        }
        "unknown error".to_string()
    }
}

impl Error {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
