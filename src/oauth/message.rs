//! Messages relayed from the consent window.
//!
//! The callback page posts exactly one of these back to its opener. The
//! wire shape matches the callback page's `postMessage` payload:
//! `{"type": "GOOGLE_AUTH_SUCCESS", "code": "..."}` or
//! `{"type": "GOOGLE_AUTH_ERROR", "error": "..."}`.

use serde::{Deserialize, Serialize};

/// Payload of a consent-window message, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessagePayload {
    /// The user consented; carries the authorization code.
    #[serde(rename = "GOOGLE_AUTH_SUCCESS")]
    Success { code: String },

    /// The provider reported an error (denied consent, bad request, ...).
    #[serde(rename = "GOOGLE_AUTH_ERROR")]
    Error { error: String },
}

/// A message received by the coordinator, with its sender origin.
///
/// Only messages whose origin equals the hosting page's origin are acted
/// on; everything else is dropped without a state change.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthMessage {
    /// Origin of the window that posted the message.
    pub origin: String,
    /// The parsed payload.
    pub payload: MessagePayload,
}

impl AuthMessage {
    /// Convenience constructor for a success message.
    pub fn success(origin: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            payload: MessagePayload::Success { code: code.into() },
        }
    }

    /// Convenience constructor for an error message.
    pub fn error(origin: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            payload: MessagePayload::Error {
                error: error.into(),
            },
        }
    }
}
