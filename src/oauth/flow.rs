//! The consent popup state machine.
//!
//! One sign-in attempt moves `Idle → PopupOpen` when the popup opens, and
//! from `PopupOpen` to exactly one terminal state:
//!
//! - `Succeeded`: a same-origin success message delivered the code
//! - `Failed`: a same-origin error message, or the flow timed out
//! - `Cancelled`: the popup was closed before any message arrived
//!
//! Messages from foreign origins are dropped without a transition.
//! [`PopupFlow::run`] consumes the flow, so a finished attempt cannot
//! transition again; the message listener and the polling timer are
//! dropped on every terminal path.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use super::message::{AuthMessage, MessagePayload};
use super::popup::PopupOpener;
use crate::error::{Error, Result};

/// How often the popup's closed state is polled.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long to wait for a terminal message before giving up.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// States of one sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// No popup yet.
    Idle,
    /// Popup open, waiting for a message or closure.
    PopupOpen,
    /// Terminal: authorization code received.
    Succeeded,
    /// Terminal: provider error or timeout.
    Failed,
    /// Terminal: popup closed by the user before any message.
    Cancelled,
}

impl FlowState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// One cancellable sign-in attempt.
///
/// Parameterized by the expected message origin, the closed-popup poll
/// interval, and an overall timeout.
#[derive(Debug)]
pub struct PopupFlow {
    /// Origin messages must carry to be acted on.
    origin: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl PopupFlow {
    /// Create a flow expecting messages from the given origin.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the closed-popup poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the overall flow timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the flow to a terminal state and return the authorization code.
    ///
    /// Opens the popup via `opener`, then waits on `messages` for the
    /// first same-origin terminal payload, polling the popup's closed
    /// state in between. The popup is closed and all listeners are torn
    /// down on every exit path.
    pub async fn run(
        self,
        opener: &dyn PopupOpener,
        mut messages: UnboundedReceiver<AuthMessage>,
        url: &str,
    ) -> Result<String> {
        let mut popup = opener.open(url)?;
        debug!(state = ?FlowState::PopupOpen, "Consent popup opened");

        let mut poll = tokio::time::interval(self.poll_interval);
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                msg = messages.recv() => match msg {
                    Some(msg) if msg.origin == self.origin => match msg.payload {
                        MessagePayload::Success { code } => {
                            debug!(state = ?FlowState::Succeeded, "Authorization code received");
                            break Ok(code);
                        }
                        MessagePayload::Error { error } => {
                            debug!(state = ?FlowState::Failed, %error, "Provider reported an error");
                            break Err(Error::Provider(error));
                        }
                    },
                    Some(msg) => {
                        // Not a transition.
                        debug!(origin = %msg.origin, "Ignoring message from foreign origin");
                    }
                    None => {
                        debug!(state = ?FlowState::Cancelled, "Message channel closed");
                        break Err(Error::Cancelled);
                    }
                },
                _ = poll.tick() => {
                    if popup.is_closed() {
                        debug!(state = ?FlowState::Cancelled, "Popup closed before any message");
                        break Err(Error::Cancelled);
                    }
                }
                _ = &mut deadline => {
                    debug!(state = ?FlowState::Failed, "Flow timed out");
                    break Err(Error::FlowTimeout);
                }
            }
        };

        popup.close();
        // `messages` and the poll timer drop here; `run` consumed the
        // flow, so a terminal attempt cannot be restarted.
        outcome
    }
}
