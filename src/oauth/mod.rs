//! Google sign-in via a consent popup.
//!
//! The flow mirrors what a browser single-page app does: open a popup on
//! Google's consent screen, wait for the callback page to relay the
//! authorization code back via a message, then hand the code to the
//! backend for the token exchange. The popup window itself is abstracted
//! behind [`PopupOpener`] so the coordinator runs unchanged in tests,
//! webviews, or a real browser shell.
//!
//! ```no_run
//! # async fn example(
//! #     client: authgate::ApiClient,
//! #     opener: &dyn authgate::oauth::PopupOpener,
//! #     messages: tokio::sync::mpsc::UnboundedReceiver<authgate::oauth::AuthMessage>,
//! # ) -> authgate::Result<()> {
//! use authgate::oauth::{GoogleAuthConfig, GoogleSignIn};
//!
//! let config = GoogleAuthConfig::new("client-id", "http://localhost:5173/auth/google/callback");
//! let signin = GoogleSignIn::new(client, config, "http://localhost:5173");
//! let tokens = signin.sign_in(opener, messages).await?;
//! # Ok(())
//! # }
//! ```

pub mod flow;
pub mod google;
pub mod message;
pub mod popup;

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

pub use flow::{FlowState, PopupFlow};
pub use google::GoogleAuthConfig;
pub use message::{AuthMessage, MessagePayload};
pub use popup::{PopupHandle, PopupOpener, POPUP_FEATURES};

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::types::TokenPair;

/// Coordinates one Google sign-in: popup, message handshake, code exchange.
///
/// On success the exchanged tokens are already persisted in the client's
/// session store.
#[derive(Debug)]
pub struct GoogleSignIn {
    client: ApiClient,
    config: GoogleAuthConfig,
    origin: String,
    poll_interval: Option<Duration>,
    timeout: Option<Duration>,
}

impl GoogleSignIn {
    /// Create a coordinator expecting callback messages from `origin`.
    pub fn new(client: ApiClient, config: GoogleAuthConfig, origin: impl Into<String>) -> Self {
        Self {
            client,
            config,
            origin: origin.into(),
            poll_interval: None,
            timeout: None,
        }
    }

    /// Create a coordinator from the application config.
    ///
    /// The expected message origin is derived from the configured
    /// frontend URL.
    pub fn from_config(client: ApiClient, config: &Config) -> Result<Self> {
        let origin = config.frontend_origin()?;
        Ok(Self::new(
            client,
            GoogleAuthConfig::from_config(config),
            origin,
        ))
    }

    /// Override the closed-popup poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Override the overall flow timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the sign-in to completion.
    ///
    /// Opens the consent popup, waits for the callback message, then
    /// exchanges the authorization code at the backend. Tokens from a
    /// successful exchange are stored in the session; any failure along
    /// the way, including the exchange itself, surfaces as an error.
    pub async fn sign_in(
        &self,
        opener: &dyn PopupOpener,
        messages: UnboundedReceiver<AuthMessage>,
    ) -> Result<TokenPair> {
        let url = self.config.authorize_url();
        debug!(origin = %self.origin, "Starting Google sign-in");

        let mut flow = PopupFlow::new(&self.origin);
        if let Some(interval) = self.poll_interval {
            flow = flow.poll_interval(interval);
        }
        if let Some(timeout) = self.timeout {
            flow = flow.timeout(timeout);
        }

        let code = flow.run(opener, messages, &url).await?;
        let tokens = self
            .client
            .google_callback(&code, &self.config.redirect_uri)
            .await?;
        info!("Google sign-in completed");
        Ok(tokens)
    }
}
