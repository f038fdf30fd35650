//! Google consent URL construction.
//!
//! # Key Characteristics
//! - Plain authorization code flow; the backend holds the client secret
//!   and performs the code exchange
//! - Auth URL parameters: requires `access_type=offline` and
//!   `prompt=select_account`
//! - Redirect: the frontend callback route, which relays the result to
//!   the opener window
//!
//! # Endpoint
//! - Authorization: `https://accounts.google.com/o/oauth2/v2/auth`

use crate::config::Config;

/// Default authorization URL.
const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// OAuth scopes requested for sign-in.
const DEFAULT_SCOPE: &str = "openid email profile";

/// Configuration for the Google consent flow.
#[derive(Debug, Clone)]
pub struct GoogleAuthConfig {
    pub client_id: String,
    pub auth_url: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl GoogleAuthConfig {
    /// Create a config with the default Google endpoint and scopes.
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            redirect_uri: redirect_uri.into(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Create a config from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.google.client_id, &config.google.redirect_uri)
    }

    /// Build the authorization URL the consent popup should open.
    ///
    /// `access_type=offline` asks Google for a refresh token on the
    /// backend side; `prompt=select_account` always shows the account
    /// chooser.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code&access_type=offline&prompt=select_account",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scope),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleAuthConfig {
        GoogleAuthConfig::new("test-client", "http://localhost:5173/auth/google/callback")
    }

    #[test]
    fn test_authorize_url_starts_with_google() {
        assert!(config()
            .authorize_url()
            .starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    }

    #[test]
    fn test_authorize_url_contains_standard_params() {
        let url = config().authorize_url();
        assert!(url.contains("client_id=test-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=select_account"));
    }

    #[test]
    fn test_authorize_url_encodes_redirect_uri() {
        let url = config().authorize_url();
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2Fauth%2Fgoogle%2Fcallback"));
    }
}
