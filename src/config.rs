use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use url::Url;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which configuration settings are overridden by environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Check whether a setting key (e.g. "api.base_url") is overridden by an env var.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Get the env var name that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    /// Env var overrides are not serialized.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Backend API root, including the `/api` prefix.
    #[serde(default = "default_api_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GoogleConfig {
    /// OAuth client id. No default; sign-in is unavailable without it.
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrontendConfig {
    /// URL the app is served from; its origin gates popup messages.
    #[serde(default = "default_frontend_url")]
    pub url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            url: default_frontend_url(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:5173/auth/google/callback".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            google: GoogleConfig {
                client_id: String::new(),
                redirect_uri: default_redirect_uri(),
            },
            frontend: FrontendConfig::default(),
            env_overrides: EnvOverrides::default(),
        }
    }
}

impl Config {
    /// Build a config from defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse_opt {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    if let Ok(parsed) = val.parse() {
                        $field = Some(parsed);
                        ov.record($key, $env);
                    }
                }
            };
        }

        env_str!("api.base_url", "AUTHGATE_API_URL", self.api.base_url);
        env_parse_opt!(
            "api.timeout_secs",
            "AUTHGATE_API_TIMEOUT_SECS",
            self.api.timeout_secs
        );
        env_str!(
            "google.client_id",
            "AUTHGATE_GOOGLE_CLIENT_ID",
            self.google.client_id
        );
        env_str!(
            "google.redirect_uri",
            "AUTHGATE_REDIRECT_URI",
            self.google.redirect_uri
        );
        env_str!("frontend.url", "AUTHGATE_FRONTEND_URL", self.frontend.url);

        self.env_overrides = ov;
    }

    /// Collect every problem with the config, not just the first.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.google.client_id.is_empty() {
            errors.push(
                "google.client_id is not set (AUTHGATE_GOOGLE_CLIENT_ID); \
                 Google sign-in will not work"
                    .to_string(),
            );
        }
        if let Err(e) = Url::parse(&self.api.base_url) {
            errors.push(format!("api.base_url is not a valid URL: {e}"));
        }
        if let Err(e) = Url::parse(&self.google.redirect_uri) {
            errors.push(format!("google.redirect_uri is not a valid URL: {e}"));
        }
        if let Err(e) = Url::parse(&self.frontend.url) {
            errors.push(format!("frontend.url is not a valid URL: {e}"));
        }
        if self.api.timeout_secs == Some(0) {
            errors.push("api.timeout_secs must be greater than zero".to_string());
        }

        errors
    }

    /// Fail with all validation problems joined into one error.
    pub fn validate(&self) -> Result<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }

    /// Origin of the frontend URL, e.g. `http://localhost:5173`.
    ///
    /// Popup messages from any other origin are ignored.
    pub fn frontend_origin(&self) -> Result<String> {
        let url = Url::parse(&self.frontend.url)?;
        Ok(url.origin().ascii_serialization())
    }
}
