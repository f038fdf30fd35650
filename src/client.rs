//! Authenticated API client.
//!
//! [`ApiClient`] wraps every outbound request: it attaches a bearer token
//! when one is stored, and on a 401 performs exactly one silent refresh
//! against `auth/token/refresh/` followed by exactly one retry of the
//! original request. There is no refresh loop; a 401 on the retried
//! request surfaces as an ordinary API error.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, FieldErrors, Result};
use crate::session::{MemorySessionStore, Session, SessionStore};
use crate::types::{
    DashboardData, GoogleCallbackRequest, GoogleCallbackResponse, LoginRequest, RefreshRequest,
    RefreshResponse, RegisterRequest, TokenPair, User,
};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// API endpoints, relative to the base URL.
const LOGIN_ENDPOINT: &str = "auth/login/";
const REGISTRATION_ENDPOINT: &str = "auth/registration/";
const LOGOUT_ENDPOINT: &str = "auth/logout/";
const REFRESH_ENDPOINT: &str = "auth/token/refresh/";
const PROFILE_ENDPOINT: &str = "profile/";
const DASHBOARD_ENDPOINT: &str = "dashboard/";
const GOOGLE_CALLBACK_ENDPOINT: &str = "auth/google/callback/";

/// Auth API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session
/// store.
///
/// # Example
///
/// ```no_run
/// use authgate::ApiClient;
///
/// # async fn example() -> authgate::Result<()> {
/// let client = ApiClient::builder()
///     .base_url("http://localhost:8000/api")
///     .build()?;
///
/// client.login("alice", "hunter2").await?;
/// let profile = client.profile().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    /// HTTP client.
    http: reqwest::Client,
    /// Base URL for API requests, always with a trailing slash.
    base_url: Url,
    /// Session token storage.
    session: Session,
    /// Per-request timeout.
    timeout: Duration,
}

impl ApiClient {
    /// Create a new client builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the session (typed token storage view).
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    // ─────────────────────────────────────────────────────────────────────
    // Endpoints
    // ─────────────────────────────────────────────────────────────────────

    /// Log in with username and password; stores the returned token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let pair: TokenPair = self
            .post(LOGIN_ENDPOINT, &LoginRequest { username, password })
            .await?;
        self.inner.session.set_tokens(&pair.access, &pair.refresh)?;
        debug!("Login succeeded, session tokens stored");
        Ok(pair)
    }

    /// Register a new account; stores the returned token pair.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password1: &str,
        password2: &str,
    ) -> Result<TokenPair> {
        let pair: TokenPair = self
            .post(
                REGISTRATION_ENDPOINT,
                &RegisterRequest {
                    username,
                    email,
                    password1,
                    password2,
                },
            )
            .await?;
        self.inner.session.set_tokens(&pair.access, &pair.refresh)?;
        debug!("Registration succeeded, session tokens stored");
        Ok(pair)
    }

    /// Log out. Both tokens are cleared from the store even when the
    /// request itself fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self
            .request::<serde_json::Value, ()>(Method::POST, LOGOUT_ENDPOINT, None)
            .await;
        let cleared = self.inner.session.clear_tokens();
        result?;
        cleared
    }

    /// Fetch the authenticated user's profile.
    pub async fn profile(&self) -> Result<User> {
        self.get(PROFILE_ENDPOINT).await
    }

    /// Fetch the dashboard payload.
    pub async fn dashboard(&self) -> Result<DashboardData> {
        self.get(DASHBOARD_ENDPOINT).await
    }

    /// Exchange a Google authorization code for session tokens.
    ///
    /// Sent unauthenticated and outside the refresh/retry wrapper: this is
    /// the call that establishes the session. A 2xx response that carries
    /// no token pair is [`Error::MissingTokens`].
    pub async fn google_callback(&self, code: &str, redirect_uri: &str) -> Result<TokenPair> {
        let url = self.url(GOOGLE_CALLBACK_ENDPOINT)?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&GoogleCallbackRequest { code, redirect_uri })
            .timeout(self.inner.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        let tokens: GoogleCallbackResponse = response.json().await?;
        match (tokens.access, tokens.refresh) {
            (Some(access), Some(refresh)) => {
                self.inner.session.set_tokens(&access, &refresh)?;
                debug!("Google code exchange succeeded, session tokens stored");
                Ok(TokenPair { access, refresh })
            }
            _ => {
                warn!("Google code exchange response carried no token pair");
                Err(Error::MissingTokens)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Request machinery
    // ─────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }

    /// Make a GET request through the refresh/retry wrapper.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// Make a POST request through the refresh/retry wrapper.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Core request wrapper.
    ///
    /// Attaches the stored access token if present. On a 401 with both an
    /// attached access token and a stored refresh token, refreshes once
    /// and retries once with the new token. A request that went out
    /// unauthenticated never triggers a refresh.
    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let access = self.inner.session.access_token()?;

        let response = self
            .send(method.clone(), url.clone(), body, access.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && access.is_some() {
            if let Some(refresh) = self.inner.session.refresh_token()? {
                debug!(%url, "Got 401, attempting token refresh");
                match self.refresh_access_token(&refresh).await {
                    Ok(new_access) => {
                        self.inner.session.set_access_token(&new_access)?;
                        let retry = self.send(method, url, body, Some(&new_access)).await?;
                        return self.handle_response(retry).await;
                    }
                    Err(refresh_err) => {
                        warn!(error = %refresh_err, "Token refresh failed, clearing session");
                        self.inner.session.clear_tokens()?;
                        return Err(match refresh_err {
                            // Transport failure during refresh propagates as-is.
                            Error::Http(e) => Error::Http(e),
                            // The refresh token was rejected; surface the
                            // original 401 body.
                            _ => {
                                let errors = Self::parse_error_body(response).await;
                                Error::RefreshFailed(errors.summary())
                            }
                        });
                    }
                }
            }
        }

        self.handle_response(response).await
    }

    /// Issue a single request. No refresh, no retry.
    async fn send<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self
            .inner
            .http
            .request(method, url)
            .timeout(self.inner.timeout);
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        req.send().await.map_err(Error::from)
    }

    /// Call the refresh endpoint with the stored refresh token.
    ///
    /// Goes out unauthenticated; a non-2xx answer means the refresh token
    /// itself is no longer good.
    async fn refresh_access_token(&self, refresh: &str) -> Result<String> {
        let url = self.url(REFRESH_ENDPOINT)?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&RefreshRequest { refresh })
            .timeout(self.inner.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let errors = Self::parse_error_body(response).await;
            return Err(Error::RefreshFailed(errors.summary()));
        }

        let parsed: RefreshResponse = response.json().await?;
        debug!("Access token refreshed");
        Ok(parsed.access)
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract a structured error from a failed response.
    async fn extract_error(&self, response: Response) -> Error {
        let status = response.status().as_u16();
        let errors = Self::parse_error_body(response).await;
        Error::Api { status, errors }
    }

    async fn parse_error_body(response: Response) -> FieldErrors {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        FieldErrors::parse(&body)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session_backend", &self.inner.session.backend_name())
            .finish()
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: Option<String>,
    store: Option<Arc<dyn SessionStore>>,
    http: Option<reqwest::Client>,
    timeout: Duration,
}

impl ApiClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            store: None,
            http: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the API base URL (required).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Inject a session store. Defaults to an in-memory store.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a preconfigured HTTP client (custom TLS, proxies, ...).
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Normalize so relative joins keep the base path.
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(concat!("authgate/", env!("CARGO_PKG_VERSION")))
                .build()?,
        };

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                session: Session::new(store),
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ApiClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_with_base_url() {
        let client = ApiClientBuilder::new()
            .base_url("http://localhost:8000/api")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ApiClientBuilder::new()
            .base_url("http://localhost:8000/api/")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_url_building_keeps_base_path() {
        let client = ApiClientBuilder::new()
            .base_url("http://localhost:8000/api")
            .build()
            .unwrap();

        let url = client.url("auth/login/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/auth/login/");

        let url = client.url("/auth/login/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/auth/login/");
    }

    #[test]
    fn test_default_session_backend_is_memory() {
        let client = ApiClientBuilder::new()
            .base_url("http://localhost:8000/api")
            .build()
            .unwrap();
        assert_eq!(client.session().backend_name(), "memory");
    }
}
