//! Client-side auth toolkit for a token-based backend.
//!
//! Provides an HTTP client that attaches bearer tokens and transparently
//! refreshes an expired access token once per request, a pluggable session
//! store for the token pair, and a popup-based Google sign-in coordinator.
//!
//! ```no_run
//! # async fn example() -> authgate::Result<()> {
//! use authgate::ApiClient;
//!
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:8000/api")
//!     .build()?;
//!
//! let tokens = client.login("alice", "hunter2").await?;
//! let user = client.profile().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod session;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::Config;
pub use error::{Error, FieldErrors, Result};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use types::{DashboardData, TokenPair, User};
