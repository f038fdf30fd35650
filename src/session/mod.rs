//! Session stores for persisting auth tokens.
//!
//! Provides the [`SessionStore`] trait and two implementations:
//! - [`FileSessionStore`] - single JSON file with 0600 permissions
//! - [`MemorySessionStore`] - in-memory, for tests and ephemeral sessions
//!
//! Tokens live under the fixed keys [`ACCESS_TOKEN_KEY`] and
//! [`REFRESH_TOKEN_KEY`]. The [`Session`] facade wraps a store with typed
//! accessors so the rest of the crate never touches raw keys.

mod file;
mod memory;

use std::sync::Arc;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::error::Result;

/// Storage key for the short-lived access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the longer-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Trait for session storage backends.
///
/// A deliberately small string key/value surface so real browser-profile
/// storage, files, or test fakes can all sit behind it. Implementations
/// must be thread-safe (`Send + Sync`).
pub trait SessionStore: Send + Sync {
    /// Get the stored value for a key, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value under a key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value for a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove all stored values.
    fn clear(&self) -> Result<()>;

    /// Name of this storage backend.
    fn name(&self) -> &str;
}

// Blanket implementation for Arc<T>
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

// Blanket implementation for Box<T>
impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Typed view over a session store.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Wrap a storage backend.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The stored access token, if any.
    pub fn access_token(&self) -> Result<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    /// The stored refresh token, if any.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Store a full token pair (after login, registration, or OAuth).
    pub fn set_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        self.store.set(REFRESH_TOKEN_KEY, refresh)
    }

    /// Replace only the access token (after a refresh).
    pub fn set_access_token(&self, access: &str) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access)
    }

    /// Drop both tokens (logout, or a failed refresh).
    pub fn clear_tokens(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.store.name()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.store.name())
            .finish()
    }
}
