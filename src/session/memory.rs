//! In-memory session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::instrument;

use super::SessionStore;
use crate::error::Result;

/// In-memory session store.
///
/// Uses `Arc<RwLock<HashMap>>` for thread-safe access. Clones share the
/// same underlying map. Useful for tests and ephemeral sessions.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self.inner.read().expect("lock poisoned");
        Ok(guard.get(key).cloned())
    }

    #[instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.inner.write().expect("lock poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.inner.write().expect("lock poisoned");
        guard.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.inner.write().expect("lock poisoned").clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
