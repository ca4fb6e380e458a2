//! Key/value persistence standing in for browser storage.
//!
//! DESIGN
//! ======
//! The client reads two stores: a durable one (survives restarts, like
//! `localStorage`) and a session-scoped one (like `sessionStorage`). Both sit
//! behind [`KeyValueStore`] so a WASM host can plug in real browser storage
//! while native hosts use [`JsonFileStorage`] and tests use [`MemoryStorage`].
//!
//! ERROR HANDLING
//! ==============
//! Writes to a file-backed store can fail; failures are logged and the
//! in-memory view stays authoritative for the running process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Durable key holding the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Session-scoped key holding the bearer token.
pub const SESSION_TOKEN_KEY: &str = "token";

/// String key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-lifetime storage. Used for the session-scoped store and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

// =============================================================================
// JSON FILE
// =============================================================================

/// Durable storage persisted as a flat JSON object on disk.
///
/// The whole map is rewritten on every mutation; the stored state is a handful
/// of short strings.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; it is overwritten on the next write.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self { path, entries: Mutex::new(entries) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) {
        let body = match serde_json::to_string_pretty(entries) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "storage serialize failed");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, body) {
            tracing::warn!(error = %e, path = %self.path.display(), "storage write failed");
        }
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "storage read failed; starting empty");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, path = %path.display(), "storage file corrupt; starting empty");
        BTreeMap::new()
    })
}

impl KeyValueStore for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Where a saved bearer token should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    /// Survives restarts ("keep me signed in").
    Durable,
    /// Dropped with the session-scoped store.
    Session,
}

/// Bearer token lookup over the durable and session-scoped stores.
#[derive(Clone)]
pub struct TokenStore {
    durable: Arc<dyn KeyValueStore>,
    scoped: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStore>, scoped: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, scoped }
    }

    /// Current bearer token, preferring the durable store. Blank values are ignored.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.durable
            .get(ACCESS_TOKEN_KEY)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                self.scoped
                    .get(SESSION_TOKEN_KEY)
                    .filter(|t| !t.trim().is_empty())
            })
    }

    pub fn save(&self, token: &str, scope: TokenScope) {
        match scope {
            TokenScope::Durable => self.durable.set(ACCESS_TOKEN_KEY, token),
            TokenScope::Session => self.scoped.set(SESSION_TOKEN_KEY, token),
        }
    }

    /// Remove the token from both stores.
    pub fn clear(&self) {
        self.durable.remove(ACCESS_TOKEN_KEY);
        self.scoped.remove(SESSION_TOKEN_KEY);
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.bearer().is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
