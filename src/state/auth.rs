//! Login flag and username, persisted in durable storage.

use std::sync::Arc;

use crate::storage::KeyValueStore;

const LOGGED_IN_KEY: &str = "isLoggedIn";
const USERNAME_KEY: &str = "username";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_logged_in: bool,
    pub username: Option<String>,
}

/// Holds [`AuthState`] and mirrors every change to the durable store.
pub struct AuthStore {
    storage: Arc<dyn KeyValueStore>,
    state: AuthState,
}

impl AuthStore {
    /// Restore the persisted state. A missing or malformed flag reads as
    /// logged out.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let is_logged_in = storage.get(LOGGED_IN_KEY).is_some_and(|v| v == "true");
        let username = if is_logged_in {
            storage.get(USERNAME_KEY).filter(|u| !u.is_empty())
        } else {
            None
        };
        Self { storage, state: AuthState { is_logged_in, username } }
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.state.username.as_deref()
    }

    pub fn login(&mut self, username: &str) {
        self.storage.set(LOGGED_IN_KEY, "true");
        self.storage.set(USERNAME_KEY, username);
        self.state = AuthState { is_logged_in: true, username: Some(username.to_owned()) };
        tracing::info!(%username, "logged in");
    }

    pub fn logout(&mut self) {
        self.storage.remove(LOGGED_IN_KEY);
        self.storage.remove(USERNAME_KEY);
        self.state = AuthState::default();
        tracing::info!("logged out");
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore").field("state", &self.state).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
