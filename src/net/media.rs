//! Call-session provisioning client.
//!
//! Before a client can connect to the media service it needs a session on the
//! provisioning backend and a connection token scoped to that session.
//! Session creation is idempotent by identifier: a 409 means the session
//! already exists and the requested identifier is reused.

use async_trait::async_trait;
use serde_json::Value;

use super::api::{Endpoint, RestTransport};
use super::error::ApiError;
use super::types::{SessionCreated, SessionStatusInfo, TokenIssued};
use crate::config::Timeouts;
use crate::state::session::SessionProvisioner;
use crate::storage::TokenStore;

fn session_endpoint(session_id: &str) -> Endpoint {
    Endpoint::new(&["openvidu", "session", session_id])
}

fn session_status_endpoint(session_id: &str) -> Endpoint {
    Endpoint::new(&["openvidu", "session", session_id, "status"])
}

fn connection_endpoint(session_id: &str, connection_id: &str) -> Endpoint {
    Endpoint::new(&["openvidu", "session", session_id, "connection", connection_id])
}

fn token_endpoint() -> Endpoint {
    Endpoint::new(&["openvidu", "session", "token"])
}

/// Client for the provisioning backend.
#[derive(Debug, Clone)]
pub struct MediaApi {
    transport: RestTransport,
}

impl MediaApi {
    /// Build a provisioning client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, tokens: TokenStore, timeouts: Timeouts) -> Result<Self, ApiError> {
        Ok(Self { transport: RestTransport::new(base_url, tokens, timeouts)? })
    }

    /// Create the session or reuse it when it already exists. Returns the
    /// identifier the media service knows the session by.
    pub async fn create_session(&self, session_id: &str) -> Result<String, ApiError> {
        let created: Result<SessionCreated, ApiError> = self
            .transport
            .post(&session_endpoint(session_id), &Value::Null)
            .await;
        match created {
            Ok(body) => {
                let id = body
                    .session_id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| session_id.to_owned());
                tracing::info!(session_id = %id, "call session created");
                Ok(id)
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(%session_id, "call session already exists; reusing");
                Ok(session_id.to_owned())
            }
            Err(e) => Err(e),
        }
    }

    /// Issue a connection token for `session_id`.
    pub async fn issue_token(&self, session_id: &str) -> Result<String, ApiError> {
        let body = serde_json::json!({ "sessionId": session_id });
        let issued: TokenIssued = self.transport.post(&token_endpoint(), &body).await?;
        if issued.token.is_empty() {
            return Err(ApiError::Decode("empty connection token".into()));
        }
        Ok(issued.token)
    }

    /// Close a session. A session that no longer exists counts as closed.
    pub async fn close_session(&self, session_id: &str) -> Result<(), ApiError> {
        match self.transport.delete(&session_endpoint(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!(%session_id, "call session already closed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn session_status(&self, session_id: &str) -> Result<SessionStatusInfo, ApiError> {
        self.transport
            .get(&session_status_endpoint(session_id))
            .await
    }

    /// Drop one participant's connection from a session.
    pub async fn force_disconnect(&self, session_id: &str, connection_id: &str) -> Result<(), ApiError> {
        self.transport
            .delete(&connection_endpoint(session_id, connection_id))
            .await?;
        tracing::info!(%session_id, %connection_id, "connection force-disconnected");
        Ok(())
    }
}

#[async_trait]
impl SessionProvisioner for MediaApi {
    async fn close_session(&self, session_id: &str) -> Result<(), ApiError> {
        MediaApi::close_session(self, session_id).await
    }

    async fn create_session(&self, session_id: &str) -> Result<String, ApiError> {
        MediaApi::create_session(self, session_id).await
    }

    async fn issue_token(&self, session_id: &str) -> Result<String, ApiError> {
        MediaApi::issue_token(self, session_id).await
    }
}

#[cfg(test)]
#[path = "media_test.rs"]
mod tests;
