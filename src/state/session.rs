//! Call session lifecycle: join, leave, remote participants, mic/camera.
//!
//! ARCHITECTURE
//! ============
//! The media vendor sits behind two narrow traits: [`MediaService`] opens a
//! connection with a token, [`MediaConnection`] captures, publishes, toggles
//! tracks and disconnects. Remote participants are reported back through a
//! [`MediaEventSink`] handed to the vendor at connect time. Provisioning (the
//! session and its token) goes through [`SessionProvisioner`].
//!
//! DESIGN
//! ======
//! All state lives in one `SessionInner` behind a `std::sync::Mutex` that is
//! only held between `.await` points. Every join bumps a generation counter;
//! sinks and in-flight joins carry the generation they were created for, so a
//! `leave_session` invalidates both at once. Late vendor events for a torn
//! down session are dropped silently.
//!
//! Publisher handle exists iff the status is `Connecting` or `Connected`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;

use crate::net::error::{ApiError, UNREACHABLE_MESSAGE};

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Provisioning backend: sessions and connection tokens.
#[async_trait]
pub trait SessionProvisioner: Send + Sync {
    async fn close_session(&self, session_id: &str) -> Result<(), ApiError>;
    async fn create_session(&self, session_id: &str) -> Result<String, ApiError>;
    async fn issue_token(&self, session_id: &str) -> Result<String, ApiError>;
}

/// Failures reported by the media vendor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("media permission denied: {0}")]
    PermissionDenied(String),
    #[error("media device not found")]
    DeviceNotFound,
    #[error("media device busy")]
    DeviceBusy,
    #[error("media negotiation failed: {0}")]
    Negotiation(String),
}

/// Local capture settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub resolution: String,
    pub frame_rate: u32,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self { audio_enabled: true, video_enabled: true, resolution: "640x480".to_owned(), frame_rate: 30 }
    }
}

/// A remote participant's stream as announced by the vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub connection_id: String,
    pub display_name: String,
    pub has_audio: bool,
    pub has_video: bool,
}

/// Opens vendor connections.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Connect with a provisioning token. The vendor reports remote streams
    /// through `events` for as long as the connection lives.
    async fn connect(
        &self,
        token: &str,
        display_name: &str,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaConnection>, MediaError>;
}

/// One live vendor connection.
#[async_trait]
pub trait MediaConnection: Send + Sync {
    fn connection_id(&self) -> String;
    /// Request microphone + camera capture.
    async fn start_capture(&self, options: &PublishOptions) -> Result<(), MediaError>;
    /// Publish the captured tracks into the session.
    async fn publish(&self) -> Result<(), MediaError>;
    fn set_audio_enabled(&self, enabled: bool);
    fn set_video_enabled(&self, enabled: bool);
    fn disconnect(&self);
}

// =============================================================================
// STATE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    /// The media service dropped the session; `leave_session` returns to idle.
    Ended,
}

impl SessionStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

/// Local publisher or remote subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStreamHandle {
    pub owner_connection_id: String,
    pub display_name: String,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub is_local: bool,
}

/// The single call session this client is part of.
pub struct CallSession {
    pub session_id: String,
    pub status: SessionStatus,
    connection: Arc<dyn MediaConnection>,
}

impl std::fmt::Debug for CallSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSession")
            .field("session_id", &self.session_id)
            .field("status", &self.status)
            .field("connection_id", &self.connection.connection_id())
            .finish()
    }
}

/// Read-only copy of the store for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub status: SessionStatus,
    pub joining: bool,
    pub publisher: Option<MediaStreamHandle>,
    pub subscribers: Vec<MediaStreamHandle>,
    pub error: Option<String>,
}

/// Why a join did not complete.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a join is already in progress")]
    JoinInProgress,
    #[error("a call session is already active")]
    AlreadyActive,
    #[error("session provisioning failed: {0}")]
    Provisioning(#[source] ApiError),
    #[error("media permission denied: {0}")]
    MediaPermissionDenied(String),
    #[error("media connection failed: {0}")]
    Connection(String),
    #[error("join cancelled by leave")]
    Cancelled,
}

impl SessionError {
    /// The one message shown to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::JoinInProgress => "이미 연결 중입니다. 잠시만 기다려주세요.".to_owned(),
            Self::AlreadyActive => "이미 통화에 참여 중입니다.".to_owned(),
            Self::Provisioning(ApiError::Transport(_)) => UNREACHABLE_MESSAGE.to_owned(),
            Self::Provisioning(_) => "통화방을 준비하지 못했습니다. 잠시 후 다시 시도해주세요.".to_owned(),
            Self::MediaPermissionDenied(_) => {
                "카메라와 마이크 접근 권한이 필요합니다. 브라우저 설정에서 권한을 허용해주세요.".to_owned()
            }
            Self::Connection(_) => "화상 연결 중 오류가 발생했습니다.".to_owned(),
            Self::Cancelled => "연결이 취소되었습니다.".to_owned(),
        }
    }
}

fn capture_error(e: MediaError) -> SessionError {
    match e {
        MediaError::PermissionDenied(detail) => SessionError::MediaPermissionDenied(detail),
        other => SessionError::Connection(other.to_string()),
    }
}

// =============================================================================
// INNER STATE
// =============================================================================

#[derive(Debug, Default)]
struct SessionInner {
    generation: u64,
    joining: bool,
    session: Option<CallSession>,
    local_connection_id: Option<String>,
    publisher: Option<MediaStreamHandle>,
    subscribers: Vec<MediaStreamHandle>,
    error: Option<String>,
    /// The media service dropped the current generation's session, possibly
    /// before the join installed it.
    remote_ended: bool,
}

impl SessionInner {
    fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map_or(SessionStatus::Idle, |s| s.status)
    }

    /// Whether vendor events for the current generation should be applied.
    fn accepts_events(&self) -> bool {
        self.joining || self.status().is_active()
    }

    fn clear_call(&mut self) {
        self.session = None;
        self.remote_ended = false;
        self.local_connection_id = None;
        self.publisher = None;
        self.subscribers.clear();
    }
}

fn lock_inner(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// EVENT SINK
// =============================================================================

/// Callback target for vendor events, bound to one join attempt.
///
/// Holds only a weak reference: events delivered after the store is dropped,
/// or after the session it was created for is gone, are ignored.
#[derive(Clone)]
pub struct MediaEventSink {
    inner: Weak<Mutex<SessionInner>>,
    generation: u64,
}

impl MediaEventSink {
    /// A remote stream appeared. Duplicates and our own stream are ignored.
    pub fn stream_created(&self, stream: RemoteStream) {
        self.with_current(|inner| {
            if inner.local_connection_id.as_deref() == Some(stream.connection_id.as_str()) {
                return;
            }
            if inner
                .subscribers
                .iter()
                .any(|s| s.owner_connection_id == stream.connection_id)
            {
                tracing::debug!(connection_id = %stream.connection_id, "duplicate stream-created ignored");
                return;
            }
            tracing::info!(connection_id = %stream.connection_id, "remote participant joined");
            inner.subscribers.push(MediaStreamHandle {
                owner_connection_id: stream.connection_id,
                display_name: stream.display_name,
                audio_enabled: stream.has_audio,
                video_enabled: stream.has_video,
                is_local: false,
            });
        });
    }

    /// A remote stream went away. Unknown ids are a no-op.
    pub fn stream_destroyed(&self, connection_id: &str) {
        self.with_current(|inner| {
            let before = inner.subscribers.len();
            inner
                .subscribers
                .retain(|s| s.owner_connection_id != connection_id);
            if inner.subscribers.len() != before {
                tracing::info!(%connection_id, "remote participant left");
            }
        });
    }

    /// The media service ended the session on its side.
    pub fn session_disconnected(&self, reason: &str) {
        self.with_current(|inner| {
            tracing::warn!(%reason, "call session disconnected by media service");
            inner.remote_ended = true;
            if let Some(session) = inner.session.as_mut() {
                session.status = SessionStatus::Ended;
            }
            inner.publisher = None;
            inner.subscribers.clear();
        });
    }

    fn with_current(&self, apply: impl FnOnce(&mut SessionInner)) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut guard = lock_inner(&inner);
        if guard.generation != self.generation || !guard.accepts_events() {
            tracing::debug!(generation = self.generation, "stale media event ignored");
            return;
        }
        apply(&mut *guard);
    }
}

impl std::fmt::Debug for MediaEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaEventSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Owns the single call session for this client.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<SessionInner>>,
    provisioner: Arc<dyn SessionProvisioner>,
    media: Arc<dyn MediaService>,
    session_id: String,
    publish_options: PublishOptions,
}

impl SessionStore {
    #[must_use]
    pub fn new(
        provisioner: Arc<dyn SessionProvisioner>,
        media: Arc<dyn MediaService>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner::default())),
            provisioner,
            media,
            session_id: session_id.into(),
            publish_options: PublishOptions::default(),
        }
    }

    #[must_use]
    pub fn with_publish_options(mut self, options: PublishOptions) -> Self {
        self.publish_options = options;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        lock_inner(&self.inner)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    #[must_use]
    pub fn is_joining(&self) -> bool {
        self.lock().joining
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            session_id: inner.session.as_ref().map(|s| s.session_id.clone()),
            status: inner.status(),
            joining: inner.joining,
            publisher: inner.publisher.clone(),
            subscribers: inner.subscribers.clone(),
            error: inner.error.clone(),
        }
    }

    /// Provision, connect, capture and publish.
    ///
    /// On failure the store is back in its pre-join state with
    /// [`SessionError::user_message`] recorded; nothing is retried.
    ///
    /// # Errors
    ///
    /// [`SessionError::JoinInProgress`] / [`SessionError::AlreadyActive`] when
    /// the precondition fails; otherwise the step that failed.
    pub async fn join_session(&self, display_name: &str) -> Result<(), SessionError> {
        let (generation, ended) = {
            let mut inner = self.lock();
            if inner.joining {
                return Err(SessionError::JoinInProgress);
            }
            if inner.status().is_active() {
                return Err(SessionError::AlreadyActive);
            }
            inner.generation += 1;
            inner.joining = true;
            inner.error = None;
            let ended = inner.session.take().map(|s| s.connection);
            inner.clear_call();
            (inner.generation, ended)
        };
        if let Some(connection) = ended {
            connection.disconnect();
            tracing::debug!(session_id = %self.session_id, "released ended call session");
        }
        tracing::info!(session_id = %self.session_id, generation, "joining call session");

        let result = self.establish(generation, display_name).await;

        let mut inner = self.lock();
        inner.joining = false;
        match result {
            Ok(()) => {
                tracing::info!(session_id = %self.session_id, "call session connected");
                Ok(())
            }
            Err(e) => {
                if inner.generation == generation {
                    inner.generation += 1;
                    inner.clear_call();
                    inner.error = Some(e.user_message());
                }
                tracing::warn!(error = %e, session_id = %self.session_id, "join failed");
                Err(e)
            }
        }
    }

    async fn establish(&self, generation: u64, display_name: &str) -> Result<(), SessionError> {
        if let Err(e) = self.provisioner.close_session(&self.session_id).await {
            tracing::debug!(error = %e, "stale session cleanup failed; continuing");
        }
        let session_id = self
            .provisioner
            .create_session(&self.session_id)
            .await
            .map_err(SessionError::Provisioning)?;
        let token = self
            .provisioner
            .issue_token(&session_id)
            .await
            .map_err(SessionError::Provisioning)?;
        self.ensure_current(generation)?;

        let sink = MediaEventSink { inner: Arc::downgrade(&self.inner), generation };
        let connection = self
            .media
            .connect(&token, display_name, sink)
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        let local_id = connection.connection_id();
        if !self.record_local_connection(generation, &local_id) {
            connection.disconnect();
            return Err(SessionError::Cancelled);
        }

        if let Err(e) = connection.start_capture(&self.publish_options).await {
            connection.disconnect();
            return Err(capture_error(e));
        }
        let publisher = MediaStreamHandle {
            owner_connection_id: local_id,
            display_name: display_name.to_owned(),
            audio_enabled: self.publish_options.audio_enabled,
            video_enabled: self.publish_options.video_enabled,
            is_local: true,
        };
        if let Err(e) = self.install_session(generation, &session_id, &connection, publisher) {
            connection.disconnect();
            return Err(e);
        }

        if let Err(e) = connection.publish().await {
            connection.disconnect();
            return Err(SessionError::Connection(e.to_string()));
        }

        let connected = {
            let mut inner = self.lock();
            if inner.generation != generation {
                // A leave already disconnected the installed session.
                return Err(SessionError::Cancelled);
            }
            let remote_ended = inner.remote_ended;
            match inner.session.as_mut() {
                Some(session) if session.status == SessionStatus::Connecting && !remote_ended => {
                    session.status = SessionStatus::Connected;
                    true
                }
                _ => false,
            }
        };
        if connected {
            Ok(())
        } else {
            connection.disconnect();
            Err(SessionError::Connection("session ended while publishing".into()))
        }
    }

    fn ensure_current(&self, generation: u64) -> Result<(), SessionError> {
        if self.lock().generation == generation { Ok(()) } else { Err(SessionError::Cancelled) }
    }

    fn record_local_connection(&self, generation: u64, local_id: &str) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.local_connection_id = Some(local_id.to_owned());
        inner
            .subscribers
            .retain(|s| s.owner_connection_id != local_id);
        true
    }

    fn install_session(
        &self,
        generation: u64,
        session_id: &str,
        connection: &Arc<dyn MediaConnection>,
        publisher: MediaStreamHandle,
    ) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.generation != generation {
            return Err(SessionError::Cancelled);
        }
        if inner.remote_ended {
            return Err(SessionError::Connection("session ended before publishing".into()));
        }
        inner.session = Some(CallSession {
            session_id: session_id.to_owned(),
            status: SessionStatus::Connecting,
            connection: Arc::clone(connection),
        });
        inner.publisher = Some(publisher);
        Ok(())
    }

    /// Disconnect and clear everything. Safe to call at any time, including
    /// mid-join (the join then fails with [`SessionError::Cancelled`]).
    pub fn leave_session(&self) {
        let connection = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.error = None;
            let connection = inner.session.take().map(|s| s.connection);
            inner.clear_call();
            connection
        };
        if let Some(connection) = connection {
            connection.disconnect();
            tracing::info!(session_id = %self.session_id, "left call session");
        }
    }

    /// Flip the publisher's microphone. Returns the new state, or `None`
    /// without a publisher.
    pub fn toggle_mic(&self) -> Option<bool> {
        let (connection, enabled) = {
            let mut inner = self.lock();
            let connection = inner.session.as_ref().map(|s| Arc::clone(&s.connection))?;
            let publisher = inner.publisher.as_mut()?;
            publisher.audio_enabled = !publisher.audio_enabled;
            (connection, publisher.audio_enabled)
        };
        connection.set_audio_enabled(enabled);
        Some(enabled)
    }

    /// Flip the publisher's camera. Returns the new state, or `None` without
    /// a publisher.
    pub fn toggle_camera(&self) -> Option<bool> {
        let (connection, enabled) = {
            let mut inner = self.lock();
            let connection = inner.session.as_ref().map(|s| Arc::clone(&s.connection))?;
            let publisher = inner.publisher.as_mut()?;
            publisher.video_enabled = !publisher.video_enabled;
            (connection, publisher.video_enabled)
        };
        connection.set_video_enabled(enabled);
        Some(enabled)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session_id", &self.session_id)
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
