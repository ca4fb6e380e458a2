//! Application context.
//!
//! DESIGN
//! ======
//! One `AppContext` is created at startup and owns every store and client.
//! Nothing is global: hosts pass the context (or the pieces they need) down
//! explicitly, and `logout` returns it to a clean signed-out state.

use std::sync::Arc;

use crate::config::Config;
use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::net::media::MediaApi;
use crate::speech::{RecognitionConfig, RecognitionEngine, SpeechRecognizer, SpeechSynthesizer, SynthesisEngine};
use crate::state::auth::AuthStore;
use crate::state::chat::ChatLog;
use crate::state::comments::CommentStore;
use crate::state::session::{MediaService, SessionStore};
use crate::storage::{KeyValueStore, TokenScope, TokenStore};

pub struct AppContext {
    pub config: Config,
    pub tokens: TokenStore,
    pub api: ApiClient,
    pub media_api: Arc<MediaApi>,
    pub auth: AuthStore,
    pub session: SessionStore,
    pub comments: CommentStore,
    pub chat: ChatLog,
    pub recognizer: SpeechRecognizer,
    pub synthesizer: SpeechSynthesizer,
}

impl AppContext {
    /// Wire the clients and stores.
    ///
    /// `durable` survives restarts and holds the login flag and the
    /// remembered token; `scoped` lives for this run only. `media` is the
    /// host's media vendor binding.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if an HTTP client cannot be built.
    pub fn new(
        config: Config,
        durable: Arc<dyn KeyValueStore>,
        scoped: Arc<dyn KeyValueStore>,
        media: Arc<dyn MediaService>,
    ) -> Result<Self, ApiError> {
        let tokens = TokenStore::new(durable.clone(), scoped);
        let api = ApiClient::new(&config.api_url, tokens.clone(), config.timeouts)?;
        let media_api = Arc::new(MediaApi::new(&config.media_url, tokens.clone(), config.timeouts)?);
        let session = SessionStore::new(media_api.clone(), media, config.session_id.clone());
        let comments = CommentStore::new(Arc::new(api.clone()));
        let auth = AuthStore::load(durable);
        tracing::info!(
            api_url = %config.api_url,
            media_url = %config.media_url,
            logged_in = auth.is_logged_in(),
            "app context ready"
        );
        let recognizer = SpeechRecognizer::new(None, RecognitionConfig::for_locale(&config.speech_locale));
        let synthesizer = SpeechSynthesizer::new(None, &config.speech_locale);
        Ok(Self {
            config,
            tokens,
            api,
            media_api,
            auth,
            session,
            comments,
            chat: ChatLog::default(),
            recognizer,
            synthesizer,
        })
    }

    /// Attach the host's speech engines. Both run in `config.speech_locale`;
    /// a `None` engine leaves that side unsupported.
    #[must_use]
    pub fn with_speech(
        mut self,
        recognition: Option<Box<dyn RecognitionEngine>>,
        synthesis: Option<Box<dyn SynthesisEngine>>,
    ) -> Self {
        self.recognizer = SpeechRecognizer::new(recognition, RecognitionConfig::for_locale(&self.config.speech_locale));
        self.synthesizer = SpeechSynthesizer::new(synthesis, &self.config.speech_locale);
        tracing::debug!(
            locale = %self.config.speech_locale,
            recognition = self.recognizer.is_supported(),
            synthesis = self.synthesizer.is_supported(),
            "speech engines attached"
        );
        self
    }

    /// Record a successful sign-in: keep the token where `scope` says and
    /// mark the user logged in.
    pub fn login(&mut self, username: &str, token: &str, scope: TokenScope) {
        self.tokens.save(token, scope);
        self.auth.login(username);
    }

    /// Leave any call, forget credentials and drop per-user state.
    pub fn logout(&mut self) {
        self.session.leave_session();
        self.auth.logout();
        self.tokens.clear();
        self.comments.reset();
        self.chat.clear();
        self.recognizer.stop();
        self.recognizer.take_text();
        self.synthesizer.cancel();
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("auth", &self.auth)
            .field("session", &self.session)
            .field("comments", &self.comments)
            .field("recognizer", &self.recognizer)
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
