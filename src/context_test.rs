use super::*;
use crate::net::types::NewComment;
use crate::speech::{RecognitionConfig, SpeechError, Utterance};
use crate::state::session::{MediaConnection, MediaError, MediaEventSink, PublishOptions, SessionStatus};
use crate::storage::{ACCESS_TOKEN_KEY, MemoryStorage};
use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::json;
use std::sync::Mutex;

// =========================================================================
// Fakes
// =========================================================================

struct QuietConnection;

#[async_trait]
impl MediaConnection for QuietConnection {
    fn connection_id(&self) -> String {
        "con_me".into()
    }
    async fn start_capture(&self, _options: &PublishOptions) -> Result<(), MediaError> {
        Ok(())
    }
    async fn publish(&self) -> Result<(), MediaError> {
        Ok(())
    }
    fn set_audio_enabled(&self, _enabled: bool) {}
    fn set_video_enabled(&self, _enabled: bool) {}
    fn disconnect(&self) {}
}

struct QuietMedia;

#[async_trait]
impl MediaService for QuietMedia {
    async fn connect(
        &self,
        _token: &str,
        _display_name: &str,
        _events: MediaEventSink,
    ) -> Result<Arc<dyn MediaConnection>, MediaError> {
        Ok(Arc::new(QuietConnection))
    }
}

#[derive(Default)]
struct SpeechLog {
    entries: Mutex<Vec<String>>,
}

struct LoggingRecognition(Arc<SpeechLog>);

impl RecognitionEngine for LoggingRecognition {
    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError> {
        self.0.entries.lock().unwrap().push(format!("listen:{}", config.locale));
        Ok(())
    }
    fn stop(&mut self) {
        self.0.entries.lock().unwrap().push("stop".into());
    }
}

struct LoggingSynthesis(Arc<SpeechLog>);

impl SynthesisEngine for LoggingSynthesis {
    fn cancel(&mut self) {}
    fn speak(&mut self, utterance: &Utterance) {
        self.0.entries.lock().unwrap().push(format!("say:{}", utterance.lang));
    }
}

async fn spawn_backend() -> String {
    let router = Router::new()
        .route(
            "/openvidu/session/{id}",
            post(|Path(id): Path<String>| async move { Json(json!({ "sessionId": id })) })
                .delete(|| async { StatusCode::NOT_FOUND }),
        )
        .route(
            "/openvidu/session/token",
            post(|| async { Json(json!({ "token": "wss://media?token=abc" })) }),
        )
        .route(
            "/posts/{post_id}/comments",
            get(|| async {
                Json(json!({ "status": 200, "data": [
                    { "id": 1, "postId": 3, "content": "첫 댓글", "authorId": 1, "authorName": "a" }
                ] }))
            })
            .post(|Json(body): Json<serde_json::Value>| async move {
                Json(json!({ "id": 2, "postId": 3, "content": body["content"].clone(), "authorId": 1, "authorName": "a" }))
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn context(base: &str, durable: Arc<dyn KeyValueStore>) -> AppContext {
    AppContext::new(Config::new(base), durable, Arc::new(MemoryStorage::new()), Arc::new(QuietMedia)).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn login_persists_across_contexts() {
    let base = spawn_backend().await;
    let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());

    let mut ctx = context(&base, durable.clone());
    assert!(!ctx.auth.is_logged_in());
    ctx.login("민지", "jwt-1", TokenScope::Durable);

    let again = context(&base, durable.clone());
    assert!(again.auth.is_logged_in());
    assert_eq!(again.tokens.bearer().as_deref(), Some("jwt-1"));
    assert_eq!(durable.get(ACCESS_TOKEN_KEY).as_deref(), Some("jwt-1"));
}

#[tokio::test]
async fn logout_tears_everything_down() {
    let base = spawn_backend().await;
    let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
    let mut ctx = context(&base, durable.clone());
    ctx.login("민지", "jwt-1", TokenScope::Session);

    ctx.session.join_session("민지").await.unwrap();
    assert_eq!(ctx.session.status(), SessionStatus::Connected);

    ctx.comments.fetch_comments(3).await.unwrap();
    ctx.comments
        .add_comment(3, &NewComment { content: "두 번째".into(), author_id: 1, author_name: "a".into() })
        .await
        .unwrap();
    assert_eq!(ctx.comments.comments().len(), 2);
    ctx.chat.send("나", "안녕");

    ctx.logout();

    assert_eq!(ctx.session.status(), SessionStatus::Idle);
    assert!(!ctx.auth.is_logged_in());
    assert!(ctx.tokens.bearer().is_none());
    assert!(ctx.comments.comments().is_empty());
    assert!(ctx.chat.messages().is_empty());
    assert!(durable.get("isLoggedIn").is_none());
}

#[tokio::test]
async fn speech_runs_in_configured_locale() {
    let base = spawn_backend().await;
    let mut config = Config::new(&base);
    config.speech_locale = "en-US".into();
    let log = Arc::new(SpeechLog::default());
    let mut ctx = AppContext::new(
        config,
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryStorage::new()),
        Arc::new(QuietMedia),
    )
    .unwrap()
    .with_speech(Some(Box::new(LoggingRecognition(log.clone()))), Some(Box::new(LoggingSynthesis(log.clone()))));

    ctx.recognizer.start().unwrap();
    ctx.synthesizer.speak("hello");
    ctx.logout();

    assert!(!ctx.recognizer.is_recording());
    assert_eq!(*log.entries.lock().unwrap(), vec!["listen:en-US", "say:en-US", "stop"]);
}

#[tokio::test]
async fn speech_without_engines_is_unsupported() {
    let base = spawn_backend().await;
    let mut ctx = context(&base, Arc::new(MemoryStorage::new()));
    assert!(!ctx.synthesizer.is_supported());
    assert!(ctx.recognizer.start().is_err());
}
