//! REST client for the 말랑 backend.
//!
//! ARCHITECTURE
//! ============
//! [`RestTransport`] owns the `reqwest` client, the base URL and the token
//! lookup; it attaches `Authorization: Bearer ...` to every request and turns
//! responses into typed results. [`ApiClient`] layers the backend's endpoints
//! on top. The media provisioning client in `net::media` reuses the same
//! transport.
//!
//! Paths are built as [`Endpoint`] segment lists, never by string formatting:
//! ids go through `Url::path_segments_mut` and query values through
//! `query_pairs_mut`, so an id cannot split a segment or add a parameter.
//!
//! ERROR HANDLING
//! ==============
//! No response → [`ApiError::Transport`]. Non-2xx with a `{errorCode, message}`
//! body → [`ApiError::Domain`], otherwise [`ApiError::Status`]. Success bodies
//! may come wrapped as `{status, data}` or bare; both decode to the payload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, error_from_response};
use super::types::{
    ChannelConnection, Comment, CommentUpdate, CounselingSummary, CounselorChannel, CounselorChannelFilter,
    CounselorProfile, CounselorProfileUpdate, CounselorReview, EntryDecision, EntryRequest, NewComment,
    NewCounselingReview, NewCounselorChannel, NewReply, NewVoiceChannel, Page, PasswordCheckResponse, Reply,
    ReplyUpdate, VoiceChannel,
};
use crate::config::Timeouts;
use crate::state::comments::CommentService;
use crate::storage::TokenStore;

// =============================================================================
// TRANSPORT
// =============================================================================

/// A backend path as raw segments plus query pairs. Segments and query values
/// are percent-encoded when the URL is built, so ids may hold any character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub(crate) fn new(segments: &[&str]) -> Self {
        Self { segments: segments.iter().map(|s| (*s).to_owned()).collect(), query: Vec::new() }
    }

    #[must_use]
    pub(crate) fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }
}

/// Authenticated JSON-over-HTTP transport bound to one base URL.
#[derive(Debug, Clone)]
pub struct RestTransport {
    http: reqwest::Client,
    base: Url,
    tokens: TokenStore,
}

impl RestTransport {
    /// Build a transport for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client cannot be
    /// constructed or `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str, tokens: TokenStore, timeouts: Timeouts) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::HttpClientBuild(format!("invalid base URL {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::HttpClientBuild(format!("base URL {base_url} cannot take a path")));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base, tokens })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Full URL for `endpoint` under the base path.
    pub(crate) fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&endpoint.segments);
        }
        if !endpoint.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &endpoint.query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    fn request(&self, method: Method, endpoint: &Endpoint) -> reqwest::RequestBuilder {
        let url = self.url(endpoint);
        let builder = self
            .http
            .request(method, url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        match self.tokens.bearer() {
            Some(token) => builder.bearer_auth(token),
            None => {
                tracing::debug!(path = %url.path(), "no bearer token available");
                builder
            }
        }
    }

    /// Send and return the raw body of a 2xx response.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(error_from_response(status, text));
        }
        Ok(text)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ApiError> {
        let text = self.send(self.request(Method::GET, endpoint)).await?;
        decode_body(&text)
    }

    pub(crate) async fn post<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let text = self
            .send(self.request(Method::POST, endpoint).json(body))
            .await?;
        decode_body(&text)
    }

    /// POST ignoring the response body.
    pub(crate) async fn post_unit<B>(&self, endpoint: &Endpoint, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send(self.request(Method::POST, endpoint).json(body))
            .await
            .map(|_| ())
    }

    /// POST with no request body, ignoring the response body.
    pub(crate) async fn post_empty(&self, endpoint: &Endpoint) -> Result<String, ApiError> {
        self.send(self.request(Method::POST, endpoint)).await
    }

    pub(crate) async fn put<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let text = self
            .send(self.request(Method::PUT, endpoint).json(body))
            .await?;
        decode_body(&text)
    }

    /// PUT ignoring the response body.
    pub(crate) async fn put_unit<B>(&self, endpoint: &Endpoint, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send(self.request(Method::PUT, endpoint).json(body))
            .await
            .map(|_| ())
    }

    pub(crate) async fn delete(&self, endpoint: &Endpoint) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, endpoint))
            .await
            .map(|_| ())
    }
}

/// Decode a success body, unwrapping a `{status, data}` envelope when present.
pub(crate) fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))?
    };
    let payload = match value {
        Value::Object(mut map) if map.contains_key("data") && map.contains_key("status") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
}

// =============================================================================
// ENDPOINT PATHS
// =============================================================================

fn post_comments_endpoint(post_id: i64) -> Endpoint {
    Endpoint::new(&["posts", &post_id.to_string(), "comments"])
}

fn comment_endpoint(comment_id: i64) -> Endpoint {
    Endpoint::new(&["comments", &comment_id.to_string()])
}

fn replies_endpoint(comment_id: i64) -> Endpoint {
    Endpoint::new(&["comments", &comment_id.to_string(), "replies"])
}

fn reply_endpoint(comment_id: i64, reply_id: i64) -> Endpoint {
    Endpoint::new(&["comments", &comment_id.to_string(), "replies", &reply_id.to_string()])
}

fn counselor_profile_endpoint() -> Endpoint {
    Endpoint::new(&["counselor", "profile"])
}

fn counselor_history_endpoint(counselor_id: i64) -> Endpoint {
    Endpoint::new(&["summary", "counselor", &counselor_id.to_string()])
}

fn certification_endpoint(has_certification: bool) -> Endpoint {
    Endpoint::new(&["counselor", "profile", "certification"])
        .query("hasCertification", has_certification.to_string())
}

fn counselor_reviews_endpoint(counselor_id: i64) -> Endpoint {
    Endpoint::new(&["counselors", &counselor_id.to_string(), "reviews"])
}

fn counseling_review_endpoint(session_id: &str) -> Endpoint {
    Endpoint::new(&["counseling-review"]).query("session_id", session_id)
}

fn counselor_channels_endpoint() -> Endpoint {
    Endpoint::new(&["counselor-channels"])
}

fn counselor_channel_connect_endpoint(channel_id: &str) -> Endpoint {
    Endpoint::new(&["counselor-channels", channel_id, "connect"])
}

fn entry_request_endpoint(channel_id: &str) -> Endpoint {
    Endpoint::new(&["counselor-channels", channel_id, "request"])
}

fn entry_requests_endpoint(channel_id: &str) -> Endpoint {
    Endpoint::new(&["counselor-channels", channel_id, "requests"])
}

fn entry_approve_endpoint(channel_id: &str, request_id: &str) -> Endpoint {
    Endpoint::new(&["counselor-channels", channel_id, "approve"]).query("request_id", request_id)
}

fn voice_channels_endpoint() -> Endpoint {
    Endpoint::new(&["channels", "voice"])
}

fn voice_channel_endpoint(channel_id: &str) -> Endpoint {
    Endpoint::new(&["channels", "voice", channel_id])
}

fn leave_channel_endpoint(channel_id: &str) -> Endpoint {
    Endpoint::new(&["channels", channel_id, "leave"])
}

fn password_check_endpoint(channel_id: &str) -> Endpoint {
    Endpoint::new(&["channels", "voice", channel_id, "password-check"])
}

/// Query pairs for a counselor channel listing. Unset filters are omitted.
fn channel_filter_query(mut endpoint: Endpoint, filter: &CounselorChannelFilter) -> Endpoint {
    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.is_empty()) {
        endpoint = endpoint.query("keyword", keyword);
    }
    if let Some(specialty) = filter.specialty.as_deref().filter(|s| !s.is_empty()) {
        endpoint = endpoint.query("specialty", specialty);
    }
    if let Some(min_rating) = filter.min_rating {
        endpoint = endpoint.query("min_rating", min_rating.to_string());
    }
    endpoint
        .query("page", filter.page.to_string())
        .query("size", filter.size.to_string())
}

// =============================================================================
// CLIENT
// =============================================================================

/// Typed access to the REST backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: RestTransport,
}

impl ApiClient {
    /// Build a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, tokens: TokenStore, timeouts: Timeouts) -> Result<Self, ApiError> {
        Ok(Self { transport: RestTransport::new(base_url, tokens, timeouts)? })
    }

    #[must_use]
    pub fn transport(&self) -> &RestTransport {
        &self.transport
    }

    // --- comments -----------------------------------------------------------

    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.transport.get(&post_comments_endpoint(post_id)).await
    }

    pub async fn create_comment(&self, post_id: i64, body: &NewComment) -> Result<Comment, ApiError> {
        self.transport
            .post(&post_comments_endpoint(post_id), body)
            .await
    }

    pub async fn update_comment(&self, comment_id: i64, body: &CommentUpdate) -> Result<(), ApiError> {
        self.transport
            .put_unit(&comment_endpoint(comment_id), body)
            .await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        self.transport.delete(&comment_endpoint(comment_id)).await
    }

    pub async fn create_reply(&self, comment_id: i64, body: &NewReply) -> Result<Reply, ApiError> {
        self.transport
            .post(&replies_endpoint(comment_id), body)
            .await
    }

    pub async fn update_reply(&self, comment_id: i64, reply_id: i64, body: &ReplyUpdate) -> Result<(), ApiError> {
        self.transport
            .put_unit(&reply_endpoint(comment_id, reply_id), body)
            .await
    }

    pub async fn delete_reply(&self, comment_id: i64, reply_id: i64) -> Result<(), ApiError> {
        self.transport
            .delete(&reply_endpoint(comment_id, reply_id))
            .await
    }

    // --- counselor ----------------------------------------------------------

    /// Fetch the signed-in counselor's own profile.
    pub async fn counselor_profile(&self) -> Result<CounselorProfile, ApiError> {
        self.transport.get(&counselor_profile_endpoint()).await
    }

    pub async fn update_counselor_profile(
        &self,
        update: &CounselorProfileUpdate,
    ) -> Result<CounselorProfile, ApiError> {
        self.transport.put(&counselor_profile_endpoint(), update).await
    }

    pub async fn set_certification(&self, has_certification: bool) -> Result<CounselorProfile, ApiError> {
        self.transport
            .put(&certification_endpoint(has_certification), &Value::Null)
            .await
    }

    /// Past counseling summaries written for `counselor_id`.
    pub async fn counselor_history(&self, counselor_id: i64) -> Result<Vec<CounselingSummary>, ApiError> {
        self.transport
            .get(&counselor_history_endpoint(counselor_id))
            .await
    }

    /// Reviews left for `counselor_id`, newest first as the backend orders them.
    pub async fn counselor_reviews(&self, counselor_id: i64) -> Result<Page<CounselorReview>, ApiError> {
        self.transport
            .get(&counselor_reviews_endpoint(counselor_id))
            .await
    }

    /// Rate a finished counseling session.
    pub async fn submit_counseling_review(&self, session_id: &str, review: &NewCounselingReview) -> Result<(), ApiError> {
        self.transport
            .post_unit(&counseling_review_endpoint(session_id), review)
            .await?;
        tracing::info!(%session_id, rating = review.rating, "counseling review submitted");
        Ok(())
    }

    // --- counselor channels -------------------------------------------------

    pub async fn create_counselor_channel(&self, body: &NewCounselorChannel) -> Result<CounselorChannel, ApiError> {
        let channel: CounselorChannel = self
            .transport
            .post(&counselor_channels_endpoint(), body)
            .await?;
        tracing::info!(channel_id = channel.id, "counselor channel created");
        Ok(channel)
    }

    /// One page of bookable counselor channels matching `filter`.
    pub async fn list_counselor_channels(
        &self,
        filter: &CounselorChannelFilter,
    ) -> Result<Page<CounselorChannel>, ApiError> {
        self.transport
            .get(&channel_filter_query(counselor_channels_endpoint(), filter))
            .await
    }

    /// Enter a counselor channel the caller was admitted to. `None` when the
    /// backend answers with an empty body.
    pub async fn connect_counselor_channel(&self, channel_id: &str) -> Result<Option<ChannelConnection>, ApiError> {
        let text = self
            .transport
            .post_empty(&counselor_channel_connect_endpoint(channel_id))
            .await?;
        decode_body(&text)
    }

    pub async fn request_entry(&self, channel_id: &str, message: &str) -> Result<EntryRequest, ApiError> {
        let body = serde_json::json!({ "message": message });
        self.transport
            .post(&entry_request_endpoint(channel_id), &body)
            .await
    }

    pub async fn entry_requests(&self, channel_id: &str) -> Result<Vec<EntryRequest>, ApiError> {
        self.transport
            .get(&entry_requests_endpoint(channel_id))
            .await
    }

    /// Accept or reject a pending entry request. Only the channel owner may answer.
    pub async fn answer_entry_request(
        &self,
        channel_id: &str,
        request_id: &str,
        decision: EntryDecision,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "status": decision });
        let _: Value = self
            .transport
            .post(&entry_approve_endpoint(channel_id, request_id), &body)
            .await?;
        tracing::info!(%channel_id, %request_id, ?decision, "entry request answered");
        Ok(())
    }

    // --- voice channels -----------------------------------------------------

    pub async fn create_voice_channel(&self, body: &NewVoiceChannel) -> Result<VoiceChannel, ApiError> {
        let channel: VoiceChannel = self.transport.post(&voice_channels_endpoint(), body).await?;
        tracing::info!(channel_id = %channel.channel_id, "voice channel created");
        Ok(channel)
    }

    pub async fn list_voice_channels(&self) -> Result<Vec<VoiceChannel>, ApiError> {
        self.transport.get(&voice_channels_endpoint()).await
    }

    pub async fn voice_channel(&self, channel_id: &str) -> Result<VoiceChannel, ApiError> {
        self.transport
            .get(&voice_channel_endpoint(channel_id))
            .await
    }

    pub async fn leave_channel(&self, channel_id: &str) -> Result<(), ApiError> {
        self.transport
            .post_empty(&leave_channel_endpoint(channel_id))
            .await
            .map(|_| ())
    }

    /// Check a room password. `Ok(false)` means the server answered and the
    /// password was wrong; use [`ApiError::password_check_message`] for failures.
    pub async fn check_channel_password(&self, channel_id: &str, password: &str) -> Result<bool, ApiError> {
        let body = serde_json::json!({ "password": password });
        let resp: PasswordCheckResponse = self
            .transport
            .post(&password_check_endpoint(channel_id), &body)
            .await?;
        Ok(resp.is_password_correct)
    }
}

#[async_trait]
impl CommentService for ApiClient {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        ApiClient::list_comments(self, post_id).await
    }

    async fn create_comment(&self, post_id: i64, body: &NewComment) -> Result<Comment, ApiError> {
        ApiClient::create_comment(self, post_id, body).await
    }

    async fn update_comment(&self, comment_id: i64, body: &CommentUpdate) -> Result<(), ApiError> {
        ApiClient::update_comment(self, comment_id, body).await
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        ApiClient::delete_comment(self, comment_id).await
    }

    async fn create_reply(&self, comment_id: i64, body: &NewReply) -> Result<Reply, ApiError> {
        ApiClient::create_reply(self, comment_id, body).await
    }

    async fn update_reply(&self, comment_id: i64, reply_id: i64, body: &ReplyUpdate) -> Result<(), ApiError> {
        ApiClient::update_reply(self, comment_id, reply_id, body).await
    }

    async fn delete_reply(&self, comment_id: i64, reply_id: i64) -> Result<(), ApiError> {
        ApiClient::delete_reply(self, comment_id, reply_id).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
