//! Wire types shared by the REST client and the stores.
//!
//! All bodies use camelCase field names on the wire.

use serde::{Deserialize, Serialize};

// =============================================================================
// COMMUNITY
// =============================================================================

/// A top-level comment on a community post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    #[serde(default)]
    pub date: String,
    /// Missing on the wire means no replies yet.
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// A reply nested under one [`Comment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: i64,
    pub comment_id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentUpdate {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyUpdate {
    pub content: String,
}

// =============================================================================
// COUNSELOR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselorProfile {
    pub user_id: Option<i64>,
    pub counselor_id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    pub name: Option<String>,
    pub profile_url: Option<String>,
    pub gender: Option<String>,
    pub formatted_birthdate: Option<String>,
    pub specialty: Option<String>,
    pub years: Option<String>,
    pub certifications: Option<String>,
    #[serde(default)]
    pub has_certification: bool,
    pub bio: Option<String>,
    pub rating_avg: Option<f64>,
    pub review_count: Option<u32>,
    pub status: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselorProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_certification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// One counseling session summary from the counselor's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselingSummary {
    pub summary_topic: Option<String>,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub counselor_note: Option<String>,
    pub next_schedule: Option<String>,
}

/// A pending request to enter a counselor channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    pub request_id: String,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub message: String,
}

/// Owner's answer to an [`EntryRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDecision {
    Accept,
    Reject,
}

// =============================================================================
// COUNSELOR CHANNELS AND REVIEWS
// =============================================================================

/// One page of a paged listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// A counselor's bookable channel as shown in the counselor list.
///
/// The backend mixes snake_case and camelCase here, so both spellings are
/// accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselorChannel {
    pub id: i64,
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "speciality")]
    pub specialty: Option<String>,
    pub bio: Option<String>,
    #[serde(alias = "experience")]
    pub years: Option<u32>,
    #[serde(alias = "rating_avg")]
    pub rating_avg: Option<f64>,
    #[serde(alias = "review_count")]
    pub review_count: Option<u32>,
    #[serde(alias = "profile_url")]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub has_certification: bool,
    /// `가능` when the counselor is taking sessions.
    pub status: Option<String>,
}

impl CounselorChannel {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status.as_deref() == Some("가능")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCounselorChannel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Filters for [`CounselorChannel`] listings. Sent as query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CounselorChannelFilter {
    pub keyword: Option<String>,
    pub specialty: Option<String>,
    pub min_rating: Option<f64>,
    pub page: u32,
    pub size: u32,
}

impl Default for CounselorChannelFilter {
    fn default() -> Self {
        Self { keyword: None, specialty: None, min_rating: None, page: 0, size: 10 }
    }
}

/// What the backend hands back when a client enters a counselor channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConnection {
    pub session_id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselorReview {
    pub id: i64,
    #[serde(default)]
    pub content: String,
    pub rating: Option<f64>,
    #[serde(default)]
    pub date: String,
}

/// A client's rating of a finished session, 1 to 5 stars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCounselingReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counselor_id: Option<i64>,
    pub rating: u8,
    pub review_text: String,
}

// =============================================================================
// VOICE CHANNELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceChannel {
    pub channel_id: String,
    pub channel_name: String,
    pub max_player: u32,
    #[serde(default)]
    pub has_password: bool,
    pub description: Option<String>,
    pub creator_id: Option<i64>,
    pub creator_nickname: Option<String>,
    pub created_at: Option<String>,
    pub category: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVoiceChannel {
    pub channel_name: String,
    pub max_player: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordCheckResponse {
    pub is_password_correct: bool,
}

// =============================================================================
// MEDIA PROVISIONING
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionCreated {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenIssued {
    pub token: String,
}

/// Provisioning backend view of a call session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusInfo {
    pub session_id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub connection_count: u32,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
