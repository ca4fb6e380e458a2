use super::*;
use serde_json::json;

// =============================================================================
// Comment / Reply
// =============================================================================

#[test]
fn comment_without_replies_field_gets_empty_list() {
    let raw = json!({
        "id": 3,
        "postId": 10,
        "content": "좋은 글이네요",
        "authorId": 7,
        "authorName": "하늘",
        "date": "2025-03-28"
    });
    let comment: Comment = serde_json::from_value(raw).unwrap();
    assert_eq!(comment.id, 3);
    assert_eq!(comment.post_id, 10);
    assert!(comment.replies.is_empty());
}

#[test]
fn comment_with_replies_keeps_order() {
    let raw = json!({
        "id": 1, "postId": 1, "content": "c", "authorId": 1, "authorName": "a",
        "replies": [
            { "id": 11, "commentId": 1, "content": "first", "authorId": 2, "authorName": "b" },
            { "id": 12, "commentId": 1, "content": "second", "authorId": 3, "authorName": "c" }
        ]
    });
    let comment: Comment = serde_json::from_value(raw).unwrap();
    let ids: Vec<i64> = comment.replies.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![11, 12]);
    assert_eq!(comment.replies[0].date, "");
}

#[test]
fn new_comment_serializes_camel_case() {
    let body = NewComment { content: "hi".into(), author_id: 4, author_name: "d".into() };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value, json!({ "content": "hi", "authorId": 4, "authorName": "d" }));
}

// =============================================================================
// Voice channels
// =============================================================================

#[test]
fn voice_channel_parses_backend_shape() {
    let raw = json!({
        "channelId": "ch-1",
        "channelName": "수다방",
        "maxPlayer": 6,
        "hasPassword": true,
        "description": null,
        "creatorId": 9,
        "creatorNickname": "별",
        "createdAt": "2025-03-30T12:00:00",
        "category": 1
    });
    let channel: VoiceChannel = serde_json::from_value(raw).unwrap();
    assert_eq!(channel.channel_id, "ch-1");
    assert!(channel.has_password);
    assert!(channel.description.is_none());
}

#[test]
fn new_voice_channel_omits_missing_password() {
    let body = NewVoiceChannel { channel_name: "room".into(), max_player: 4, password: None, description: None };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value, json!({ "channelName": "room", "maxPlayer": 4 }));
}

// =============================================================================
// Counselor
// =============================================================================

#[test]
fn entry_decision_serializes_lowercase() {
    assert_eq!(serde_json::to_value(EntryDecision::Accept).unwrap(), json!("accept"));
    assert_eq!(serde_json::to_value(EntryDecision::Reject).unwrap(), json!("reject"));
}

#[test]
fn counselor_profile_tolerates_sparse_body() {
    let raw = json!({ "userId": 5, "nickname": "상담사", "hasCertification": true });
    let profile: CounselorProfile = serde_json::from_value(raw).unwrap();
    assert_eq!(profile.user_id, Some(5));
    assert!(profile.has_certification);
    assert!(profile.bio.is_none());
}

#[test]
fn profile_update_only_sends_set_fields() {
    let update = CounselorProfileUpdate { bio: Some("안녕하세요".into()), ..Default::default() };
    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(value, json!({ "bio": "안녕하세요" }));
}

// =============================================================================
// Counselor channels and reviews
// =============================================================================

#[test]
fn counselor_channel_accepts_snake_case_fields() {
    let raw = json!({
        "id": 1,
        "name": "다혜 상담사",
        "speciality": "자존감 향상",
        "years": 5,
        "rating_avg": 4.8,
        "review_count": 24,
        "profile_url": "",
        "status": "가능"
    });
    let channel: CounselorChannel = serde_json::from_value(raw).unwrap();
    assert_eq!(channel.specialty.as_deref(), Some("자존감 향상"));
    assert_eq!(channel.rating_avg, Some(4.8));
    assert_eq!(channel.review_count, Some(24));
    assert!(channel.is_available());
    assert!(!channel.has_certification);
}

#[test]
fn channel_page_without_content_is_empty() {
    let page: Page<CounselorChannel> = serde_json::from_value(json!({ "totalElements": 0 })).unwrap();
    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 0);
}

#[test]
fn counseling_review_serializes_camel_case() {
    let review = NewCounselingReview { counselor_id: Some(3), rating: 4, review_text: "감사합니다".into() };
    let value = serde_json::to_value(&review).unwrap();
    assert_eq!(value, json!({ "counselorId": 3, "rating": 4, "reviewText": "감사합니다" }));
}
