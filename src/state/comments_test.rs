use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

// =========================================================================
// FakeComments
// =========================================================================

/// Scripted service: pops queued failures first, otherwise succeeds and
/// hands out sequential ids.
#[derive(Default)]
struct FakeComments {
    listing: Mutex<Vec<Comment>>,
    failures: Mutex<VecDeque<ApiError>>,
    calls: Mutex<Vec<String>>,
    next_id: Mutex<i64>,
}

impl FakeComments {
    fn with_listing(listing: Vec<Comment>) -> Arc<Self> {
        Arc::new(Self { listing: Mutex::new(listing), next_id: Mutex::new(100), ..Self::default() })
    }

    fn fail_next(&self, err: ApiError) {
        self.failures.lock().unwrap().push_back(err);
    }

    fn call(&self, name: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(name);
        match self.failures.lock().unwrap().pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn id(&self) -> i64 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        *next
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommentService for FakeComments {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.call(format!("list:{post_id}"))?;
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn create_comment(&self, post_id: i64, body: &NewComment) -> Result<Comment, ApiError> {
        self.call(format!("create:{post_id}"))?;
        Ok(Comment {
            id: self.id(),
            post_id,
            content: body.content.clone(),
            author_id: body.author_id,
            author_name: body.author_name.clone(),
            date: "2025-04-01".into(),
            replies: Vec::new(),
        })
    }

    async fn update_comment(&self, comment_id: i64, _body: &CommentUpdate) -> Result<(), ApiError> {
        self.call(format!("update:{comment_id}"))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        self.call(format!("delete:{comment_id}"))
    }

    async fn create_reply(&self, comment_id: i64, body: &NewReply) -> Result<Reply, ApiError> {
        self.call(format!("reply:{comment_id}"))?;
        Ok(Reply {
            id: self.id(),
            comment_id,
            content: body.content.clone(),
            author_id: body.author_id,
            author_name: body.author_name.clone(),
            date: "2025-04-01".into(),
        })
    }

    async fn update_reply(&self, comment_id: i64, reply_id: i64, _body: &ReplyUpdate) -> Result<(), ApiError> {
        self.call(format!("update-reply:{comment_id}/{reply_id}"))
    }

    async fn delete_reply(&self, comment_id: i64, reply_id: i64) -> Result<(), ApiError> {
        self.call(format!("delete-reply:{comment_id}/{reply_id}"))
    }
}

// =========================================================================
// Fixtures
// =========================================================================

fn comment(id: i64, content: &str) -> Comment {
    Comment {
        id,
        post_id: 1,
        content: content.into(),
        author_id: 7,
        author_name: "하늘".into(),
        date: "2025-03-30".into(),
        replies: Vec::new(),
    }
}

fn reply(id: i64, comment_id: i64, content: &str) -> Reply {
    Reply {
        id,
        comment_id,
        content: content.into(),
        author_id: 8,
        author_name: "바다".into(),
        date: "2025-03-31".into(),
    }
}

fn new_comment(content: &str) -> NewComment {
    NewComment { content: content.into(), author_id: 7, author_name: "하늘".into() }
}

fn new_reply(content: &str) -> NewReply {
    NewReply { content: content.into(), author_id: 8, author_name: "바다".into() }
}

fn server_error() -> ApiError {
    ApiError::Status { status: 500, body: String::new() }
}

async fn loaded(listing: Vec<Comment>) -> (CommentStore, Arc<FakeComments>) {
    let service = FakeComments::with_listing(listing);
    let mut store = CommentStore::new(service.clone());
    store.fetch_comments(1).await.unwrap();
    (store, service)
}

fn ids(store: &CommentStore) -> Vec<i64> {
    store.comments().iter().map(|c| c.id).collect()
}

// =========================================================================
// fetch_comments
// =========================================================================

#[tokio::test]
async fn fetch_replaces_list() {
    let (store, _) = loaded(vec![comment(1, "a"), comment(2, "b")]).await;
    assert_eq!(ids(&store), vec![1, 2]);
    assert_eq!(store.post_id(), Some(1));
    assert!(!store.is_loading());
    assert!(store.error().is_none());
}

#[tokio::test]
async fn fetch_failure_keeps_previous_list() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    service.fail_next(server_error());

    assert!(store.fetch_comments(1).await.is_err());
    assert_eq!(ids(&store), vec![1]);
    assert_eq!(store.error(), Some("댓글을 불러오지 못했습니다."));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn fetch_without_response_reports_unreachable() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    service.fail_next(ApiError::Transport("connection refused".into()));

    assert!(store.fetch_comments(1).await.is_err());
    assert_eq!(store.error(), Some(crate::net::error::UNREACHABLE_MESSAGE));
}

// =========================================================================
// Comments
// =========================================================================

#[tokio::test]
async fn add_appends_server_comment_at_end() {
    let (mut store, _) = loaded(vec![comment(1, "a"), comment(2, "b")]).await;
    let added = store.add_comment(1, &new_comment("c")).await.unwrap();
    assert_eq!(added.id, 101);
    assert_eq!(added.content, "c");
    assert_eq!(ids(&store), vec![1, 2, 101]);
}

#[tokio::test]
async fn add_failure_leaves_list_unchanged() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    service.fail_next(server_error());

    assert!(store.add_comment(1, &new_comment("c")).await.is_err());
    assert_eq!(ids(&store), vec![1]);
    assert!(store.error().is_some());
}

#[tokio::test]
async fn add_to_another_post_leaves_tree_alone() {
    let (mut store, service) = loaded(vec![comment(101, "post one")]).await;
    *service.next_id.lock().unwrap() = 100;

    let created = store.add_comment(2, &new_comment("post two")).await.unwrap();
    assert_eq!(created.post_id, 2);
    assert_eq!(created.id, 101);
    assert_eq!(store.post_id(), Some(1));
    assert_eq!(store.comments().len(), 1);
    assert_eq!(store.comments()[0].content, "post one");
}

#[tokio::test]
async fn add_with_existing_id_replaces_instead_of_duplicating() {
    let (mut store, service) = loaded(vec![comment(101, "old")]).await;
    *service.next_id.lock().unwrap() = 100;

    store.add_comment(1, &new_comment("new")).await.unwrap();
    assert_eq!(ids(&store), vec![101]);
    assert_eq!(store.comments()[0].content, "new");
}

#[tokio::test]
async fn update_changes_only_target_in_place() {
    let (mut store, _) = loaded(vec![comment(1, "a"), comment(2, "b"), comment(3, "c")]).await;
    store
        .update_comment(2, &CommentUpdate { content: "B!".into() })
        .await
        .unwrap();

    let contents: Vec<&str> = store.comments().iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["a", "B!", "c"]);
}

#[tokio::test]
async fn update_unknown_comment_fails_without_network() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    let before = service.call_count();

    let err = store
        .update_comment(9, &CommentUpdate { content: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::CommentNotFound(9)));
    assert_eq!(service.call_count(), before);
}

#[tokio::test]
async fn update_failure_keeps_old_content() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    service.fail_next(server_error());

    assert!(store.update_comment(1, &CommentUpdate { content: "x".into() }).await.is_err());
    assert_eq!(store.comments()[0].content, "a");
}

#[tokio::test]
async fn delete_removes_only_target() {
    let (mut store, _) = loaded(vec![comment(1, "a"), comment(2, "b"), comment(3, "c")]).await;
    store.delete_comment(2).await.unwrap();
    assert_eq!(ids(&store), vec![1, 3]);
}

#[tokio::test]
async fn delete_unknown_comment_is_noop() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    let before = service.call_count();
    store.delete_comment(42).await.unwrap();
    assert_eq!(ids(&store), vec![1]);
    assert_eq!(service.call_count(), before);
}

#[tokio::test]
async fn delete_not_found_on_server_still_removes_locally() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    service.fail_next(ApiError::Status { status: 404, body: String::new() });
    store.delete_comment(1).await.unwrap();
    assert!(store.comments().is_empty());
}

#[tokio::test]
async fn delete_failure_keeps_comment() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    service.fail_next(server_error());
    assert!(store.delete_comment(1).await.is_err());
    assert_eq!(ids(&store), vec![1]);
}

// =========================================================================
// Replies
// =========================================================================

#[tokio::test]
async fn add_reply_appends_to_parent() {
    let mut parent = comment(1, "a");
    parent.replies.push(reply(10, 1, "first"));
    let (mut store, _) = loaded(vec![parent, comment(2, "b")]).await;

    store.add_reply(1, &new_reply("second")).await.unwrap();

    let replies = &store.comment(1).unwrap().replies;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].id, 10);
    assert_eq!(replies[1].content, "second");
    assert_eq!(replies[1].comment_id, 1);
    assert!(store.comment(2).unwrap().replies.is_empty());
}

#[tokio::test]
async fn add_reply_to_unknown_comment_fails_without_network() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    let before = service.call_count();
    let err = store.add_reply(5, &new_reply("x")).await.unwrap_err();
    assert!(matches!(err, CommentError::CommentNotFound(5)));
    assert_eq!(service.call_count(), before);
}

#[tokio::test]
async fn update_reply_changes_target_only() {
    let mut parent = comment(1, "a");
    parent.replies = vec![reply(10, 1, "x"), reply(11, 1, "y")];
    let (mut store, _) = loaded(vec![parent]).await;

    store
        .update_reply(1, 11, &ReplyUpdate { content: "Y!".into() })
        .await
        .unwrap();

    let replies = &store.comment(1).unwrap().replies;
    assert_eq!(replies[0].content, "x");
    assert_eq!(replies[1].content, "Y!");
}

#[tokio::test]
async fn update_missing_reply_reports_which_is_missing() {
    let (mut store, _) = loaded(vec![comment(1, "a")]).await;

    let err = store
        .update_reply(1, 99, &ReplyUpdate { content: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::ReplyNotFound { comment_id: 1, reply_id: 99 }));

    let err = store
        .update_reply(7, 99, &ReplyUpdate { content: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::CommentNotFound(7)));
}

#[tokio::test]
async fn delete_reply_removes_only_target() {
    let mut parent = comment(1, "a");
    parent.replies = vec![reply(10, 1, "x"), reply(11, 1, "y"), reply(12, 1, "z")];
    let (mut store, _) = loaded(vec![parent]).await;

    store.delete_reply(1, 11).await.unwrap();
    let remaining: Vec<i64> = store.comment(1).unwrap().replies.iter().map(|r| r.id).collect();
    assert_eq!(remaining, vec![10, 12]);

    // Absent reply: no-op.
    store.delete_reply(1, 11).await.unwrap();
    assert_eq!(store.comment(1).unwrap().replies.len(), 2);
}

#[tokio::test]
async fn reset_clears_everything() {
    let (mut store, _) = loaded(vec![comment(1, "a")]).await;
    store.reset();
    assert!(store.comments().is_empty());
    assert!(store.post_id().is_none());
}

#[tokio::test]
async fn added_comment_appears_once_after_refetch() {
    let (mut store, service) = loaded(vec![comment(1, "a")]).await;
    let added = store.add_comment(1, &new_comment("b")).await.unwrap();
    service.listing.lock().unwrap().push(added.clone());

    store.fetch_comments(1).await.unwrap();
    assert_eq!(store.comments().iter().filter(|c| c.id == added.id).count(), 1);
}

#[tokio::test]
async fn replies_keep_call_order() {
    let (mut store, _) = loaded(vec![comment(2, "a")]).await;
    for text in ["하나", "둘", "셋", "넷"] {
        store.add_reply(2, &new_reply(text)).await.unwrap();
    }
    let contents: Vec<&str> = store.comment(2).unwrap().replies.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["하나", "둘", "셋", "넷"]);
}

#[tokio::test]
async fn delete_twice_is_harmless() {
    let (mut store, _) = loaded(vec![comment(1, "a"), comment(2, "b")]).await;
    store.delete_comment(1).await.unwrap();
    let after_first = ids(&store);
    store.delete_comment(1).await.unwrap();
    assert_eq!(ids(&store), after_first);
}
