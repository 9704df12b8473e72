use std::sync::{Arc, Mutex};

use tangle_shared::Comment;
use uuid::Uuid;

use crate::api::TangleApi;
use crate::error::ApiError;
use crate::events::{Notifier, UiEvent};
use crate::feed::FeedStore;
use crate::session::Session;

/// Timestamp sentinel for entries the server has not dated yet.
pub const JUST_NOW: &str = "Just now";

/// One entry of an open thread. Client-created comments keep their
/// temporary id even after the server accepts them — the add-comment
/// endpoint returns no canonical id to reconcile against, and a reopened
/// thread refetches everything as `Confirmed` anyway.
#[derive(Debug, Clone)]
pub enum ThreadComment {
    Pending {
        temp_id: Uuid,
        author: String,
        avatar: Option<String>,
        text: String,
        posted_at: String,
    },
    Confirmed {
        id: String,
        author: String,
        avatar: Option<String>,
        text: String,
        posted_at: String,
    },
}

impl ThreadComment {
    pub fn text(&self) -> &str {
        match self {
            ThreadComment::Pending { text, .. } | ThreadComment::Confirmed { text, .. } => text,
        }
    }

    pub fn author(&self) -> &str {
        match self {
            ThreadComment::Pending { author, .. } | ThreadComment::Confirmed { author, .. } => {
                author
            }
        }
    }

    pub fn posted_at(&self) -> &str {
        match self {
            ThreadComment::Pending { posted_at, .. }
            | ThreadComment::Confirmed { posted_at, .. } => posted_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ThreadComment::Pending { .. })
    }

    fn from_wire(comment: Comment) -> Self {
        let (author, avatar) = match comment.user_id {
            Some(user) => (user.name, user.profile_image),
            None => ("User".to_string(), None),
        };
        ThreadComment::Confirmed {
            id: comment.id,
            author,
            avatar,
            text: comment.comment,
            posted_at: comment.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct ThreadState {
    post_id: Option<String>,
    comments: Vec<ThreadComment>,
    loading: bool,
    error: Option<String>,
    epoch: u64,
}

/// Lifecycle of the one comment thread currently on screen. Independent of
/// the feed store except for the `post_id` key and the counter bump that
/// goes through it.
pub struct CommentThread {
    api: Arc<dyn TangleApi>,
    feed: Arc<FeedStore>,
    session: Arc<Session>,
    events: Notifier,
    state: Mutex<ThreadState>,
}

impl CommentThread {
    pub fn new(
        api: Arc<dyn TangleApi>,
        feed: Arc<FeedStore>,
        session: Arc<Session>,
        events: Notifier,
    ) -> Self {
        Self {
            api,
            feed,
            session,
            events,
            state: Mutex::new(ThreadState::default()),
        }
    }

    /// Opens the overlay for a post and fetches its thread. `None` is a
    /// stale trigger and is ignored. Opening another post while a fetch is
    /// in flight orphans the older fetch: its response is discarded, the
    /// last-opened post wins.
    pub async fn open(&self, post_id: Option<&str>) {
        let Some(post_id) = post_id else { return };
        let epoch = {
            let mut state = self.state.lock().unwrap();
            state.epoch += 1;
            state.post_id = Some(post_id.to_string());
            state.comments.clear();
            state.loading = true;
            state.error = None;
            state.epoch
        };

        let result = self.api.get_post_comments(post_id).await;

        let mut state = self.state.lock().unwrap();
        if state.epoch != epoch {
            tracing::debug!(post_id, "discarding stale comment thread response");
            return;
        }
        state.loading = false;
        match result {
            Ok(comments) => {
                state.comments = comments.into_iter().map(ThreadComment::from_wire).collect();
            }
            Err(err) => state.error = Some(err.user_message()),
        }
    }

    /// Appends the viewer's comment optimistically, then posts it through
    /// the feed store (which owns the counter bump). Empty or
    /// whitespace-only input is dropped without a network call or any
    /// state change. A failed post keeps the optimistic entry on screen
    /// next to the error.
    pub async fn submit(&self, text: &str) -> Result<(), ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let Some(post_id) = self.state.lock().unwrap().post_id.clone() else {
            return Ok(());
        };

        let (author, avatar) = match self.session.user() {
            Some(user) => (user.name, user.emoji.or(user.profile_image)),
            None => ("You".to_string(), None),
        };
        self.state
            .lock()
            .unwrap()
            .comments
            .insert(
                0,
                ThreadComment::Pending {
                    temp_id: Uuid::new_v4(),
                    author,
                    avatar,
                    text: text.to_string(),
                    posted_at: JUST_NOW.to_string(),
                },
            );

        match self.feed.add_comment(&post_id, text).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let mut state = self.state.lock().unwrap();
                if state.post_id.as_deref() == Some(post_id.as_str()) {
                    state.error = Some(err.user_message());
                }
                Err(err)
            }
        }
    }

    /// Discards the thread and signals the presentation layer to dismiss
    /// the overlay. An in-flight fetch becomes stale.
    pub fn close(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.epoch += 1;
            state.post_id = None;
            state.comments.clear();
            state.loading = false;
            state.error = None;
        }
        self.events.emit(UiEvent::CommentsClosed);
    }

    // ── Snapshots ──

    pub fn post_id(&self) -> Option<String> {
        self.state.lock().unwrap().post_id.clone()
    }

    pub fn comments(&self) -> Vec<ThreadComment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{post, user, wire_comment, StubApi};

    struct Fixture {
        api: Arc<StubApi>,
        feed: Arc<FeedStore>,
        session: Arc<Session>,
        thread: Arc<CommentThread>,
        rx: tokio::sync::mpsc::UnboundedReceiver<UiEvent>,
    }

    fn fixture() -> Fixture {
        let api = StubApi::new();
        let (events, rx) = Notifier::channel();
        let feed = Arc::new(FeedStore::new(api.clone(), events.clone()));
        let session = Arc::new(Session::new());
        let thread = Arc::new(CommentThread::new(
            api.clone(),
            feed.clone(),
            session.clone(),
            events,
        ));
        Fixture {
            api,
            feed,
            session,
            thread,
            rx,
        }
    }

    #[tokio::test]
    async fn open_without_a_post_id_is_a_no_op() {
        let fx = fixture();
        fx.thread.open(None).await;
        assert_eq!(fx.thread.post_id(), None);
        assert_eq!(fx.api.call_count("get_comments:"), 0);
    }

    #[tokio::test]
    async fn open_fetches_and_maps_the_thread() {
        let fx = fixture();
        fx.api.comments.lock().unwrap().insert(
            "p1".to_string(),
            Ok(vec![wire_comment("c1", "first"), wire_comment("c2", "second")]),
        );
        fx.thread.open(Some("p1")).await;

        assert_eq!(fx.thread.post_id().as_deref(), Some("p1"));
        assert!(!fx.thread.is_loading());
        let comments = fx.thread.comments();
        assert_eq!(comments.len(), 2);
        assert!(comments.iter().all(|c| !c.is_pending()));
        assert_eq!(comments[0].text(), "first");
        assert_eq!(comments[0].author(), "Carol");
    }

    #[tokio::test]
    async fn stale_thread_response_never_lands() {
        let fx = fixture();
        fx.api
            .comments
            .lock()
            .unwrap()
            .insert("a".to_string(), Ok(vec![wire_comment("ca", "from a")]));
        fx.api
            .comments
            .lock()
            .unwrap()
            .insert("b".to_string(), Ok(vec![wire_comment("cb", "from b")]));

        let gate = fx.api.gate("get_comments:a");
        let slow = tokio::spawn({
            let thread = fx.thread.clone();
            async move { thread.open(Some("a")).await }
        });
        tokio::task::yield_now().await;

        // Viewer switches to post B before A's fetch resolves.
        fx.thread.open(Some("b")).await;
        assert_eq!(fx.thread.comments()[0].text(), "from b");

        // A's response arrives last; the overlay must still show B.
        gate.release();
        slow.await.unwrap();
        assert_eq!(fx.thread.post_id().as_deref(), Some("b"));
        let comments = fx.thread.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text(), "from b");
    }

    #[tokio::test]
    async fn response_after_close_is_discarded() {
        let fx = fixture();
        fx.api
            .comments
            .lock()
            .unwrap()
            .insert("a".to_string(), Ok(vec![wire_comment("ca", "late")]));

        let gate = fx.api.gate("get_comments:a");
        let slow = tokio::spawn({
            let thread = fx.thread.clone();
            async move { thread.open(Some("a")).await }
        });
        tokio::task::yield_now().await;

        fx.thread.close();
        gate.release();
        slow.await.unwrap();

        assert_eq!(fx.thread.post_id(), None);
        assert!(fx.thread.comments().is_empty());
    }

    #[tokio::test]
    async fn whitespace_submit_changes_nothing() {
        let fx = fixture();
        fx.thread.open(Some("p1")).await;
        fx.thread.submit("   \n").await.unwrap();
        assert!(fx.thread.comments().is_empty());
        assert_eq!(fx.api.call_count("add_comment:"), 0);
    }

    #[tokio::test]
    async fn submit_prepends_a_pending_entry_and_bumps_the_feed_counter() {
        let mut fx = fixture();
        fx.session.set_credentials("tok", user("u1", "Asha"));
        fx.api
            .posts_results
            .lock()
            .unwrap()
            .push_back(Ok(vec![post("p1", 0)]));
        fx.feed.refresh().await.unwrap();
        fx.api
            .comments
            .lock()
            .unwrap()
            .insert("p1".to_string(), Ok(vec![wire_comment("c1", "earlier")]));
        fx.thread.open(Some("p1")).await;

        fx.thread.submit("hello neighbours").await.unwrap();

        let comments = fx.thread.comments();
        assert_eq!(comments.len(), 2);
        assert!(comments[0].is_pending());
        assert_eq!(comments[0].author(), "Asha");
        assert_eq!(comments[0].posted_at(), JUST_NOW);
        assert_eq!(comments[0].text(), "hello neighbours");
        // Counter lives in the feed store, bumped exactly once.
        assert_eq!(fx.feed.post("p1").unwrap().total_comments, 1);
        // Success notice came through the typed channel.
        let mut saw_success = false;
        while let Ok(event) = fx.rx.try_recv() {
            if matches!(
                &event,
                UiEvent::Notice(notice) if notice.kind == crate::events::NoticeKind::Success
            ) {
                saw_success = true;
            }
        }
        assert!(saw_success);
    }

    #[tokio::test]
    async fn counter_bumps_even_when_the_overlay_is_elsewhere() {
        let fx = fixture();
        fx.api
            .posts_results
            .lock()
            .unwrap()
            .push_back(Ok(vec![post("p1", 0), post("p2", 0)]));
        fx.feed.refresh().await.unwrap();

        // Comment submitted for p1 while the overlay shows nothing at all.
        fx.feed.add_comment("p1", "drive-by").await.unwrap();
        assert_eq!(fx.feed.post("p1").unwrap().total_comments, 1);
        assert_eq!(fx.feed.post("p2").unwrap().total_comments, 0);
    }

    #[tokio::test]
    async fn failed_submit_keeps_the_pending_entry() {
        let fx = fixture();
        fx.api
            .posts_results
            .lock()
            .unwrap()
            .push_back(Ok(vec![post("p1", 0)]));
        fx.feed.refresh().await.unwrap();
        fx.thread.open(Some("p1")).await;

        fx.api
            .add_comment_results
            .lock()
            .unwrap()
            .push_back(Err(ApiError::Timeout));
        assert!(fx.thread.submit("will fail").await.is_err());

        let comments = fx.thread.comments();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_pending());
        assert_eq!(fx.thread.error().as_deref(), Some("Network request failed"));
        // No confirmation, no counter bump.
        assert_eq!(fx.feed.post("p1").unwrap().total_comments, 0);
    }

    #[tokio::test]
    async fn successful_submit_stays_pending_for_the_session() {
        let fx = fixture();
        fx.api
            .posts_results
            .lock()
            .unwrap()
            .push_back(Ok(vec![post("p1", 0)]));
        fx.feed.refresh().await.unwrap();
        fx.thread.open(Some("p1")).await;

        fx.thread.submit("sticks around").await.unwrap();
        assert!(fx.thread.comments()[0].is_pending());
    }

    #[tokio::test]
    async fn close_clears_state_and_signals_dismissal() {
        let mut fx = fixture();
        fx.api
            .comments
            .lock()
            .unwrap()
            .insert("p1".to_string(), Ok(vec![wire_comment("c1", "x")]));
        fx.thread.open(Some("p1")).await;
        assert!(!fx.thread.comments().is_empty());

        fx.thread.close();
        assert_eq!(fx.thread.post_id(), None);
        assert!(fx.thread.comments().is_empty());

        let mut saw_closed = false;
        while let Ok(event) = fx.rx.try_recv() {
            if matches!(event, UiEvent::CommentsClosed) {
                saw_closed = true;
            }
        }
        assert!(saw_closed);
    }
}
