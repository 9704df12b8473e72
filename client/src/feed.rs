use std::sync::{Arc, Mutex};

use tangle_shared::Post;

use crate::api::{NewPostForm, TangleApi};
use crate::error::ApiError;
use crate::events::Notifier;

/// Create-post outcome, tracked separately from the post list. Both
/// terminal states are cleared back to `Idle` by an explicit reset so the
/// composer can be reused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CreateStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Default)]
struct FeedState {
    posts: Vec<Post>,
    loading: bool,
    error: Option<String>,
    create: CreateStatus,
    refresh_seq: u64,
}

/// Canonical, server-ordered post list for the current viewer. Mutations
/// are applied optimistically so the UI never waits on the network.
pub struct FeedStore {
    api: Arc<dyn TangleApi>,
    events: Notifier,
    state: Mutex<FeedState>,
}

impl FeedStore {
    pub fn new(api: Arc<dyn TangleApi>, events: Notifier) -> Self {
        Self {
            api,
            events,
            state: Mutex::new(FeedState::default()),
        }
    }

    /// Replaces the whole list with the server's current ordering. When
    /// refreshes overlap, the newest *issued* one owns the state; a
    /// response belonging to a superseded refresh is discarded.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let seq = {
            let mut state = self.state.lock().unwrap();
            state.refresh_seq += 1;
            state.loading = true;
            state.error = None;
            state.refresh_seq
        };
        let result = self.api.get_posts().await;
        let mut state = self.state.lock().unwrap();
        if state.refresh_seq != seq {
            tracing::debug!(seq, "discarding superseded feed response");
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(posts) => {
                state.posts = posts;
                Ok(())
            }
            Err(err) => {
                // The stale list stays on screen; only the error surfaces.
                state.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Flips the viewer's like state locally first, then confirms with the
    /// server. A returned `total_likes` always overwrites the local count;
    /// a failure reverts the flip by its inverse delta.
    pub async fn toggle_like(&self, post_id: &str) -> Result<(), ApiError> {
        let liked_now = {
            let mut state = self.state.lock().unwrap();
            let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) else {
                tracing::debug!(post_id, "toggle_like on a post no longer in the feed");
                return Ok(());
            };
            post.is_liked = !post.is_liked;
            post.total_likes += if post.is_liked { 1 } else { -1 };
            post.is_liked
        };

        match self.api.like_unlike_post(post_id).await {
            Ok(resp) => {
                let mut state = self.state.lock().unwrap();
                if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
                    if let Some(total) = resp.total_likes {
                        post.total_likes = total.max(0);
                    }
                }
                drop(state);
                self.events
                    .success(if liked_now { "Post liked" } else { "Like removed" });
                Ok(())
            }
            Err(err) => {
                let mut state = self.state.lock().unwrap();
                if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
                    post.is_liked = !liked_now;
                    post.total_likes += if liked_now { -1 } else { 1 };
                    if post.total_likes < 0 {
                        post.total_likes = 0;
                    }
                }
                drop(state);
                self.events.error(err.user_message());
                Err(err)
            }
        }
    }

    /// Double-tap semantics: likes, never unlikes.
    pub async fn like_if_unliked(&self, post_id: &str) -> Result<(), ApiError> {
        let already_liked = self
            .state
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.is_liked)
            .unwrap_or(true);
        if already_liked {
            return Ok(());
        }
        self.toggle_like(post_id).await
    }

    /// Posts a comment and, once the server confirms it, bumps the post's
    /// counter. The comment overlay owns the thread content; the feed only
    /// tracks the count.
    pub async fn add_comment(&self, post_id: &str, text: &str) -> Result<(), ApiError> {
        match self.api.add_comment(post_id, text).await {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
                    post.total_comments += 1;
                }
                drop(state);
                self.events.success("Comment added");
                Ok(())
            }
            Err(err) => {
                self.events.error(err.user_message());
                Err(err)
            }
        }
    }

    /// Submits a prepared multipart payload. The new post is not merged
    /// into the list; the caller refreshes after a success to pick it up
    /// in canonical order.
    pub async fn create_post(&self, form: NewPostForm) -> Result<(), ApiError> {
        self.state.lock().unwrap().create = CreateStatus::Pending;
        match self.api.add_post(form).await {
            Ok(()) => {
                self.state.lock().unwrap().create = CreateStatus::Succeeded;
                self.events.success("Post shared with your community");
                Ok(())
            }
            Err(err) => {
                let message = err.user_message();
                self.state.lock().unwrap().create = CreateStatus::Failed(message.clone());
                self.events.error(message);
                Err(err)
            }
        }
    }

    pub fn reset_create_status(&self) {
        self.state.lock().unwrap().create = CreateStatus::Idle;
    }

    // ── Snapshots ──

    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn post(&self, post_id: &str) -> Option<Post> {
        self.state
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn create_status(&self) -> CreateStatus {
        self.state.lock().unwrap().create.clone()
    }
}
