//! Client-side state synchronization core for the Tangle neighbourhood
//! app: session-aware API client, optimistic feed store, comment overlay
//! controller, post composer and location enrichment. Rendering and
//! navigation live elsewhere; this crate owns the state they draw from.

pub mod api;
pub mod auth;
pub mod comments;
pub mod composer;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod geo;
pub mod session;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

pub use api::{HttpApi, ImagePart, NewPostForm, TangleApi};
pub use auth::AuthStore;
pub use comments::{CommentThread, ThreadComment};
pub use composer::{Draft, PostComposer};
pub use config::{ClientConfig, Platform};
pub use error::{ApiError, ComposerError, GeoError, SubmitError};
pub use events::{Notice, NoticeKind, Notifier, UiEvent};
pub use feed::{CreateStatus, FeedStore};
pub use geo::{HttpGeocoder, LocationProvider, ResolvedLocation, ReverseGeocoder};
pub use session::Session;

/// Fully wired client. One session, one HTTP adapter, and the stores that
/// share them — built here so nothing reaches for ambient state.
pub struct Tangle {
    pub session: Arc<Session>,
    pub auth: Arc<AuthStore>,
    pub feed: Arc<FeedStore>,
    pub comments: Arc<CommentThread>,
    pub composer: Arc<PostComposer>,
    pub geocoder: Arc<HttpGeocoder>,
}

impl Tangle {
    /// Wires everything up and hands back the event stream the
    /// presentation layer drains for toasts and navigation signals.
    pub fn new(config: ClientConfig) -> (Tangle, UnboundedReceiver<UiEvent>) {
        let (events, rx) = Notifier::channel();
        let session = Arc::new(Session::new());
        let api: Arc<dyn TangleApi> = Arc::new(HttpApi::new(&config, session.clone()));
        let feed = Arc::new(FeedStore::new(api.clone(), events.clone()));
        let comments = Arc::new(CommentThread::new(
            api.clone(),
            feed.clone(),
            session.clone(),
            events.clone(),
        ));
        let composer = Arc::new(PostComposer::new(
            session.clone(),
            feed.clone(),
            config.platform,
        ));
        let auth = Arc::new(AuthStore::new(api, session.clone(), events));
        let geocoder = Arc::new(HttpGeocoder::new(&config));
        (
            Tangle {
                session,
                auth,
                feed,
                comments,
                composer,
                geocoder,
            },
            rx,
        )
    }
}
