use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tangle_shared::PostType;

use crate::api::{ImagePart, NewPostForm};
use crate::config::Platform;
use crate::error::{ComposerError, SubmitError};
use crate::feed::FeedStore;
use crate::geo::{self, LocationProvider, ResolvedLocation, ReverseGeocoder};
use crate::session::Session;

pub const MAX_IMAGES: usize = 4;
pub const MAX_POST_LEN: usize = 500;
/// Submitted when the viewer never resolved a location.
pub const DEFAULT_LOCATION: &str = "mohali";

/// Composer-local draft; nothing here is persisted until submit succeeds.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: String,
    pub post_type: PostType,
    pub images: Vec<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub location: Option<ResolvedLocation>,
}

/// Collects a draft post and submits it as one multipart request through
/// the feed store's status machine. The draft survives a failed submit for
/// retry; it is only cleared after a success.
pub struct PostComposer {
    session: Arc<Session>,
    feed: Arc<FeedStore>,
    platform: Platform,
    draft: Mutex<Draft>,
}

impl PostComposer {
    pub fn new(session: Arc<Session>, feed: Arc<FeedStore>, platform: Platform) -> Self {
        Self {
            session,
            feed,
            platform,
            draft: Mutex::new(Draft::default()),
        }
    }

    pub fn set_text(&self, text: &str) {
        let mut draft = self.draft.lock().unwrap();
        draft.text = text.chars().take(MAX_POST_LEN).collect();
    }

    pub fn set_post_type(&self, post_type: PostType) {
        self.draft.lock().unwrap().post_type = post_type;
    }

    pub fn set_event_date(&self, date: Option<DateTime<Utc>>) {
        self.draft.lock().unwrap().event_date = date;
    }

    pub fn set_location(&self, location: ResolvedLocation) {
        self.draft.lock().unwrap().location = Some(location);
    }

    pub fn draft(&self) -> Draft {
        self.draft.lock().unwrap().clone()
    }

    pub fn remaining_image_slots(&self) -> usize {
        MAX_IMAGES - self.draft.lock().unwrap().images.len().min(MAX_IMAGES)
    }

    pub fn attach_image(&self, uri: impl Into<String>) -> Result<(), ComposerError> {
        let mut draft = self.draft.lock().unwrap();
        if draft.images.len() >= MAX_IMAGES {
            return Err(ComposerError::ImageLimit);
        }
        draft.images.push(uri.into());
        Ok(())
    }

    pub fn remove_image(&self, index: usize) {
        let mut draft = self.draft.lock().unwrap();
        if index < draft.images.len() {
            draft.images.remove(index);
        }
    }

    /// Runs the platform picker only when a slot is free: a full draft
    /// surfaces the limit notice without ever opening the gallery.
    /// Returns whether an image was attached (`false` = viewer cancelled).
    pub async fn pick_image<F, Fut>(&self, picker: F) -> Result<bool, ComposerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        if self.remaining_image_slots() == 0 {
            return Err(ComposerError::ImageLimit);
        }
        match picker().await {
            Some(uri) => {
                self.attach_image(uri)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Best-effort location enrichment; a failure leaves the draft as-is
    /// and never blocks submission.
    pub async fn resolve_location(
        &self,
        provider: &dyn LocationProvider,
        geocoder: &dyn ReverseGeocoder,
    ) -> Result<ResolvedLocation, crate::error::GeoError> {
        let resolved = geo::resolve_location(provider, geocoder).await?;
        self.draft.lock().unwrap().location = Some(resolved.clone());
        Ok(resolved)
    }

    /// Validates (identity, then text, then images — first failure wins),
    /// assembles the multipart payload and submits it. On success the
    /// draft is cleared; the caller refreshes the feed to pick up the new
    /// post in canonical order.
    pub async fn submit(&self) -> Result<(), SubmitError> {
        let draft = self.draft.lock().unwrap().clone();
        let user_id = self.validate(&draft)?;
        let form = self.build_form(&draft, user_id).await?;
        self.feed.create_post(form).await?;
        *self.draft.lock().unwrap() = Draft::default();
        Ok(())
    }

    fn validate(&self, draft: &Draft) -> Result<String, ComposerError> {
        let user_id = self.session.user_id().ok_or(ComposerError::NotSignedIn)?;
        if draft.text.trim().is_empty() {
            return Err(ComposerError::EmptyText);
        }
        if draft.images.is_empty() {
            return Err(ComposerError::NoImages);
        }
        Ok(user_id)
    }

    async fn build_form(
        &self,
        draft: &Draft,
        user_id: String,
    ) -> Result<NewPostForm, ComposerError> {
        let mut images = Vec::with_capacity(draft.images.len());
        for (index, uri) in draft.images.iter().enumerate() {
            let path = self.platform.normalize_uri(uri);
            let data = tokio::fs::read(path)
                .await
                .map_err(|_| ComposerError::ImageRead { uri: uri.clone() })?;
            images.push(ImagePart {
                file_name: format!("post_{index}.jpg"),
                data,
            });
        }
        Ok(NewPostForm {
            desc: draft.text.trim().to_string(),
            post_type: draft.post_type.as_str().to_string(),
            user_id,
            location: draft
                .location
                .as_ref()
                .map(|l| l.address.clone())
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            tags: hashtags(&draft.text),
            event_date: draft.event_date.map(|d| d.to_rfc3339()),
            images,
        })
    }
}

/// `#TangleTogether`-style tags typed into the post body, deduplicated
/// case-insensitively in first-seen order.
pub fn hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let Some(rest) = word.strip_prefix('#') else {
            continue;
        };
        let tag: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }
    tags
}
