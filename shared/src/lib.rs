use serde::{Deserialize, Serialize};

// ── Auth ──

/// Denormalized user snapshot as the API embeds it in posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Full profile submitted at the end of the signup flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub password: String,
}

// ── Posts ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    // Aliases keep older capitalized payloads decoding.
    #[default]
    #[serde(alias = "Discussion")]
    Discussion,
    #[serde(alias = "Event")]
    Event,
    #[serde(alias = "Vote")]
    Vote,
    #[serde(alias = "Introduction")]
    Introduction,
    #[serde(alias = "Announcement")]
    Announcement,
}

impl PostType {
    /// Wire spelling, also used for the multipart `post_type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Discussion => "discussion",
            PostType::Event => "event",
            PostType::Vote => "vote",
            PostType::Introduction => "introduction",
            PostType::Announcement => "announcement",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    /// Author snapshot.
    pub user_id: User,
    pub desc: String,
    pub post_type: PostType,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub total_likes: i64,
    #[serde(default)]
    pub total_comments: i64,
    /// Per-viewer flag; older API revisions omit it.
    #[serde(default)]
    pub is_liked: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRequest {
    pub post_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub total_likes: Option<i64>,
}

fn default_true() -> bool {
    true
}

// ── Comments ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    /// Author snapshot; absent when the account was deleted.
    #[serde(default)]
    pub user_id: Option<User>,
    pub comment: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub post_id: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentsPayload {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

// ── Envelopes ──

/// Standard `{ data, message, success }` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

/// Envelope for endpoints that return no payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Some endpoints wrap their payload in `{ data: ... }`, some return it
/// bare, and at least login has done both across API revisions.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeWrapped<T> {
    Wrapped { data: T },
    Plain(T),
}

impl<T> MaybeWrapped<T> {
    pub fn into_inner(self) -> T {
        match self {
            MaybeWrapped::Wrapped { data } => data,
            MaybeWrapped::Plain(inner) => inner,
        }
    }
}
