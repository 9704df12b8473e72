use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tangle_shared::{
    Ack, AddCommentRequest, ApiEnvelope, AuthResponse, Comment, CommentsPayload,
    ForgotPasswordRequest, LikeRequest, LikeResponse, LoginRequest, MaybeWrapped, Post,
    RegisterOtpRequest, RegisterRequest, ResetPasswordRequest, VerifyOtpRequest,
};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::Session;

const LOGIN: &str = "/api/user/login";
const REGISTER_OTP: &str = "/api/user/register-otp";
const VERIFY_REGISTER_OTP: &str = "/api/user/verify-register-otp";
const FORGOT_PASSWORD: &str = "/api/user/forgot-password";
const RESET_PASSWORD: &str = "/api/user/reset-password";
const REGISTER: &str = "/api/user/register";
const GET_AVATARS: &str = "/api/user/get-emojis";
const ADD_POST: &str = "/api/user/add-post";
const GET_POSTS: &str = "/api/user/get-posts";
const LIKE_POST: &str = "/api/user/like-unlike-post";
const ADD_COMMENT: &str = "/api/user/add-comment";
const GET_COMMENTS: &str = "/api/user/get-post-comments";

/// One image of a create-post submission, already read off disk.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Prepared multipart payload for the add-post endpoint. Built by the
/// composer so the port below stays free of filesystem concerns.
#[derive(Debug, Clone, Default)]
pub struct NewPostForm {
    pub desc: String,
    pub post_type: String,
    pub user_id: String,
    pub location: String,
    pub tags: Vec<String>,
    pub event_date: Option<String>,
    pub images: Vec<ImagePart>,
}

/// Everything the stores need from the remote API. Stores depend on this
/// port, never on reqwest, so tests can script responses.
#[async_trait]
pub trait TangleApi: Send + Sync {
    async fn get_posts(&self) -> Result<Vec<Post>, ApiError>;
    async fn like_unlike_post(&self, post_id: &str) -> Result<LikeResponse, ApiError>;
    async fn add_comment(&self, post_id: &str, comment: &str) -> Result<(), ApiError>;
    async fn get_post_comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError>;
    async fn add_post(&self, form: NewPostForm) -> Result<(), ApiError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn register_otp(&self, email: &str) -> Result<(), ApiError>;
    async fn verify_register_otp(&self, email: &str, otp: &str) -> Result<(), ApiError>;
    async fn register(&self, profile: RegisterRequest) -> Result<AuthResponse, ApiError>;
    async fn forgot_password(&self, email: &str) -> Result<(), ApiError>;
    async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ApiError>;
    async fn get_avatars(&self) -> Result<Vec<String>, ApiError>;
}

/// reqwest-backed adapter. Attaches the session's bearer token to every
/// request that has one and unwraps `{ data, message, success }` envelopes.
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: Arc<Session>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            timeout: config.timeout,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.timeout(self.timeout);
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .authorize(self.http.get(self.url(path)))
            .send()
            .await
            .map_err(ApiError::from)?;
        Self::decode(resp).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .authorize(self.http.post(self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        let body = resp.bytes().await.map_err(ApiError::from)?;
        if !status.is_success() {
            // Surface the server's message verbatim when the body has one.
            let message = serde_json::from_slice::<Ack>(&body)
                .ok()
                .and_then(|ack| ack.message);
            tracing::warn!(status = status.as_u16(), "server rejected request");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn ensure_ok(ack: Ack) -> Result<(), ApiError> {
        if ack.success == Some(false) {
            return Err(ApiError::Server {
                status: 200,
                message: ack.message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TangleApi for HttpApi {
    async fn get_posts(&self) -> Result<Vec<Post>, ApiError> {
        let envelope: ApiEnvelope<Vec<Post>> = self.get_json(GET_POSTS).await?;
        envelope
            .data
            .ok_or_else(|| ApiError::Decode("post list response missing data".into()))
    }

    async fn like_unlike_post(&self, post_id: &str) -> Result<LikeResponse, ApiError> {
        let resp: LikeResponse = self
            .post_json(
                LIKE_POST,
                &LikeRequest {
                    post_id: post_id.to_string(),
                },
            )
            .await?;
        if !resp.success {
            return Err(ApiError::Server {
                status: 200,
                message: None,
            });
        }
        Ok(resp)
    }

    async fn add_comment(&self, post_id: &str, comment: &str) -> Result<(), ApiError> {
        let ack: Ack = self
            .post_json(
                ADD_COMMENT,
                &AddCommentRequest {
                    post_id: post_id.to_string(),
                    comment: comment.to_string(),
                },
            )
            .await?;
        Self::ensure_ok(ack)
    }

    async fn get_post_comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError> {
        let path = format!("{}?post_id={}", GET_COMMENTS, urlencoding::encode(post_id));
        let envelope: ApiEnvelope<CommentsPayload> = self.get_json(&path).await?;
        Ok(envelope.data.map(|d| d.comments).unwrap_or_default())
    }

    async fn add_post(&self, form: NewPostForm) -> Result<(), ApiError> {
        let mut multipart = multipart::Form::new()
            .text("desc", form.desc)
            .text("post_type", form.post_type)
            .text("user_id", form.user_id)
            .text("location", form.location);
        for tag in form.tags {
            multipart = multipart.text("tags", tag);
        }
        if let Some(date) = form.event_date {
            multipart = multipart.text("event_date", date);
        }
        for image in form.images {
            let part = multipart::Part::bytes(image.data)
                .file_name(image.file_name)
                .mime_str("image/jpeg")
                .map_err(|err| ApiError::Decode(err.to_string()))?;
            multipart = multipart.part("images", part);
        }
        let resp = self
            .authorize(self.http.post(self.url(ADD_POST)))
            .multipart(multipart)
            .send()
            .await
            .map_err(ApiError::from)?;
        let ack: Ack = Self::decode(resp).await?;
        Self::ensure_ok(ack)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let resp: MaybeWrapped<AuthResponse> = self
            .post_json(
                LOGIN,
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        Ok(resp.into_inner())
    }

    async fn register_otp(&self, email: &str) -> Result<(), ApiError> {
        let ack: Ack = self
            .post_json(
                REGISTER_OTP,
                &RegisterOtpRequest {
                    email: email.to_string(),
                },
            )
            .await?;
        Self::ensure_ok(ack)
    }

    async fn verify_register_otp(&self, email: &str, otp: &str) -> Result<(), ApiError> {
        let ack: Ack = self
            .post_json(
                VERIFY_REGISTER_OTP,
                &VerifyOtpRequest {
                    email: email.to_string(),
                    otp: otp.to_string(),
                },
            )
            .await?;
        Self::ensure_ok(ack)
    }

    async fn register(&self, profile: RegisterRequest) -> Result<AuthResponse, ApiError> {
        let resp: MaybeWrapped<AuthResponse> = self.post_json(REGISTER, &profile).await?;
        Ok(resp.into_inner())
    }

    async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let ack: Ack = self
            .post_json(
                FORGOT_PASSWORD,
                &ForgotPasswordRequest {
                    email: email.to_string(),
                },
            )
            .await?;
        Self::ensure_ok(ack)
    }

    async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ApiError> {
        let ack: Ack = self.post_json(RESET_PASSWORD, &request).await?;
        Self::ensure_ok(ack)
    }

    async fn get_avatars(&self) -> Result<Vec<String>, ApiError> {
        let envelope: ApiEnvelope<Vec<String>> = self.get_json(GET_AVATARS).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}
