use thiserror::Error;

/// Failures crossing the remote API boundary.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    /// 4xx/5xx, or a 2xx envelope with `success: false`.
    #[error("server rejected request ({status})")]
    Server { status: u16, message: Option<String> },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Toast-ready text: the server's own message verbatim when it sent
    /// one, otherwise a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            _ => "Network request failed".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Local draft rejections. Each variant carries its own user-facing
/// message; none of these reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    #[error("You need to be signed in to post")]
    NotSignedIn,

    #[error("Write something before posting")]
    EmptyText,

    #[error("Add at least one photo")]
    NoImages,

    #[error("You can attach up to 4 photos")]
    ImageLimit,

    #[error("Could not read image {uri}")]
    ImageRead { uri: String },
}

/// Either side of a post submission going wrong: the draft was invalid, or
/// the request itself failed. The draft survives both.
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ComposerError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Error)]
pub enum GeoError {
    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location request timed out")]
    Timeout,
}
