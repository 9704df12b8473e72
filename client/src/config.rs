use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://tangle-asy7.onrender.com";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Every API request gives up after this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Device position acquisition is slower than a plain request.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// The iOS picker hands back `file://` URIs the upload path cannot
    /// open; Android paths pass through untouched.
    pub fn normalize_uri<'a>(&self, uri: &'a str) -> &'a str {
        match self {
            Platform::Ios => uri.strip_prefix("file://").unwrap_or(uri),
            Platform::Android => uri,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub geocoder_url: String,
    pub timeout: Duration,
    pub platform: Platform,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
            platform: Platform::Android,
        }
    }
}

impl ClientConfig {
    /// Environment overrides for dev builds, falling back to the hosted
    /// instance.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("TANGLE_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            geocoder_url: std::env::var("TANGLE_GEOCODER_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string()),
            ..Self::default()
        }
    }
}
