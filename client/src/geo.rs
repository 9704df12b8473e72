use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{ClientConfig, REQUEST_TIMEOUT};
use crate::error::GeoError;

#[derive(Debug, Clone, Copy)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Address attached to a draft post, with the raw fix it came from.
#[derive(Debug, Clone)]
pub struct ResolvedLocation {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Device positioning is platform-owned; the core only sees this port.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` when the service answered but had no address for the fix.
    async fn reverse(&self, position: Coordinates) -> Result<Option<String>, GeoError>;
}

/// Nominatim-style `reverse` endpoint over HTTP.
pub struct HttpGeocoder {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpGeocoder {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.geocoder_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for HttpGeocoder {
    async fn reverse(&self, position: Coordinates) -> Result<Option<String>, GeoError> {
        let url = format!(
            "{}?format=jsonv2&lat={}&lon={}",
            self.endpoint, position.latitude, position.longitude
        );
        let resp = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GeoError::Timeout
                } else {
                    GeoError::Unavailable(err.to_string())
                }
            })?;
        if !resp.status().is_success() {
            tracing::debug!(status = resp.status().as_u16(), "reverse geocode refused");
            return Ok(None);
        }
        let body: ReverseResponse = resp
            .json()
            .await
            .map_err(|err| GeoError::Unavailable(err.to_string()))?;
        Ok(body.display_name)
    }
}

/// Acquires a fix and attaches the best address available. Geocoding is
/// enrichment only: any failure there degrades to the raw coordinates.
/// Failing to get a fix at all is the only hard error.
pub async fn resolve_location(
    provider: &dyn LocationProvider,
    geocoder: &dyn ReverseGeocoder,
) -> Result<ResolvedLocation, GeoError> {
    let position = provider.current_position().await?;
    let address = match geocoder.reverse(position).await {
        Ok(Some(address)) => address,
        Ok(None) | Err(_) => format!("{:.5}, {:.5}", position.latitude, position.longitude),
    };
    Ok(ResolvedLocation {
        address,
        latitude: position.latitude,
        longitude: position.longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Coordinates);

    #[async_trait]
    impl LocationProvider for FixedProvider {
        async fn current_position(&self) -> Result<Coordinates, GeoError> {
            Ok(self.0)
        }
    }

    struct NoFix;

    #[async_trait]
    impl LocationProvider for NoFix {
        async fn current_position(&self) -> Result<Coordinates, GeoError> {
            Err(GeoError::Unavailable("permission denied".into()))
        }
    }

    struct ScriptedGeocoder(Result<Option<String>, GeoError>);

    #[async_trait]
    impl ReverseGeocoder for ScriptedGeocoder {
        async fn reverse(&self, _position: Coordinates) -> Result<Option<String>, GeoError> {
            self.0.clone()
        }
    }

    const MOHALI: Coordinates = Coordinates {
        latitude: 30.704649,
        longitude: 76.717873,
    };

    #[tokio::test]
    async fn uses_the_geocoded_address_when_available() {
        let resolved = resolve_location(
            &FixedProvider(MOHALI),
            &ScriptedGeocoder(Ok(Some("Phase 7, Mohali".into()))),
        )
        .await
        .unwrap();
        assert_eq!(resolved.address, "Phase 7, Mohali");
        assert_eq!(resolved.latitude, MOHALI.latitude);
    }

    #[tokio::test]
    async fn falls_back_to_formatted_coordinates() {
        for geocoder in [
            ScriptedGeocoder(Ok(None)),
            ScriptedGeocoder(Err(GeoError::Timeout)),
        ] {
            let resolved = resolve_location(&FixedProvider(MOHALI), &geocoder)
                .await
                .unwrap();
            assert_eq!(resolved.address, "30.70465, 76.71787");
        }
    }

    #[tokio::test]
    async fn no_fix_is_a_hard_error() {
        let result = resolve_location(&NoFix, &ScriptedGeocoder(Ok(None))).await;
        assert!(matches!(result, Err(GeoError::Unavailable(_))));
    }
}
