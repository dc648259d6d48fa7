use serde_json::Value;
use tracing::instrument;

use crate::config::geocoder::GeocoderConfig;
use crate::utils::errors::AppError;

/// Postal-code-to-coordinate lookup against the configured geocoding
/// provider. Treated as an opaque collaborator; its failures surface
/// through [`AppError`].
pub struct Geocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
}

impl Geocoder {
    pub fn new(config: GeocoderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Resolves a location (street address or zipcode) to
    /// `(latitude, longitude)`.
    #[instrument(skip(self))]
    pub async fn geocode(&self, location: &str) -> Result<(f64, f64), AppError> {
        let url = format!("{}/address", self.config.base_url);

        let body: Value = self
            .client
            .get(&url)
            .query(&[("key", self.config.api_key.as_str()), ("location", location)])
            .send()
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("Geocoding request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::internal(anyhow::anyhow!("Geocoding request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("Invalid geocoding response: {e}")))?;

        let lat_lng = body
            .pointer("/results/0/locations/0/latLng")
            .and_then(|v| Some((v.get("lat")?.as_f64()?, v.get("lng")?.as_f64()?)));

        lat_lng.ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("Unable to geocode location {location}"))
        })
    }
}
