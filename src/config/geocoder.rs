use std::env;

#[derive(Clone, Debug)]
pub struct GeocoderConfig {
    /// Base URL of the geocoding provider.
    pub base_url: String,
    pub api_key: String,
}

impl GeocoderConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| "https://www.mapquestapi.com/geocoding/v1".to_string()),
            api_key: env::var("GEOCODER_API_KEY").unwrap_or_else(|_| "".to_string()),
        }
    }
}
