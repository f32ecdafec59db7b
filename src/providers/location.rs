//! Location from a configured coordinate fix, with Nominatim reverse geocoding

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::LocationProvider;
use crate::config::LocationConfig;
use crate::models::{Address, Location};
use crate::{ContextError, Result};

const PROVIDER: &str = "location";
const USER_AGENT: &str = concat!("learncontext/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    suburb: Option<String>,
    city_district: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl NominatimResponse {
    fn into_address(self) -> Option<Address> {
        let address = self.address?;

        // Prefer the most specific named place
        let city = address
            .city_district
            .or(address.suburb)
            .or(address.city)
            .or(address.town)
            .or(address.village)
            .or(address.municipality)?;
        let region = address
            .state_district
            .or(address.county)
            .or(address.state)
            .unwrap_or_default();
        let country = address.country.unwrap_or_default();

        let full = self.display_name.unwrap_or_else(|| {
            [city.as_str(), region.as_str(), country.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        });

        Some(Address::new(&city, &region, &country, &full))
    }
}

/// Returns the fix from configuration. Without one every fetch fails and the
/// coordinator falls back to the default location.
#[derive(Debug, Clone)]
pub struct ConfiguredLocationProvider {
    client: Client,
    fix: Option<(f64, f64)>,
    accuracy: f64,
    geocoder_base_url: String,
}

impl ConfiguredLocationProvider {
    pub fn new(config: &LocationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            fix: config.fix(),
            accuracy: config.accuracy_m,
            geocoder_base_url: config.geocoder_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocationProvider {
    async fn fetch(&self) -> Result<Location> {
        let (latitude, longitude) = self
            .fix
            .ok_or_else(|| ContextError::provider(PROVIDER, "no coordinate fix configured"))?;
        Ok(Location::from_fix(latitude, longitude, self.accuracy))
    }

    #[instrument(skip(self))]
    async fn resolve_address(&self, latitude: f64, longitude: f64) -> Result<Address> {
        let url = format!(
            "{}/reverse?lat={latitude}&lon={longitude}&format=json&addressdetails=1&zoom=14",
            self.geocoder_base_url
        );
        debug!("Reverse geocode request URL: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ContextError::provider(
                PROVIDER,
                format!("reverse geocoding returned status {}", response.status()),
            ));
        }

        let body: NominatimResponse = response.json().await?;
        let address = body
            .into_address()
            .ok_or_else(|| ContextError::provider(PROVIDER, "no address for coordinates"))?;

        info!("Reverse geocoded to: {}", address.full);
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fix: Option<(f64, f64)>) -> LocationConfig {
        LocationConfig {
            latitude: fix.map(|f| f.0),
            longitude: fix.map(|f| f.1),
            ..LocationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_configured_fix() {
        let provider = ConfiguredLocationProvider::new(&config(Some((51.5, -0.12)))).unwrap();
        let location = provider.fetch().await.unwrap();
        assert_eq!(location.latitude, 51.5);
        assert!(location.needs_address());
        assert!(!location.is_default);
    }

    #[tokio::test]
    async fn test_fetch_without_fix_fails() {
        let provider = ConfiguredLocationProvider::new(&config(None)).unwrap();
        let err = provider.fetch().await.unwrap_err();
        assert!(matches!(err, ContextError::Provider { provider: "location", .. }));
        assert!(!provider.probe().await);
    }

    #[test]
    fn test_nominatim_address_prefers_district() {
        let body: NominatimResponse = serde_json::from_value(serde_json::json!({
            "display_name": "Wong Tai Sin, Kowloon, Hong Kong",
            "address": {
                "city_district": "Wong Tai Sin",
                "city": "Hong Kong",
                "state": "Kowloon",
                "country": "Hong Kong"
            }
        }))
        .unwrap();

        let address = body.into_address().unwrap();
        assert_eq!(address.city, "Wong Tai Sin");
        assert_eq!(address.region, "Kowloon");
        assert!(address.resolved);
    }

    #[test]
    fn test_nominatim_without_place_is_none() {
        let body: NominatimResponse =
            serde_json::from_value(serde_json::json!({ "address": { "country": "Nowhere" } }))
                .unwrap();
        assert!(body.into_address().is_none());
    }
}
