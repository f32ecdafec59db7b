//! Contracts for the three data sources the coordinator aggregates.
//!
//! Providers never retry. A failed call returns an error and the coordinator
//! substitutes the provider's default value.

use async_trait::async_trait;
use chrono::Utc;

use crate::Result;
use crate::models::{Address, Article, CurrentWeather, Forecast, Location, NewsBundle};

pub mod location;
pub mod news_api;
pub mod open_meteo;

pub use location::ConfiguredLocationProvider;
pub use news_api::NewsApiProvider;
pub use open_meteo::OpenMeteoProvider;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current coordinate fix. The address may still be a placeholder.
    async fn fetch(&self) -> Result<Location>;

    async fn resolve_address(&self, latitude: f64, longitude: f64) -> Result<Address>;

    fn default_location(&self) -> Location {
        Location::default_fix()
    }

    fn default_address(&self, latitude: f64, longitude: f64) -> Address {
        Address::fallback_for(latitude, longitude)
    }

    /// Lightweight connectivity check
    async fn probe(&self) -> bool {
        self.fetch().await.is_ok()
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather>;

    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast>;

    fn default_current(&self) -> CurrentWeather {
        CurrentWeather::simulated()
    }

    fn default_forecast(&self) -> Forecast {
        Forecast::simulated(Utc::now().date_naive())
    }

    async fn probe(&self) -> bool {
        let location = Location::default_fix();
        self.fetch_current(location.latitude, location.longitude)
            .await
            .is_ok()
    }
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_top(&self, filters: &NewsFilters) -> Result<Vec<Article>>;

    async fn fetch_local(&self, location: &Location, filters: &NewsFilters)
    -> Result<Vec<Article>>;

    async fn fetch_topic(&self, topic: &str, filters: &NewsFilters) -> Result<Vec<Article>>;

    fn default_bundle(&self) -> NewsBundle {
        NewsBundle::fallback()
    }

    async fn probe(&self) -> bool {
        self.fetch_top(&NewsFilters::with_page_size(1)).await.is_ok()
    }
}

/// Query options shared by the news endpoints. Unset fields use the
/// provider's own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsFilters {
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: Option<u32>,
    /// publishedAt, popularity or relevancy
    pub sort_by: Option<String>,
    pub days_back: Option<u32>,
    /// Comma separated domain list
    pub domains: Option<String>,
}

impl NewsFilters {
    #[must_use]
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }
}
