//! Data models for the contextual learning payload
//!
//! - Location: coordinate fix and its address
//! - Weather: current conditions, forecast and learning content
//! - News: articles and the categorized bundle
//! - Snapshot: the aggregated payload and diagnostics

pub mod forecast;
pub mod location;
pub mod news;
pub mod snapshot;
pub mod weather;

pub use forecast::{DailyForecast, Forecast};
pub use location::{Address, Location};
pub use news::{
    Article, KeyPhrase, NewsBundle, NewsLearningContent, NewsStats, VocabularyTerm,
};
pub use snapshot::{CacheStatus, ContextSnapshot, ServiceHealth};
pub use weather::{CurrentWeather, WeatherSnapshot, sun_times};
