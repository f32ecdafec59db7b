//! `learncontext` - Contextual data for English learning
//!
//! Aggregates the device location, current weather and news headlines into
//! one snapshot, served cache-first with progressive background refresh.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod learning;
pub mod logging;
pub mod models;
pub mod news_analysis;
pub mod providers;
pub mod recommendations;

// Re-export core types for public API
pub use cache::{CacheStore, CacheUpdate};
pub use config::ContextConfig;
pub use coordinator::{AggregationCoordinator, CoordinatorSettings, UpdateCallbacks};
pub use error::ContextError;
pub use learning::LearningStats;
pub use models::{
    Address, Article, CacheStatus, ContextSnapshot, Forecast, Location, NewsBundle,
    ServiceHealth, WeatherSnapshot,
};
pub use providers::{LocationProvider, NewsFilters, NewsProvider, WeatherProvider};
pub use recommendations::{Recommendation, RecommendationKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ContextError>;
