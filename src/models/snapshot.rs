//! Aggregated payload returned to callers plus diagnostics types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Location, NewsBundle, WeatherSnapshot};

/// Combined location, weather and news at one point in time
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub location: Location,
    pub weather: WeatherSnapshot,
    pub news: NewsBundle,
    pub timestamp: DateTime<Utc>,
    /// True until news has loaded in the current cache generation
    pub is_partial: bool,
    pub from_cache: bool,
    /// True only when location, weather and news are all fallback values
    pub is_default: bool,
}

impl ContextSnapshot {
    #[must_use]
    pub fn assemble(
        location: Location,
        weather: WeatherSnapshot,
        news: NewsBundle,
        is_partial: bool,
        from_cache: bool,
    ) -> Self {
        let is_default = location.is_default && weather.is_default() && news.is_default();
        Self {
            location,
            weather,
            news,
            timestamp: Utc::now(),
            is_partial,
            from_cache,
            is_default,
        }
    }
}

/// Cache introspection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    pub has_cache: bool,
    pub is_valid: bool,
    pub age_seconds: i64,
    pub age_minutes: i64,
    pub has_location: bool,
    pub has_weather: bool,
    pub has_news: bool,
    pub epoch: u64,
}

/// Result of one connectivity probe per provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub location: bool,
    pub weather: bool,
    pub news: bool,
    pub checked_at: DateTime<Utc>,
}

impl ServiceHealth {
    #[must_use]
    pub fn active_count(&self) -> usize {
        [self.location, self.weather, self.news]
            .iter()
            .filter(|up| **up)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrentWeather, Forecast};

    fn default_weather() -> WeatherSnapshot {
        WeatherSnapshot::fallback(
            CurrentWeather::simulated(),
            Forecast::simulated(Utc::now().date_naive()),
        )
    }

    #[test]
    fn test_all_defaults_is_default() {
        let snapshot = ContextSnapshot::assemble(
            Location::default_fix(),
            default_weather(),
            NewsBundle::fallback(),
            true,
            false,
        );
        assert!(snapshot.is_default);
    }

    #[test]
    fn test_one_real_source_is_not_default() {
        let snapshot = ContextSnapshot::assemble(
            Location::from_fix(51.5, -0.12, 10.0),
            default_weather(),
            NewsBundle::fallback(),
            true,
            false,
        );
        assert!(!snapshot.is_default);
    }

    #[test]
    fn test_active_count() {
        let health = ServiceHealth {
            location: true,
            weather: false,
            news: true,
            checked_at: Utc::now(),
        };
        assert_eq!(health.active_count(), 2);
    }
}
