use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::models::{
    Address, CacheStatus, ContextSnapshot, CurrentWeather, Forecast, Location, NewsBundle,
    WeatherSnapshot,
};

/// Source of "now" for TTL checks
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// When each field was last written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFreshness {
    pub location: Option<DateTime<Utc>>,
    pub weather: Option<DateTime<Utc>>,
    pub news: Option<DateTime<Utc>>,
    pub address: Option<DateTime<Utc>>,
    pub forecast: Option<DateTime<Utc>>,
}

/// Immutable view of the cache at one instant
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub location: Option<Location>,
    pub weather: Option<WeatherSnapshot>,
    pub news: Option<NewsBundle>,
    pub captured_at: Option<DateTime<Utc>>,
    pub freshness: FieldFreshness,
    /// Set once news has been written in this generation
    pub news_loaded: bool,
    pub epoch: u64,
}

/// One atomic change to the cache
#[derive(Debug, Clone)]
pub enum CacheUpdate {
    Foreground {
        location: Location,
        weather: WeatherSnapshot,
    },
    Full {
        location: Location,
        weather: WeatherSnapshot,
        news: NewsBundle,
    },
    News(NewsBundle),
    /// Patches the cached location's address, no-op without a location.
    /// Refused when the cached fix has moved away from these coordinates.
    Address {
        address: Address,
        latitude: f64,
        longitude: f64,
    },
    /// Patches the cached weather's forecast, no-op without weather
    Forecast(Forecast),
}

impl CacheUpdate {
    fn name(&self) -> &'static str {
        match self {
            Self::Foreground { .. } => "foreground",
            Self::Full { .. } => "full",
            Self::News(_) => "news",
            Self::Address { .. } => "address",
            Self::Forecast(_) => "forecast",
        }
    }
}

/// In-memory holder of the latest snapshot.
///
/// Readers clone an `Arc` to the current entry. Writers build a new entry
/// under the write lock and swap it in whole.
pub struct CacheStore {
    entry: RwLock<Arc<CacheEntry>>,
    general_ttl: TimeDelta,
    location_ttl: TimeDelta,
    clock: Clock,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entry", &self.entry.read())
            .field("general_ttl", &self.general_ttl)
            .field("location_ttl", &self.location_ttl)
            .finish_non_exhaustive()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl CacheStore {
    #[must_use]
    pub fn new(general_ttl: Duration, location_ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(Arc::new(CacheEntry::default())),
            general_ttl: TimeDelta::from_std(general_ttl).unwrap_or(TimeDelta::MAX),
            location_ttl: TimeDelta::from_std(location_ttl).unwrap_or(TimeDelta::MAX),
            clock: Arc::new(Utc::now),
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.general_ttl(), config.location_ttl())
    }

    /// Replace the time source
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current entry; stays consistent even if a writer swaps it afterwards
    #[must_use]
    pub fn entry(&self) -> Arc<CacheEntry> {
        Arc::clone(&self.entry.read())
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.entry.read().epoch
    }

    fn age(&self, entry: &CacheEntry) -> Option<TimeDelta> {
        entry.captured_at.map(|at| (self.clock)() - at)
    }

    fn is_fresh(&self, entry: &CacheEntry, ttl: TimeDelta) -> bool {
        self.age(entry).is_some_and(|age| age < ttl)
    }

    fn is_entry_valid(&self, entry: &CacheEntry) -> bool {
        entry.location.is_some()
            && entry.weather.is_some()
            && self.is_fresh(entry, self.general_ttl)
    }

    /// Location and weather present and younger than the general TTL
    #[must_use]
    pub fn is_overall_valid(&self) -> bool {
        self.is_entry_valid(&self.entry())
    }

    #[must_use]
    pub fn is_location_valid(&self) -> bool {
        let entry = self.entry();
        entry.location.is_some() && self.is_fresh(&entry, self.location_ttl)
    }

    #[must_use]
    pub fn is_weather_valid(&self) -> bool {
        let entry = self.entry();
        entry.weather.is_some() && self.is_fresh(&entry, self.general_ttl)
    }

    /// Cached contents as a snapshot. Missing fields are filled with fallbacks.
    #[must_use]
    pub fn get(&self) -> ContextSnapshot {
        Self::snapshot_of(&self.entry())
    }

    /// Snapshot of the current entry if it is overall valid, checked and read
    /// from the same entry
    #[must_use]
    pub fn get_if_valid(&self) -> Option<ContextSnapshot> {
        let entry = self.entry();
        self.is_entry_valid(&entry).then(|| Self::snapshot_of(&entry))
    }

    fn snapshot_of(entry: &CacheEntry) -> ContextSnapshot {
        let location = entry.location.clone().unwrap_or_else(Location::default_fix);
        let weather = entry.weather.clone().unwrap_or_else(|| {
            WeatherSnapshot::fallback(
                CurrentWeather::simulated(),
                Forecast::simulated(Utc::now().date_naive()),
            )
        });
        let news = entry.news.clone().unwrap_or_else(NewsBundle::fallback);

        ContextSnapshot::assemble(location, weather, news, !entry.news_loaded, true)
    }

    /// Apply `update` if `epoch` still matches the store.
    ///
    /// Returns `false` when the write was discarded: the cache was cleared
    /// after the writer captured its epoch, or an address no longer matches
    /// the cached fix.
    #[tracing::instrument(level = "debug", skip(self, update), fields(update = update.name()))]
    pub fn apply(&self, update: CacheUpdate, epoch: u64) -> bool {
        let mut guard = self.entry.write();
        if guard.epoch != epoch {
            tracing::debug!(current = guard.epoch, "Discarding stale cache write");
            return false;
        }

        let now = (self.clock)();
        let mut next = CacheEntry::clone(&guard);

        match update {
            CacheUpdate::Foreground { location, weather } => {
                next.location = Some(location);
                next.weather = Some(weather);
                next.freshness.location = Some(now);
                next.freshness.weather = Some(now);
                next.captured_at = Some(now);
            }
            CacheUpdate::Full {
                location,
                weather,
                news,
            } => {
                next.location = Some(location);
                next.weather = Some(weather);
                next.news = Some(news);
                next.freshness.location = Some(now);
                next.freshness.weather = Some(now);
                next.freshness.news = Some(now);
                next.news_loaded = true;
                next.captured_at = Some(now);
            }
            CacheUpdate::News(news) => {
                next.news = Some(news);
                next.freshness.news = Some(now);
                next.news_loaded = true;
                next.captured_at = Some(now);
            }
            CacheUpdate::Address {
                address,
                latitude,
                longitude,
            } => {
                let Some(location) = next.location.as_mut() else {
                    tracing::debug!("No cached location to patch");
                    return true;
                };
                if !location.is_same_fix(latitude, longitude) {
                    tracing::debug!("Cached fix moved, dropping resolved address");
                    return false;
                }
                location.address = address;
                next.freshness.address = Some(now);
            }
            CacheUpdate::Forecast(forecast) => {
                let Some(weather) = next.weather.as_mut() else {
                    tracing::debug!("No cached weather to patch");
                    return true;
                };
                weather.forecast = Some(forecast);
                next.freshness.forecast = Some(now);
            }
        }

        *guard = Arc::new(next);
        true
    }

    /// Drop everything and start a new generation
    pub fn clear(&self) {
        let mut guard = self.entry.write();
        let epoch = guard.epoch + 1;
        *guard = Arc::new(CacheEntry {
            epoch,
            ..CacheEntry::default()
        });
        tracing::info!(epoch, "Cache cleared");
    }

    #[must_use]
    pub fn status(&self) -> CacheStatus {
        let entry = self.entry();
        let age = self.age(&entry).unwrap_or(TimeDelta::zero());

        CacheStatus {
            has_cache: entry.captured_at.is_some(),
            is_valid: self.is_entry_valid(&entry),
            age_seconds: age.num_seconds(),
            age_minutes: age.num_minutes(),
            has_location: entry.location.is_some(),
            has_weather: entry.weather.is_some(),
            has_news: entry.news.is_some(),
            epoch: entry.epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rstest::rstest;

    struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Utc::now())))
        }

        fn clock(&self) -> Clock {
            let now = Arc::clone(&self.0);
            Arc::new(move || *now.lock())
        }

        fn advance(&self, by: TimeDelta) {
            *self.0.lock() += by;
        }
    }

    fn store(clock: &ManualClock) -> CacheStore {
        CacheStore::default().with_clock(clock.clock())
    }

    fn weather() -> WeatherSnapshot {
        let mut current = CurrentWeather::simulated();
        current.is_simulated = false;
        WeatherSnapshot::from_current(current)
    }

    fn foreground() -> CacheUpdate {
        CacheUpdate::Foreground {
            location: Location::from_fix(51.5, -0.12, 10.0),
            weather: weather(),
        }
    }

    #[test]
    fn test_empty_store() {
        let store = CacheStore::default();
        assert!(!store.is_overall_valid());
        assert!(!store.is_location_valid());
        assert!(!store.is_weather_valid());

        let status = store.status();
        assert!(!status.has_cache);
        assert_eq!(status.age_seconds, 0);

        let snapshot = store.get();
        assert!(snapshot.from_cache);
        assert!(snapshot.is_default);
    }

    #[rstest]
    #[case(0, true, true)]
    #[case(299, true, true)]
    #[case(300, false, true)]
    #[case(599, false, true)]
    #[case(600, false, false)]
    fn test_ttl_boundaries(
        #[case] age_secs: i64,
        #[case] general_valid: bool,
        #[case] location_valid: bool,
    ) {
        let clock = ManualClock::new();
        let store = store(&clock);
        assert!(store.apply(foreground(), store.epoch()));

        clock.advance(TimeDelta::seconds(age_secs));
        assert_eq!(store.is_overall_valid(), general_valid);
        assert_eq!(store.is_weather_valid(), general_valid);
        assert_eq!(store.is_location_valid(), location_valid);
    }

    #[test]
    fn test_news_update_marks_loaded() {
        let store = CacheStore::default();
        assert!(store.apply(foreground(), 0));
        assert!(store.get().is_partial);

        assert!(store.apply(CacheUpdate::News(NewsBundle::fallback()), 0));
        let entry = store.entry();
        assert!(entry.news_loaded);
        assert!(entry.freshness.news.is_some());
        assert!(!store.get().is_partial);
    }

    #[test]
    fn test_patches_do_not_stamp_captured_at() {
        let clock = ManualClock::new();
        let store = store(&clock);
        store.apply(foreground(), 0);
        let captured_at = store.entry().captured_at;

        clock.advance(TimeDelta::seconds(30));
        let address = Address::new("London", "England", "UK", "London, England, UK");
        assert!(store.apply(
            CacheUpdate::Address {
                address,
                latitude: 51.5,
                longitude: -0.12,
            },
            0
        ));
        assert!(store.apply(CacheUpdate::Forecast(Forecast::simulated(Utc::now().date_naive())), 0));

        let entry = store.entry();
        assert_eq!(entry.captured_at, captured_at);
        assert!(entry.freshness.address > captured_at);
        assert_eq!(entry.location.as_ref().map(|l| l.address.city.as_str()), Some("London"));
        assert!(entry.weather.as_ref().is_some_and(|w| w.forecast.is_some()));
    }

    #[test]
    fn test_patch_without_field_is_noop() {
        let store = CacheStore::default();
        let update = CacheUpdate::Address {
            address: Address::fallback_for(0.0, 0.0),
            latitude: 0.0,
            longitude: 0.0,
        };
        assert!(store.apply(update, 0));
        assert!(store.entry().location.is_none());
        assert!(!store.status().has_cache);
    }

    #[test]
    fn test_stale_epoch_write_is_discarded() {
        let store = CacheStore::default();
        let epoch = store.epoch();
        store.clear();

        assert!(!store.apply(foreground(), epoch));
        assert!(store.entry().location.is_none());
        assert!(store.apply(foreground(), store.epoch()));
    }

    #[test]
    fn test_clear_resets_and_bumps_epoch() {
        let store = CacheStore::default();
        store.apply(foreground(), 0);
        store.apply(CacheUpdate::News(NewsBundle::fallback()), 0);
        assert!(store.status().is_valid);

        store.clear();
        let status = store.status();
        assert!(!status.has_cache);
        assert!(!status.has_news);
        assert_eq!(status.epoch, 1);
        assert!(!store.entry().news_loaded);
    }

    #[test]
    fn test_readers_keep_consistent_entry() {
        let store = CacheStore::default();
        store.apply(foreground(), 0);
        let before = store.entry();

        store.apply(CacheUpdate::News(NewsBundle::fallback()), 0);
        assert!(before.news.is_none());
        assert!(store.entry().news.is_some());
    }

    #[test]
    fn test_status_age() {
        let clock = ManualClock::new();
        let store = store(&clock);
        store.apply(foreground(), 0);
        clock.advance(TimeDelta::seconds(150));

        let status = store.status();
        assert_eq!(status.age_seconds, 150);
        assert_eq!(status.age_minutes, 2);
        assert!(status.is_valid);
    }

    #[test]
    fn test_address_for_replaced_fix_is_refused() {
        let store = CacheStore::default();
        store.apply(foreground(), 0);
        let moved = CacheUpdate::Foreground {
            location: Location::from_fix(48.8566, 2.3522, 10.0),
            weather: weather(),
        };
        assert!(store.apply(moved, 0));

        let address = Address::new("London", "England", "UK", "London, England, UK");
        let update = CacheUpdate::Address {
            address,
            latitude: 51.5,
            longitude: -0.12,
        };
        assert!(!store.apply(update, 0));

        let entry = store.entry();
        assert!(entry.location.as_ref().is_some_and(|l| l.address.is_placeholder()));
        assert!(entry.freshness.address.is_none());
    }

    #[test]
    fn test_get_if_valid() {
        let clock = ManualClock::new();
        let store = store(&clock);
        assert!(store.get_if_valid().is_none());

        store.apply(foreground(), 0);
        let snapshot = store.get_if_valid().unwrap();
        assert!(snapshot.from_cache);
        assert_eq!(snapshot.location.latitude, 51.5);

        clock.advance(TimeDelta::seconds(300));
        assert!(store.get_if_valid().is_none());

        clock.advance(TimeDelta::seconds(-300));
        store.clear();
        assert!(store.get_if_valid().is_none());
    }
}
