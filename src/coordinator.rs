//! Cache-first aggregation of location, weather and news.
//!
//! [`AggregationCoordinator::get_fast`] answers from the cache when it is
//! fresh and refreshes in the background. Otherwise it fetches location and
//! weather, returns a partial snapshot, and completes news, address and
//! forecast in background tasks that report through [`UpdateCallbacks`].
//!
//! Background tasks of a cycle start only after `get_fast` has produced its
//! result. On a current-thread runtime their callbacks therefore run after
//! the caller's next suspension point. A multi-thread runtime can run them
//! in parallel with the caller's code that follows the `.await`.

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::cache::{CacheStore, CacheUpdate};
use crate::config::ContextConfig;
use crate::learning::LearningStats;
use crate::models::{
    CacheStatus, ContextSnapshot, Location, NewsBundle, ServiceHealth, WeatherSnapshot,
};
use crate::providers::{
    ConfiguredLocationProvider, LocationProvider, NewsApiProvider, NewsFilters, NewsProvider,
    OpenMeteoProvider, WeatherProvider,
};
use crate::recommendations::{self, Recommendation};
use crate::{ContextError, Result};

const TECH_DOMAINS: &str = "techcrunch.com,arstechnica.com,theverge.com,wired.com,engadget.com";
const TECH_DAYS_BACK: u32 = 7;
const TECH_PAGE_SIZE: u32 = 10;

pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// One optional hook per kind of background completion
#[derive(Clone, Default)]
pub struct UpdateCallbacks {
    /// Fired once per refresh cycle with a snapshot whose news has loaded
    pub on_data_updated: Option<Callback<ContextSnapshot>>,
    pub on_location_updated: Option<Callback<Location>>,
    pub on_weather_updated: Option<Callback<WeatherSnapshot>>,
    pub on_news_updated: Option<Callback<NewsBundle>>,
}

impl UpdateCallbacks {
    #[must_use]
    pub fn with_data_updated(mut self, f: impl Fn(ContextSnapshot) + Send + Sync + 'static) -> Self {
        self.on_data_updated = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_location_updated(mut self, f: impl Fn(Location) + Send + Sync + 'static) -> Self {
        self.on_location_updated = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_weather_updated(
        mut self,
        f: impl Fn(WeatherSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.on_weather_updated = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_news_updated(mut self, f: impl Fn(NewsBundle) + Send + Sync + 'static) -> Self {
        self.on_news_updated = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for UpdateCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateCallbacks")
            .field("on_data_updated", &self.on_data_updated.is_some())
            .field("on_location_updated", &self.on_location_updated.is_some())
            .field("on_weather_updated", &self.on_weather_updated.is_some())
            .field("on_news_updated", &self.on_news_updated.is_some())
            .finish()
    }
}

/// Timeouts and news query sizes used by the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub location_timeout: Duration,
    pub weather_timeout: Duration,
    pub news_timeout: Duration,
    pub top_page_size: u32,
    pub local_page_size: u32,
    /// Tech articles kept after expansion
    pub tech_limit: usize,
    pub tech_topic: String,
    pub country: Option<String>,
    pub category: Option<String>,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

impl CoordinatorSettings {
    #[must_use]
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            location_timeout: Duration::from_secs(config.location.timeout_seconds.into()),
            weather_timeout: Duration::from_secs(config.weather.timeout_seconds.into()),
            news_timeout: Duration::from_secs(config.news.timeout_seconds.into()),
            top_page_size: config.news.top_page_size,
            local_page_size: config.news.local_page_size,
            tech_limit: config.news.tech_limit as usize,
            tech_topic: config.news.tech_topic.clone(),
            country: Some(config.news.country.clone()),
            category: Some(config.news.category.clone()),
        }
    }
}

/// Location and weather settled for one foreground cycle
struct Foreground {
    location: Location,
    weather: WeatherSnapshot,
    location_fetched: bool,
    weather_fetched: bool,
}

struct Inner {
    location: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherProvider>,
    news: Arc<dyn NewsProvider>,
    cache: Arc<CacheStore>,
    settings: CoordinatorSettings,
    callbacks: RwLock<UpdateCallbacks>,
    tracker: TaskTracker,
    /// Replaced on every clear so tasks from older generations stop early
    background: Mutex<CancellationToken>,
}

/// The only component that talks to providers.
///
/// Cloning is cheap; clones share the cache, callbacks and background tasks.
#[derive(Clone)]
pub struct AggregationCoordinator {
    inner: Arc<Inner>,
}

impl fmt::Debug for AggregationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationCoordinator")
            .field("cache", &self.inner.cache)
            .field("settings", &self.inner.settings)
            .field("callbacks", &*self.inner.callbacks.read())
            .field("background_tasks", &self.inner.tracker.len())
            .finish()
    }
}

impl AggregationCoordinator {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        weather: Arc<dyn WeatherProvider>,
        news: Arc<dyn NewsProvider>,
        cache: Arc<CacheStore>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                location,
                weather,
                news,
                cache,
                settings,
                callbacks: RwLock::new(UpdateCallbacks::default()),
                tracker: TaskTracker::new(),
                background: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// Coordinator wired to the HTTP providers described by `config`
    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(ConfiguredLocationProvider::new(&config.location)?),
            Arc::new(OpenMeteoProvider::new(&config.weather)?),
            Arc::new(NewsApiProvider::new(&config.news)?),
            Arc::new(CacheStore::from_config(&config.cache)),
            CoordinatorSettings::from_config(config),
        ))
    }

    /// Return usable data as quickly as possible.
    ///
    /// Fails only with [`ContextError::Cancelled`] when `cancel` fires before
    /// location and weather have settled. Nothing is written in that case.
    #[instrument(skip_all)]
    pub async fn get_fast(&self, cancel: &CancellationToken) -> Result<ContextSnapshot> {
        if cancel.is_cancelled() {
            return Err(ContextError::Cancelled);
        }

        let inner = &self.inner;
        // Background tasks start only once this call has returned
        let release = CancellationToken::new();
        let _release_on_return = release.clone().drop_guard();

        if let Some(snapshot) = inner.cache.get_if_valid() {
            info!("Using cached data");
            inner.spawn_full_refresh(release);
            return Ok(snapshot);
        }

        let start = Instant::now();
        let epoch = inner.cache.epoch();

        let foreground = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Foreground fetch cancelled");
                return Err(ContextError::Cancelled);
            }
            foreground = inner.fetch_foreground() => foreground,
        };

        info!(
            "Basic data ready in {:.3}s",
            start.elapsed().as_secs_f64()
        );

        let Foreground {
            location,
            weather,
            location_fetched,
            weather_fetched,
        } = foreground;

        inner.write(
            CacheUpdate::Foreground {
                location: location.clone(),
                weather: weather.clone(),
            },
            epoch,
        );

        let entry = inner.cache.entry();
        let news = entry
            .news
            .clone()
            .unwrap_or_else(|| inner.news.default_bundle());
        let snapshot = ContextSnapshot::assemble(
            location.clone(),
            weather.clone(),
            news,
            !entry.news_loaded,
            false,
        );

        inner.spawn_news_fetch(epoch, release.clone());
        if location_fetched && location.needs_address() {
            inner.spawn_address_resolve(epoch, &location, Some(release.clone()));
        }
        if weather_fetched && weather.needs_forecast() {
            inner.spawn_forecast_fetch(epoch, &location, Some(release));
        }

        Ok(snapshot)
    }

    /// Replace every registered hook
    pub fn set_update_callbacks(&self, callbacks: UpdateCallbacks) {
        *self.inner.callbacks.write() = callbacks;
    }

    /// Empty the cache. Background work from before the clear stops early
    /// and anything it still tries to write is discarded.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        let previous = std::mem::take(&mut *self.inner.background.lock());
        previous.cancel();
    }

    /// Probe each provider concurrently without touching the cache
    #[instrument(skip_all)]
    pub async fn check_health(&self, cancel: &CancellationToken) -> Result<ServiceHealth> {
        let inner = &self.inner;
        let settings = &inner.settings;

        let probes = async {
            tokio::join!(
                probe(settings.location_timeout, inner.location.probe()),
                probe(settings.weather_timeout, inner.weather.probe()),
                probe(settings.news_timeout, inner.news.probe()),
            )
        };

        let (location, weather, news) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ContextError::Cancelled),
            results = probes => results,
        };

        let health = ServiceHealth {
            location,
            weather,
            news,
            checked_at: chrono::Utc::now(),
        };
        info!(?health, "Service health check");
        Ok(health)
    }

    #[must_use]
    pub fn status(&self) -> CacheStatus {
        self.inner.cache.status()
    }

    /// Current cache contents without triggering any fetch
    #[must_use]
    pub fn cached(&self) -> ContextSnapshot {
        self.inner.cache.get()
    }

    /// Suggestions for whatever is currently cached
    #[must_use]
    pub fn recommendations(&self) -> Vec<Recommendation> {
        recommendations::generate(&self.inner.cache.get())
    }

    /// Vocabulary totals for the cached snapshot plus a fresh health check
    pub async fn learning_stats(&self, cancel: &CancellationToken) -> Result<LearningStats> {
        let health = self.check_health(cancel).await?;
        let stats = LearningStats::from_snapshot(&self.cached(), &health);
        info!(
            vocabulary = stats.total_vocabulary,
            services = stats.services_active,
            "Learning statistics"
        );
        Ok(stats)
    }

    /// Warm the cache at startup. Returns `None` instead of an error.
    pub async fn preload(&self, cancel: &CancellationToken) -> Option<ContextSnapshot> {
        info!("Preloading data");
        match self.get_fast(cancel).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Preloading failed: {e}");
                None
            }
        }
    }

    /// Wait until every background task spawned so far has finished
    pub async fn wait_for_background(&self) {
        let tracker = &self.inner.tracker;
        tracker.close();
        tracker.wait().await;
        tracker.reopen();
    }

    /// Cancel background work and wait for it to stop
    pub async fn shutdown(&self) {
        self.inner.background.lock().cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        info!("Coordinator shut down");
    }
}

async fn probe(limit: Duration, check: impl Future<Output = bool>) -> bool {
    tokio::time::timeout(limit, check).await.unwrap_or(false)
}

impl Inner {
    /// Run one provider call under `limit`. Failures are logged and become `None`.
    async fn bounded<T>(
        &self,
        provider: &str,
        limit: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("{provider} fetch failed, using default: {e}");
                None
            }
            Err(_) => {
                warn!("{provider} fetch timed out after {}s, using default", limit.as_secs_f64());
                None
            }
        }
    }

    async fn fetch_location(&self) -> Location {
        self.bounded("location", self.settings.location_timeout, self.location.fetch())
            .await
            .unwrap_or_else(|| self.location.default_location())
    }

    async fn fetch_weather(&self, location: &Location) -> WeatherSnapshot {
        let current = self
            .bounded(
                "weather",
                self.settings.weather_timeout,
                self.weather
                    .fetch_current(location.latitude, location.longitude),
            )
            .await;

        match current {
            Some(current) => WeatherSnapshot::from_current(current),
            None => WeatherSnapshot::fallback(
                self.weather.default_current(),
                self.weather.default_forecast(),
            ),
        }
    }

    async fn fetch_top_news(&self) -> NewsBundle {
        let filters = NewsFilters {
            country: self.settings.country.clone(),
            category: self.settings.category.clone(),
            page_size: Some(self.settings.top_page_size),
            ..NewsFilters::default()
        };

        match self
            .bounded("news", self.settings.news_timeout, self.news.fetch_top(&filters))
            .await
        {
            Some(articles) => NewsBundle::with_top(articles, true),
            None => self.news.default_bundle(),
        }
    }

    /// Location and weather concurrently, reusing cached values that are
    /// still valid. Weather waits on the same location future for coordinates.
    async fn fetch_foreground(&self) -> Foreground {
        let entry = self.cache.entry();
        let cached_location = self
            .cache
            .is_location_valid()
            .then(|| entry.location.clone())
            .flatten();
        let cached_weather = self
            .cache
            .is_weather_valid()
            .then(|| entry.weather.clone())
            .flatten();

        let location = async move {
            match cached_location {
                Some(location) => {
                    debug!("Using cached location");
                    (location, false)
                }
                None => (self.fetch_location().await, true),
            }
        }
        .shared();

        let weather = {
            let location = location.clone();
            async move {
                match cached_weather {
                    Some(weather) => {
                        debug!("Using cached weather");
                        (weather, false)
                    }
                    None => {
                        let (location, _) = location.await;
                        (self.fetch_weather(&location).await, true)
                    }
                }
            }
        };

        let ((location, location_fetched), (weather, weather_fetched)) =
            tokio::join!(location, weather);

        Foreground {
            location,
            weather,
            location_fetched,
            weather_fetched,
        }
    }

    fn write(&self, update: CacheUpdate, epoch: u64) -> bool {
        let applied = self.cache.apply(update, epoch);
        if !applied {
            debug!(epoch, "Background result discarded");
        }
        applied
    }

    /// Cache contents as fresh (not cached) data for callbacks
    fn current_snapshot(&self) -> ContextSnapshot {
        let mut snapshot = self.cache.get();
        snapshot.from_cache = false;
        snapshot
    }

    fn notify_data(&self) {
        let callback = self.callbacks.read().on_data_updated.clone();
        if let Some(callback) = callback {
            callback(self.current_snapshot());
        }
    }

    fn notify_location(&self, location: Location) {
        let callback = self.callbacks.read().on_location_updated.clone();
        if let Some(callback) = callback {
            callback(location);
        }
    }

    fn notify_weather(&self, weather: WeatherSnapshot) {
        let callback = self.callbacks.read().on_weather_updated.clone();
        if let Some(callback) = callback {
            callback(weather);
        }
    }

    fn notify_news(&self, news: NewsBundle) {
        let callback = self.callbacks.read().on_news_updated.clone();
        if let Some(callback) = callback {
            callback(news);
        }
    }

    /// Run `task` on the tracker. It starts once `after` fires (if given) and
    /// stops early when the cache is cleared or the coordinator shuts down.
    fn spawn<F>(&self, name: &'static str, after: Option<CancellationToken>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let stop = self.background.lock().clone();
        self.tracker.spawn(
            async move {
                if let Some(after) = after {
                    after.cancelled().await;
                }
                tokio::select! {
                    biased;
                    () = stop.cancelled() => debug!("Background task cancelled"),
                    () = task => {}
                }
            }
            .instrument(info_span!("background", task = name)),
        );
    }

    fn spawn_news_fetch(self: &Arc<Self>, epoch: u64, after: CancellationToken) {
        let this = Arc::clone(self);
        self.spawn("news_fetch", Some(after), async move {
            let bundle = this.fetch_top_news().await;
            if !this.write(CacheUpdate::News(bundle.clone()), epoch) {
                return;
            }
            info!("Top news loaded: {} articles", bundle.top_news.len());
            this.notify_data();
            this.spawn_news_expansion(epoch, bundle);
        });
    }

    fn spawn_news_expansion(self: &Arc<Self>, epoch: u64, bundle: NewsBundle) {
        let this = Arc::clone(self);
        self.spawn("news_expansion", None, async move {
            let settings = &this.settings;
            let location = this
                .cache
                .entry()
                .location
                .clone()
                .unwrap_or_else(|| this.location.default_location());

            let local_filters = NewsFilters {
                page_size: Some(settings.local_page_size),
                sort_by: Some("publishedAt".to_string()),
                ..NewsFilters::default()
            };
            let tech_filters = NewsFilters {
                page_size: Some(TECH_PAGE_SIZE),
                sort_by: Some("popularity".to_string()),
                days_back: Some(TECH_DAYS_BACK),
                domains: Some(TECH_DOMAINS.to_string()),
                ..NewsFilters::default()
            };

            let (local, tech) = tokio::join!(
                this.bounded(
                    "local news",
                    settings.news_timeout,
                    this.news.fetch_local(&location, &local_filters),
                ),
                this.bounded(
                    "tech news",
                    settings.news_timeout,
                    this.news.fetch_topic(&settings.tech_topic, &tech_filters),
                ),
            );

            let mut tech = tech.unwrap_or_default();
            tech.truncate(settings.tech_limit);
            let bundle = bundle.expanded(local.unwrap_or_default(), tech);

            if this.write(CacheUpdate::News(bundle.clone()), epoch) {
                info!(
                    "Additional news loaded: {} local, {} tech",
                    bundle.local_news.len(),
                    bundle.tech_news.len()
                );
                this.notify_news(bundle);
            }
        });
    }

    fn spawn_address_resolve(
        self: &Arc<Self>,
        epoch: u64,
        location: &Location,
        after: Option<CancellationToken>,
    ) {
        let this = Arc::clone(self);
        let (latitude, longitude) = (location.latitude, location.longitude);
        self.spawn("address_resolve", after, async move {
            let address = this
                .bounded(
                    "address",
                    this.settings.location_timeout,
                    this.location.resolve_address(latitude, longitude),
                )
                .await
                .unwrap_or_else(|| this.location.default_address(latitude, longitude));

            let update = CacheUpdate::Address {
                address,
                latitude,
                longitude,
            };
            if this.write(update, epoch) {
                if let Some(location) = this.cache.entry().location.clone() {
                    info!("Address resolved: {}", location.address.city);
                    this.notify_location(location);
                }
            }
        });
    }

    fn spawn_forecast_fetch(
        self: &Arc<Self>,
        epoch: u64,
        location: &Location,
        after: Option<CancellationToken>,
    ) {
        let this = Arc::clone(self);
        let (latitude, longitude) = (location.latitude, location.longitude);
        self.spawn("forecast_fetch", after, async move {
            let forecast = this
                .bounded(
                    "forecast",
                    this.settings.weather_timeout,
                    this.weather.fetch_forecast(latitude, longitude),
                )
                .await
                .unwrap_or_else(|| this.weather.default_forecast());

            if this.write(CacheUpdate::Forecast(forecast), epoch) {
                if let Some(weather) = this.cache.entry().weather.clone() {
                    this.notify_weather(weather);
                }
            }
        });
    }

    /// Refetch everything without reusing the cache
    fn spawn_full_refresh(self: &Arc<Self>, after: CancellationToken) {
        let this = Arc::clone(self);
        let epoch = self.cache.epoch();
        self.spawn("full_refresh", Some(after), async move {
            let location_and_weather = async {
                let mut location = this.fetch_location().await;
                if let Some(cached) = this.cache.entry().location.as_ref() {
                    if location.needs_address()
                        && cached.address.resolved
                        && cached.is_same_fix(location.latitude, location.longitude)
                    {
                        location.address = cached.address.clone();
                    }
                }
                let weather = this.fetch_weather(&location).await;
                (location, weather)
            };
            let ((location, weather), news) =
                tokio::join!(location_and_weather, this.fetch_top_news());

            let update = CacheUpdate::Full {
                location: location.clone(),
                weather: weather.clone(),
                news: news.clone(),
            };
            if !this.write(update, epoch) {
                return;
            }
            info!("Background refresh completed");
            this.notify_data();

            this.spawn_news_expansion(epoch, news);
            if location.needs_address() {
                this.spawn_address_resolve(epoch, &location, None);
            }
            if weather.needs_forecast() {
                this.spawn_forecast_fetch(epoch, &location, None);
            }
        });
    }
}
