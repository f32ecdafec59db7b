//! Scriptable providers for coordinator tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use learncontext::models::{CurrentWeather, Forecast};
use learncontext::{
    Address, AggregationCoordinator, Article, CacheStore, ContextError, ContextSnapshot,
    CoordinatorSettings, Location, LocationProvider, NewsBundle, NewsFilters, NewsProvider,
    Result, UpdateCallbacks, WeatherProvider, WeatherSnapshot,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const LONDON: (f64, f64) = (51.5072, -0.1276);

/// How a mock responds to every call
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    pub fail: bool,
    pub delay: Duration,
}

impl Behavior {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { fail: false, delay }
    }

    async fn run<T>(&self, provider: &'static str, value: impl FnOnce() -> T) -> Result<T> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            Err(ContextError::provider(provider, "scripted failure"))
        } else {
            Ok(value())
        }
    }
}

#[derive(Debug, Default)]
pub struct MockLocation {
    pub behavior: Behavior,
    pub address_behavior: Behavior,
    pub fetches: AtomicUsize,
    pub resolves: AtomicUsize,
}

impl MockLocation {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }
}

#[async_trait]
impl LocationProvider for MockLocation {
    async fn fetch(&self) -> Result<Location> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.behavior
            .run("location", || Location::from_fix(LONDON.0, LONDON.1, 15.0))
            .await
    }

    async fn resolve_address(&self, _latitude: f64, _longitude: f64) -> Result<Address> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.address_behavior
            .run("location", || {
                Address::new(
                    "Westminster",
                    "Greater London",
                    "United Kingdom",
                    "Westminster, London, United Kingdom",
                )
            })
            .await
    }
}

#[derive(Debug, Default)]
pub struct MockWeather {
    pub behavior: Behavior,
    pub forecast_behavior: Behavior,
    pub fetches: AtomicUsize,
    pub forecasts: AtomicUsize,
}

impl MockWeather {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }
}

pub fn rainy() -> CurrentWeather {
    CurrentWeather {
        temperature: 14.0,
        feels_like: 12.5,
        condition: "Rain".to_string(),
        description: "light rain".to_string(),
        icon: "10d".to_string(),
        place_name: None,
        is_simulated: false,
        ..CurrentWeather::simulated()
    }
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn fetch_current(&self, _latitude: f64, _longitude: f64) -> Result<CurrentWeather> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.behavior.run("weather", rainy).await
    }

    async fn fetch_forecast(&self, _latitude: f64, _longitude: f64) -> Result<Forecast> {
        self.forecasts.fetch_add(1, Ordering::SeqCst);
        self.forecast_behavior
            .run("weather", || Forecast {
                place_name: Some("London".to_string()),
                is_simulated: false,
                ..Forecast::simulated(Utc::now().date_naive())
            })
            .await
    }
}

#[derive(Debug, Default)]
pub struct MockNews {
    pub behavior: Behavior,
    pub top_fetches: AtomicUsize,
}

impl MockNews {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }
}

fn articles(prefix: &str, count: usize) -> Vec<Article> {
    (0..count)
        .map(|i| {
            Article::new(
                &format!("{prefix}-{i}"),
                &format!("{prefix} headline {i}"),
                "Officials announced the plan on Monday.",
                "Wire",
            )
        })
        .collect()
}

#[async_trait]
impl NewsProvider for MockNews {
    async fn fetch_top(&self, filters: &NewsFilters) -> Result<Vec<Article>> {
        self.top_fetches.fetch_add(1, Ordering::SeqCst);
        let count = filters.page_size.unwrap_or(5) as usize;
        self.behavior.run("news", || articles("top", count)).await
    }

    async fn fetch_local(&self, _location: &Location, filters: &NewsFilters) -> Result<Vec<Article>> {
        let count = filters.page_size.unwrap_or(3) as usize;
        self.behavior.run("news", || articles("local", count)).await
    }

    async fn fetch_topic(&self, _topic: &str, _filters: &NewsFilters) -> Result<Vec<Article>> {
        self.behavior.run("news", || articles("tech", 6)).await
    }
}

pub struct Harness {
    pub coordinator: AggregationCoordinator,
    pub cache: Arc<CacheStore>,
    pub location: Arc<MockLocation>,
    pub weather: Arc<MockWeather>,
    pub news: Arc<MockNews>,
}

impl Harness {
    pub fn new(location: MockLocation, weather: MockWeather, news: MockNews) -> Self {
        Self::with_cache(CacheStore::default(), location, weather, news)
    }

    pub fn with_cache(
        cache: CacheStore,
        location: MockLocation,
        weather: MockWeather,
        news: MockNews,
    ) -> Self {
        let location = Arc::new(location);
        let weather = Arc::new(weather);
        let news = Arc::new(news);
        let cache = Arc::new(cache);
        let settings = CoordinatorSettings {
            location_timeout: Duration::from_secs(2),
            weather_timeout: Duration::from_secs(2),
            news_timeout: Duration::from_secs(2),
            ..CoordinatorSettings::default()
        };

        let coordinator = AggregationCoordinator::new(
            location.clone(),
            weather.clone(),
            news.clone(),
            cache.clone(),
            settings,
        );

        Self {
            coordinator,
            cache,
            location,
            weather,
            news,
        }
    }

    pub fn healthy() -> Self {
        Self::new(
            MockLocation::new(Behavior::ok()),
            MockWeather::new(Behavior::ok()),
            MockNews::new(Behavior::ok()),
        )
    }
}

/// Every callback invocation, in order
#[derive(Clone, Default)]
pub struct Recorded {
    pub data: Arc<Mutex<Vec<ContextSnapshot>>>,
    pub locations: Arc<Mutex<Vec<Location>>>,
    pub weather: Arc<Mutex<Vec<WeatherSnapshot>>>,
    pub news: Arc<Mutex<Vec<NewsBundle>>>,
}

impl Recorded {
    pub fn attach(coordinator: &AggregationCoordinator) -> Self {
        let recorded = Self::default();
        let (data, locations, weather, news) = (
            recorded.data.clone(),
            recorded.locations.clone(),
            recorded.weather.clone(),
            recorded.news.clone(),
        );

        coordinator.set_update_callbacks(
            UpdateCallbacks::default()
                .with_data_updated(move |s| data.lock().push(s))
                .with_location_updated(move |l| locations.lock().push(l))
                .with_weather_updated(move |w| weather.lock().push(w))
                .with_news_updated(move |n| news.lock().push(n)),
        );
        recorded
    }
}
