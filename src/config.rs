//! Settings for cache TTLs, provider endpoints and logging.
//!
//! Read from an optional TOML file, overridden by `LEARNCONTEXT_*`
//! environment variables, then defaulted and validated.

use crate::ContextError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Cache TTLs
    #[serde(default)]
    pub cache: CacheConfig,
    /// Location source and reverse geocoder
    #[serde(default)]
    pub location: LocationConfig,
    /// Open-Meteo endpoint
    #[serde(default)]
    pub weather: WeatherConfig,
    /// News API configuration
    #[serde(default)]
    pub news: NewsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Overall/weather/news freshness window in seconds
    #[serde(default = "default_general_ttl")]
    pub general_ttl_secs: u64,
    /// Location freshness window in seconds
    #[serde(default = "default_location_ttl")]
    pub location_ttl_secs: u64,
}

/// Location settings. Without a configured fix the location provider
/// always fails and the coordinator falls back to the default location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Fix accuracy in meters
    #[serde(default = "default_location_accuracy")]
    pub accuracy_m: f64,
    /// Base URL of a Nominatim compatible reverse geocoder
    #[serde(default = "default_geocoder_base_url")]
    pub geocoder_base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
}

/// Open-Meteo settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo base URL
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
}

/// News API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// NewsAPI key; without it every news call falls back to defaults
    pub api_key: Option<String>,
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    #[serde(default = "default_news_country")]
    pub country: String,
    #[serde(default = "default_news_category")]
    pub category: String,
    /// Page size of the fast top-headlines fetch
    #[serde(default = "default_top_page_size")]
    pub top_page_size: u32,
    #[serde(default = "default_local_page_size")]
    pub local_page_size: u32,
    /// Number of technology articles kept after expansion
    #[serde(default = "default_tech_limit")]
    pub tech_limit: u32,
    #[serde(default = "default_tech_topic")]
    pub tech_topic: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_general_ttl() -> u64 {
    5 * 60
}

fn default_location_ttl() -> u64 {
    10 * 60
}

fn default_location_accuracy() -> f64 {
    100.0
}

fn default_geocoder_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_news_country() -> String {
    "us".to_string()
}

fn default_news_category() -> String {
    "general".to_string()
}

fn default_top_page_size() -> u32 {
    5
}

fn default_local_page_size() -> u32 {
    3
}

fn default_tech_limit() -> u32 {
    2
}

fn default_tech_topic() -> String {
    "technology OR AI OR \"artificial intelligence\" OR startup OR innovation".to_string()
}

fn default_provider_timeout() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            general_ttl_secs: default_general_ttl(),
            location_ttl_secs: default_location_ttl(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            accuracy_m: default_location_accuracy(),
            geocoder_base_url: default_geocoder_base_url(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_news_base_url(),
            country: default_news_country(),
            category: default_news_category(),
            top_page_size: default_top_page_size(),
            local_page_size: default_local_page_size(),
            tech_limit: default_tech_limit(),
            tech_topic: default_tech_topic(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn general_ttl(&self) -> Duration {
        Duration::from_secs(self.general_ttl_secs)
    }

    #[must_use]
    pub fn location_ttl(&self) -> Duration {
        Duration::from_secs(self.location_ttl_secs)
    }
}

impl LocationConfig {
    /// The configured coordinate fix, if both coordinates are set
    #[must_use]
    pub fn fix(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl ContextConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. LEARNCONTEXT_NEWS__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("LEARNCONTEXT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: ContextConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("learncontext").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.cache.general_ttl_secs == 0 {
            self.cache.general_ttl_secs = default_general_ttl();
        }
        if self.cache.location_ttl_secs == 0 {
            self.cache.location_ttl_secs = default_location_ttl();
        }
        if self.location.geocoder_base_url.is_empty() {
            self.location.geocoder_base_url = default_geocoder_base_url();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_provider_timeout();
        }
        if self.news.base_url.is_empty() {
            self.news.base_url = default_news_base_url();
        }
        if self.news.top_page_size == 0 {
            self.news.top_page_size = default_top_page_size();
        }
        if self.news.timeout_seconds == 0 {
            self.news.timeout_seconds = default_provider_timeout();
        }
        if self.location.timeout_seconds == 0 {
            self.location.timeout_seconds = default_provider_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.news.api_key.as_deref().is_some_and(str::is_empty) {
            self.news.api_key = None;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_coordinates()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.cache.general_ttl_secs > 24 * 60 * 60 {
            return Err(ContextError::config("Cache TTL cannot exceed 24 hours").into());
        }

        if self.cache.location_ttl_secs < self.cache.general_ttl_secs {
            return Err(ContextError::config(
                "Location TTL cannot be shorter than the general cache TTL",
            )
            .into());
        }

        for (name, timeout) in [
            ("Location", self.location.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
            ("News", self.news.timeout_seconds),
        ] {
            if timeout > 120 {
                return Err(ContextError::config(format!(
                    "{name} timeout cannot exceed 120 seconds"
                ))
                .into());
            }
        }

        if self.news.top_page_size > 100 || self.news.local_page_size > 100 {
            return Err(ContextError::config("News page size cannot exceed 100").into());
        }

        Ok(())
    }

    fn validate_coordinates(&self) -> Result<()> {
        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(ContextError::config(format!(
                        "Configured location ({lat}, {lon}) is out of range"
                    ))
                    .into());
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err(ContextError::config(
                "Both latitude and longitude must be set for a configured location",
            )
            .into()),
        }
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ContextError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ContextError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoder", &self.location.geocoder_base_url),
            ("Weather API", &self.weather.base_url),
            ("News API", &self.news.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ContextError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
