//! Weather from the Open-Meteo forecast API

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::models::forecast::FORECAST_DAYS;
use crate::models::{CurrentWeather, DailyForecast, Forecast, sun_times};
use crate::{ContextError, Result};

const PROVIDER: &str = "weather";

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
surface_pressure,visibility,wind_speed_10m,wind_direction_10m,weather_code";

const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
relative_humidity_2m_mean,wind_speed_10m_max";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentData>,
    daily: Option<DailyData>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    #[serde(rename = "temperature_2m")]
    temperature: f64,
    #[serde(rename = "apparent_temperature")]
    feels_like: Option<f64>,
    #[serde(rename = "relative_humidity_2m")]
    humidity: Option<f64>,
    #[serde(rename = "surface_pressure")]
    pressure: Option<f64>,
    visibility: Option<f64>,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: Option<f64>,
    #[serde(rename = "wind_direction_10m")]
    wind_direction: Option<f64>,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<NaiveDate>,
    weather_code: Vec<Option<u8>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
}

/// Condition keyword, description and icon code for a WMO weather code
#[must_use]
pub fn describe_weather_code(code: u8) -> (&'static str, &'static str, &'static str) {
    match code {
        0 => ("Clear", "clear sky", "01d"),
        1 => ("Clear", "mainly clear", "01d"),
        2 => ("Clouds", "partly cloudy", "02d"),
        3 => ("Clouds", "overcast", "04d"),
        45 | 48 => ("Mist", "fog", "50d"),
        51 => ("Drizzle", "light drizzle", "09d"),
        53 => ("Drizzle", "moderate drizzle", "09d"),
        55 => ("Drizzle", "dense drizzle", "09d"),
        56 | 57 => ("Drizzle", "freezing drizzle", "09d"),
        61 => ("Rain", "slight rain", "10d"),
        63 => ("Rain", "moderate rain", "10d"),
        65 => ("Rain", "heavy rain", "10d"),
        66 | 67 => ("Rain", "freezing rain", "13d"),
        71 => ("Snow", "slight snow fall", "13d"),
        73 => ("Snow", "moderate snow fall", "13d"),
        75 => ("Snow", "heavy snow fall", "13d"),
        77 => ("Snow", "snow grains", "13d"),
        80..=82 => ("Rain", "rain showers", "09d"),
        85 | 86 => ("Snow", "snow showers", "13d"),
        95 => ("Thunderstorm", "thunderstorm", "11d"),
        96 | 99 => ("Thunderstorm", "thunderstorm with hail", "11d"),
        _ => ("Unknown", "unknown conditions", "03d"),
    }
}

fn to_humidity(value: Option<f64>) -> u8 {
    value.map_or(0, |h| h.round().clamp(0.0, 100.0) as u8)
}

fn to_direction(value: Option<f64>) -> u16 {
    value.map_or(0, |d| (d.round() as i64).rem_euclid(360) as u16)
}

pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn request(&self, query: &str) -> Result<ForecastResponse> {
        let url = format!("{}/forecast?{query}", self.base_url);
        debug!("Open-Meteo request URL: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ContextError::provider(
                PROVIDER,
                format!("Open-Meteo returned status {}", response.status()),
            ));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    #[instrument(skip(self))]
    async fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather> {
        let query = format!(
            "latitude={latitude}&longitude={longitude}&current={CURRENT_FIELDS}&wind_speed_unit=ms&timezone=UTC"
        );
        let current = self
            .request(&query)
            .await?
            .current
            .ok_or_else(|| ContextError::provider(PROVIDER, "no current weather in response"))?;

        let (condition, description, icon) = describe_weather_code(current.weather_code);
        let (sunrise, sunset) = sun_times(latitude, longitude, Utc::now().date_naive());

        info!("Current weather: {:.1}°C, {}", current.temperature, description);

        Ok(CurrentWeather {
            temperature: current.temperature,
            feels_like: current.feels_like.unwrap_or(current.temperature),
            humidity: to_humidity(current.humidity),
            pressure: current.pressure.unwrap_or_default(),
            visibility: current.visibility.unwrap_or_default(),
            wind_speed: current.wind_speed.unwrap_or_default(),
            wind_direction: to_direction(current.wind_direction),
            condition: condition.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            sunrise,
            sunset,
            place_name: None,
            is_simulated: false,
        })
    }

    #[instrument(skip(self))]
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast> {
        let query = format!(
            "latitude={latitude}&longitude={longitude}&daily={DAILY_FIELDS}&wind_speed_unit=ms&timezone=auto&forecast_days={FORECAST_DAYS}"
        );
        let daily = self
            .request(&query)
            .await?
            .daily
            .ok_or_else(|| ContextError::provider(PROVIDER, "no daily forecast in response"))?;

        let days: Vec<DailyForecast> = daily
            .time
            .iter()
            .enumerate()
            .filter_map(|(i, date)| {
                let max = daily.temperature_2m_max.get(i).copied().flatten()?;
                let min = daily.temperature_2m_min.get(i).copied().flatten()?;
                let code = daily.weather_code.get(i).copied().flatten().unwrap_or(u8::MAX);
                let (condition, description, icon) = describe_weather_code(code);

                Some(DailyForecast {
                    date: *date,
                    temperature: ((max + min) / 2.0 * 10.0).round() / 10.0,
                    condition: condition.to_string(),
                    description: description.to_string(),
                    icon: icon.to_string(),
                    humidity: to_humidity(daily.relative_humidity_2m_mean.get(i).copied().flatten()),
                    wind_speed: daily
                        .wind_speed_10m_max
                        .get(i)
                        .copied()
                        .flatten()
                        .unwrap_or_default(),
                })
            })
            .collect();

        if days.is_empty() {
            return Err(ContextError::provider(PROVIDER, "forecast contained no usable days"));
        }

        info!("Retrieved {} forecast days", days.len());
        Ok(Forecast::new(None, days))
    }
}
