//! Current conditions and the cached weather snapshot

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::{Forecast, Location};
use crate::learning::LearningContent;

/// Current weather conditions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Temperature in Celsius
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Visibility in meters
    pub visibility: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: u16,
    /// Coarse condition keyword ("Clear", "Clouds", "Rain", ...)
    pub condition: String,
    /// Human-readable description of weather conditions
    pub description: String,
    pub icon: String,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub place_name: Option<String>,
    /// True for fallback data that did not come from a weather service
    pub is_simulated: bool,
}

impl CurrentWeather {
    /// Deterministic fallback conditions for the default location
    #[must_use]
    pub fn simulated() -> Self {
        let location = Location::default_fix();
        let (sunrise, sunset) =
            sun_times(location.latitude, location.longitude, Utc::now().date_naive());
        Self {
            temperature: 26.0,
            feels_like: 29.0,
            humidity: 68,
            pressure: 1015.0,
            visibility: 10_000.0,
            wind_speed: 2.1,
            wind_direction: 90,
            condition: "Clouds".to_string(),
            description: "partly cloudy".to_string(),
            icon: "02d".to_string(),
            sunrise,
            sunset,
            place_name: Some(location.address.city),
            is_simulated: true,
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.0}°C", self.temperature)
    }
}

/// Weather part of a context snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub current: CurrentWeather,
    /// Filled in the background; its absence does not invalidate the snapshot
    pub forecast: Option<Forecast>,
    pub learning: LearningContent,
}

impl WeatherSnapshot {
    /// Snapshot for freshly fetched conditions, forecast still pending
    #[must_use]
    pub fn from_current(current: CurrentWeather) -> Self {
        let learning = LearningContent::from_current(&current);
        Self {
            current,
            forecast: None,
            learning,
        }
    }

    /// Full fallback snapshot, forecast included
    #[must_use]
    pub fn fallback(current: CurrentWeather, forecast: Forecast) -> Self {
        Self {
            current,
            forecast: Some(forecast),
            learning: LearningContent::basic(),
        }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.current.is_simulated
    }

    #[must_use]
    pub fn needs_forecast(&self) -> bool {
        self.forecast.is_none()
    }
}

/// Sunrise and sunset for a location and day. Polar days fall back to 06:00/19:00 UTC.
#[must_use]
pub fn sun_times(latitude: f64, longitude: f64, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let fallback = |hour: u32| {
        date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
            .and_utc()
    };

    let Some(coordinates) = Coordinates::new(latitude, longitude) else {
        return (fallback(6), fallback(19));
    };

    let solar_day = SolarDay::new(coordinates, date);
    let sunrise = solar_day
        .event_time(SolarEvent::Sunrise)
        .unwrap_or_else(|| fallback(6));
    let sunset = solar_day
        .event_time(SolarEvent::Sunset)
        .unwrap_or_else(|| fallback(19));

    (sunrise, sunset)
}
