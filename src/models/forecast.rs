//! Daily forecast model and its fallback

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of days kept in a forecast
pub const FORECAST_DAYS: usize = 5;

const SIMULATED_PATTERN: [(f64, &str, &str, &str); FORECAST_DAYS] = [
    (27.0, "Clouds", "partly cloudy", "02d"),
    (29.0, "Clear", "sunny", "01d"),
    (25.0, "Rain", "light rain", "10d"),
    (26.0, "Clouds", "cloudy", "03d"),
    (28.0, "Clear", "clear sky", "01d"),
];

/// One day of forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Representative temperature in Celsius
    pub temperature: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
}

/// Ordered daily summaries, earliest first
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Forecast {
    pub place_name: Option<String>,
    pub days: Vec<DailyForecast>,
    pub retrieved_at: DateTime<Utc>,
    pub is_simulated: bool,
}

impl Forecast {
    /// Create a forecast, keeping days in date order and at most [`FORECAST_DAYS`]
    #[must_use]
    pub fn new(place_name: Option<String>, mut days: Vec<DailyForecast>) -> Self {
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);
        days.truncate(FORECAST_DAYS);
        Self {
            place_name,
            days,
            retrieved_at: Utc::now(),
            is_simulated: false,
        }
    }

    /// Deterministic five-day fallback starting the day after `today`
    #[must_use]
    pub fn simulated(today: NaiveDate) -> Self {
        let days = SIMULATED_PATTERN
            .iter()
            .enumerate()
            .map(|(i, (temperature, condition, description, icon))| DailyForecast {
                date: today + Duration::days(i as i64 + 1),
                temperature: *temperature,
                condition: condition.to_string(),
                description: description.to_string(),
                icon: icon.to_string(),
                humidity: 65 + (i as u8) * 3,
                wind_speed: 1.5 + i as f64 * 0.5,
            })
            .collect();

        Self {
            place_name: Some("Wong Tai Sin".to_string()),
            days,
            retrieved_at: today.and_time(NaiveTime::MIN).and_utc(),
            is_simulated: true,
        }
    }

    /// Forecast for `day_offset` days after the first entry
    #[must_use]
    pub fn day(&self, day_offset: usize) -> Option<&DailyForecast> {
        let first = self.days.first()?;
        let target = first.date + Duration::days(i64::try_from(day_offset).unwrap_or(0));
        self.days.iter().find(|d| d.date == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: NaiveDate, temperature: f64) -> DailyForecast {
        DailyForecast {
            date,
            temperature,
            condition: "Clear".to_string(),
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
            humidity: 50,
            wind_speed: 3.0,
        }
    }

    #[test]
    fn test_forecast_orders_and_truncates() {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = (0..8)
            .rev()
            .map(|i| day(base + Duration::days(i), 10.0 + i as f64))
            .collect();

        let forecast = Forecast::new(None, days);
        assert_eq!(forecast.days.len(), FORECAST_DAYS);
        assert_eq!(forecast.days[0].date, base);
        assert_eq!(forecast.day(1).map(|d| d.temperature), Some(11.0));
        assert!(forecast.day(7).is_none());
    }

    #[test]
    fn test_simulated_forecast_is_deterministic() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let a = Forecast::simulated(today);
        assert_eq!(a, Forecast::simulated(today));
        assert_eq!(a.days.len(), FORECAST_DAYS);
        assert_eq!(a.days[0].date, today + Duration::days(1));
        assert!(a.is_simulated);
    }
}
