//! Vocabulary cards and dialogues derived from current weather

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContextSnapshot, CurrentWeather, ServiceHealth};

const CONDITION_CARDS: usize = 3;
const TEMPERATURE_CARDS: usize = 2;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    WeatherDescription,
    Temperature,
    Vocabulary,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LearningCard {
    pub id: String,
    pub kind: CardKind,
    pub title: String,
    pub english: String,
    pub category: String,
    pub difficulty: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DialogueLine {
    pub speaker: String,
    pub english: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Dialogue {
    pub id: String,
    pub title: String,
    pub lines: Vec<DialogueLine>,
    pub category: String,
    pub difficulty: String,
}

/// Summary of the conditions the content was generated from
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherInfo {
    pub condition: String,
    pub temperature: f64,
    pub description: String,
    pub is_real_data: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LearningContent {
    pub vocabulary: Vec<LearningCard>,
    pub dialogues: Vec<Dialogue>,
    pub weather_info: WeatherInfo,
}

impl LearningContent {
    /// Build cards and a short dialogue for the given conditions
    #[must_use]
    pub fn from_current(weather: &CurrentWeather) -> Self {
        let condition = weather.condition.to_lowercase();
        let temperature = weather.temperature.round();
        let description = weather.description.as_str();

        let mut vocabulary = vec![
            card(
                "current-weather",
                CardKind::WeatherDescription,
                "Current Weather",
                &format!("It's {description} today"),
                "Weather Description",
                "easy",
            ),
            card(
                "temperature",
                CardKind::Temperature,
                "Temperature",
                &format!("The temperature is {temperature} degrees Celsius"),
                "Weather Measurement",
                "medium",
            ),
        ];

        vocabulary.extend(
            condition_words(&condition)
                .iter()
                .take(CONDITION_CARDS)
                .enumerate()
                .map(|(i, word)| {
                    card(
                        &format!("weather-vocab-{i}"),
                        CardKind::Vocabulary,
                        "Weather Vocabulary",
                        word,
                        "Weather Vocabulary",
                        "easy",
                    )
                }),
        );

        vocabulary.extend(
            temperature_words(temperature)
                .iter()
                .take(TEMPERATURE_CARDS)
                .enumerate()
                .map(|(i, word)| {
                    card(
                        &format!("temp-vocab-{i}"),
                        CardKind::Vocabulary,
                        "Temperature Vocabulary",
                        word,
                        "Temperature",
                        "easy",
                    )
                }),
        );

        let closing = if condition.contains("rain") {
            "Don't forget your umbrella!"
        } else {
            "Perfect for outdoor activities!"
        };

        let dialogue = Dialogue {
            id: "weather-chat".to_string(),
            title: "Weather Conversation".to_string(),
            lines: vec![
                line("A", "How's the weather today?"),
                line("B", &format!("It's {description} and {temperature} degrees.")),
                line("A", closing),
            ],
            category: "Daily Conversation".to_string(),
            difficulty: "medium".to_string(),
        };

        Self {
            vocabulary,
            dialogues: vec![dialogue],
            weather_info: WeatherInfo {
                condition,
                temperature: weather.temperature,
                description: weather.description.clone(),
                is_real_data: !weather.is_simulated,
            },
        }
    }

    /// Minimal content used alongside fallback weather
    #[must_use]
    pub fn basic() -> Self {
        Self {
            vocabulary: vec![card(
                "default-weather",
                CardKind::Vocabulary,
                "Basic Weather",
                "weather",
                "Weather",
                "easy",
            )],
            dialogues: Vec::new(),
            weather_info: WeatherInfo {
                condition: "unknown".to_string(),
                temperature: 25.0,
                description: "pleasant weather".to_string(),
                is_real_data: false,
            },
        }
    }

    /// Every English word or sentence on the cards
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(|c| c.english.as_str())
    }
}

/// Totals across the weather cards and the top headlines of a snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LearningStats {
    pub total_vocabulary: usize,
    /// Distinct card and term categories in first-seen order
    pub categories_covered: Vec<String>,
    pub services_active: usize,
    pub data_freshness: DateTime<Utc>,
}

impl LearningStats {
    #[must_use]
    pub fn from_snapshot(snapshot: &ContextSnapshot, health: &ServiceHealth) -> Self {
        let weather = snapshot
            .weather
            .learning
            .vocabulary
            .iter()
            .map(|card| card.category.as_str());
        let news = snapshot
            .news
            .top_news
            .iter()
            .flat_map(|article| article.vocabulary.iter())
            .map(|term| term.category.as_str());

        let mut total_vocabulary = 0;
        let mut categories_covered: Vec<String> = Vec::new();
        for category in weather.chain(news) {
            total_vocabulary += 1;
            if !category.is_empty() && !categories_covered.iter().any(|c| c == category) {
                categories_covered.push(category.to_string());
            }
        }

        Self {
            total_vocabulary,
            categories_covered,
            services_active: health.active_count(),
            data_freshness: snapshot.timestamp,
        }
    }
}

fn condition_words(condition: &str) -> &'static [&'static str] {
    match condition {
        "clear" => &["sunny", "bright", "cloudless", "blue sky", "sunshine"],
        "clouds" => &["cloudy", "overcast", "grey sky", "partly cloudy"],
        "rain" => &["rainy", "drizzle", "shower", "precipitation", "wet"],
        "snow" => &["snowy", "blizzard", "snowfall", "white", "freezing"],
        "thunderstorm" => &["stormy", "thunder", "lightning", "heavy rain"],
        "mist" | "fog" => &["foggy", "misty", "hazy", "low visibility", "damp"],
        "drizzle" => &["light rain", "sprinkle", "mist", "fine rain"],
        _ => &["weather", "climate", "condition"],
    }
}

fn temperature_words(temperature: f64) -> &'static [&'static str] {
    if temperature < 10.0 {
        &["cold", "chilly", "freezing", "winter coat"]
    } else if temperature < 20.0 {
        &["cool", "mild", "light jacket", "pleasant"]
    } else if temperature < 30.0 {
        &["warm", "nice", "t-shirt", "comfortable"]
    } else {
        &["hot", "sweltering", "summer heat", "air conditioning"]
    }
}

fn card(
    id: &str,
    kind: CardKind,
    title: &str,
    english: &str,
    category: &str,
    difficulty: &str,
) -> LearningCard {
    LearningCard {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        english: english.to_string(),
        category: category.to_string(),
        difficulty: difficulty.to_string(),
    }
}

fn line(speaker: &str, english: &str) -> DialogueLine {
    DialogueLine {
        speaker: speaker.to_string(),
        english: english.to_string(),
    }
}
