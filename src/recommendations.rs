//! Learning suggestions derived from a snapshot

use serde::{Deserialize, Serialize};

use crate::models::ContextSnapshot;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Weather,
    Location,
    News,
    Technology,
    Default,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub suggestion: String,
    pub vocabulary: Vec<String>,
}

impl Recommendation {
    fn new(kind: RecommendationKind, title: &str, suggestion: String, vocabulary: &[&str]) -> Self {
        Self {
            kind,
            title: title.to_string(),
            suggestion,
            vocabulary: vocabulary.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Map a snapshot to suggestion buckets. Always returns at least one entry.
#[must_use]
pub fn generate(snapshot: &ContextSnapshot) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let current = &snapshot.weather.current;
    let conditions = format!("{} {}", current.condition, current.description).to_lowercase();

    if conditions.contains("rain") {
        recommendations.push(Recommendation::new(
            RecommendationKind::Weather,
            "Rainy Day Learning",
            "Perfect time for indoor English study! Learn weather-related vocabulary.".to_string(),
            &["umbrella", "raincoat", "indoor", "cozy", "study"],
        ));
    } else if conditions.contains("clear") || conditions.contains("sun") {
        recommendations.push(Recommendation::new(
            RecommendationKind::Weather,
            "Sunny Day Activities",
            "Great weather for outdoor vocabulary practice!".to_string(),
            &["sunshine", "outdoor", "bright", "activity", "fresh air"],
        ));
    }

    let location = &snapshot.location;
    if location.latitude.is_finite() && location.longitude.is_finite() {
        let place = if location.address.is_placeholder() {
            "your area"
        } else {
            location.address.city.as_str()
        };
        recommendations.push(Recommendation::new(
            RecommendationKind::Location,
            "Local Area Vocabulary",
            format!("Learn English words related to {place}"),
            &["city", "district", "neighborhood", "local", "area"],
        ));
    }

    if !snapshot.news.top_news.is_empty() {
        recommendations.push(Recommendation::new(
            RecommendationKind::News,
            "Current Events English",
            "Stay updated with English news vocabulary".to_string(),
            &["current", "events", "news", "headline", "article"],
        ));
    }

    if !snapshot.news.tech_news.is_empty() {
        recommendations.push(Recommendation::new(
            RecommendationKind::Technology,
            "Technology Vocabulary",
            "Learn modern tech terms from current news".to_string(),
            &["technology", "digital", "innovation", "artificial", "intelligence"],
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::new(
            RecommendationKind::Default,
            "Daily English Practice",
            "Continue your English learning journey with daily practice!".to_string(),
            &["practice", "daily", "learning", "english", "study"],
        ));
    }

    recommendations
}
