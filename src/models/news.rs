//! News articles, extracted vocabulary, and the categorized bundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::news_analysis;

/// Number of article categories the analysis heuristic can produce
pub const TOTAL_CATEGORIES: u32 = 8;

const LEARNING_VOCABULARY: usize = 8;
const LEARNING_PHRASES: usize = 5;
const LEARNING_ARTICLES: usize = 3;

/// A vocabulary term found in an article
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VocabularyTerm {
    pub word: String,
    pub category: String,
    /// beginner, intermediate or advanced
    pub level: String,
    pub definition: String,
    /// Sentence from the article that uses the word
    pub example: String,
}

/// A common reporting phrase found in an article
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KeyPhrase {
    pub phrase: String,
    pub usage: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_local: bool,
    pub category: String,
    /// At most five extracted terms
    pub vocabulary: Vec<VocabularyTerm>,
    pub key_phrases: Vec<KeyPhrase>,
    pub keywords: Vec<String>,
}

impl Article {
    /// Article with no analysis attached yet
    #[must_use]
    pub fn new(id: &str, title: &str, description: &str, source: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            source: source.to_string(),
            url: None,
            published_at: None,
            is_local: false,
            category: "General".to_string(),
            vocabulary: Vec::new(),
            key_phrases: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

/// Counts and provider health for a bundle
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsStats {
    pub total_categories: u32,
    pub top_count: usize,
    pub local_count: usize,
    pub tech_count: usize,
    /// False when the bundle is static fallback content
    pub api_available: bool,
    pub status: String,
    pub last_update: Option<DateTime<Utc>>,
}

/// Categorized article collections
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsBundle {
    pub top_news: Vec<Article>,
    pub local_news: Vec<Article>,
    pub tech_news: Vec<Article>,
    pub stats: NewsStats,
}

impl NewsBundle {
    /// Bundle holding freshly fetched top headlines; local and tech follow later
    #[must_use]
    pub fn with_top(top_news: Vec<Article>, api_available: bool) -> Self {
        let mut bundle = Self {
            top_news,
            local_news: Vec::new(),
            tech_news: Vec::new(),
            stats: NewsStats {
                total_categories: TOTAL_CATEGORIES,
                top_count: 0,
                local_count: 0,
                tech_count: 0,
                api_available,
                status: if api_available { "Active" } else { "Mock Data" }.to_string(),
                last_update: Some(Utc::now()),
            },
        };
        bundle.refresh_counts();
        bundle
    }

    /// Same bundle with local and tech collections filled in
    #[must_use]
    pub fn expanded(mut self, local_news: Vec<Article>, tech_news: Vec<Article>) -> Self {
        self.local_news = local_news;
        self.tech_news = tech_news;
        self.stats.last_update = Some(Utc::now());
        self.refresh_counts();
        self
    }

    /// Static bundle shown before any news fetch has completed
    #[must_use]
    pub fn fallback() -> Self {
        let top_news = vec![
            fallback_article(
                "default-1",
                "Weather Learning with Technology",
                "Learning English through contextual weather information.",
                "Education",
                &[("technology", "Technology"), ("learning", "Education")],
            ),
            fallback_article(
                "default-2",
                "Language Learning Apps Grow Popular",
                "Mobile applications for language learning see increased usage.",
                "Technology",
                &[("mobile", "Technology"), ("application", "Technology")],
            ),
        ];

        Self {
            stats: NewsStats {
                total_categories: TOTAL_CATEGORIES,
                top_count: top_news.len(),
                local_count: 0,
                tech_count: 0,
                api_available: false,
                status: "Mock Data".to_string(),
                last_update: None,
            },
            top_news,
            local_news: Vec::new(),
            tech_news: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        !self.stats.api_available
    }

    /// Study material aggregated from the top headlines
    #[must_use]
    pub fn learning_content(&self) -> NewsLearningContent {
        NewsLearningContent::from_articles(&self.top_news)
    }

    #[must_use]
    pub fn total_articles(&self) -> usize {
        self.top_news.len() + self.local_news.len() + self.tech_news.len()
    }

    fn refresh_counts(&mut self) {
        self.stats.top_count = self.top_news.len();
        self.stats.local_count = self.local_news.len();
        self.stats.tech_count = self.tech_news.len();
    }
}

/// Vocabulary, phrases and tips pooled across several articles
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsLearningContent {
    pub vocabulary: Vec<VocabularyTerm>,
    pub phrases: Vec<KeyPhrase>,
    /// Distinct categories in first-seen order
    pub categories: Vec<String>,
    pub articles: Vec<Article>,
    pub tips: Vec<String>,
}

impl NewsLearningContent {
    #[must_use]
    pub fn from_articles(articles: &[Article]) -> Self {
        let vocabulary: Vec<VocabularyTerm> = articles
            .iter()
            .flat_map(|a| a.vocabulary.iter().cloned())
            .collect();

        let mut categories: Vec<String> = Vec::new();
        for article in articles {
            if !article.category.is_empty() && !categories.contains(&article.category) {
                categories.push(article.category.clone());
            }
        }

        // tips look at every term, not just the ones kept
        let tips = news_analysis::learning_tips(&vocabulary, &categories);

        Self {
            vocabulary: vocabulary.into_iter().take(LEARNING_VOCABULARY).collect(),
            phrases: articles
                .iter()
                .flat_map(|a| a.key_phrases.iter().cloned())
                .take(LEARNING_PHRASES)
                .collect(),
            categories,
            articles: articles.iter().take(LEARNING_ARTICLES).cloned().collect(),
            tips,
        }
    }
}

fn fallback_article(
    id: &str,
    title: &str,
    description: &str,
    category: &str,
    words: &[(&str, &str)],
) -> Article {
    Article {
        category: category.to_string(),
        vocabulary: words
            .iter()
            .map(|(word, category)| VocabularyTerm {
                word: word.to_string(),
                category: category.to_string(),
                level: "beginner".to_string(),
                definition: String::new(),
                example: title.to_string(),
            })
            .collect(),
        ..Article::new(id, title, description, "LearnContext")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_fallback_bundle() {
        let bundle = NewsBundle::fallback();
        assert!(bundle.is_default());
        assert_eq!(bundle.top_news.len(), 2);
        assert_eq!(bundle.stats.top_count, 2);
        assert!(bundle.local_news.is_empty());
        assert_eq!(bundle, NewsBundle::fallback());
    }

    #[test]
    fn test_with_top_then_expanded_counts() {
        let article = NewsBundle::fallback().top_news[0].clone();
        let bundle = NewsBundle::with_top(vec![article.clone()], true);
        assert!(!bundle.is_default());
        assert_eq!(bundle.stats.status, "Active");
        assert_eq!(bundle.stats.top_count, 1);

        let bundle = bundle.expanded(vec![article.clone(), article.clone()], vec![article]);
        assert_eq!(bundle.stats.local_count, 2);
        assert_eq!(bundle.stats.tech_count, 1);
        assert_eq!(bundle.total_articles(), 4);
    }

    fn analyzed(id: &str, title: &str, description: &str) -> Article {
        news_analysis::analyze(Article::new(id, title, description, "Wire"))
    }

    #[test]
    fn test_learning_content_caps() {
        let articles: Vec<Article> = (0..4)
            .map(|i| {
                analyzed(
                    &format!("a{i}"),
                    "Experts say government policy on economy and technology",
                    "According to reports, the election will shape investment.",
                )
            })
            .collect();

        let content = NewsLearningContent::from_articles(&articles);
        assert_eq!(content.vocabulary.len(), LEARNING_VOCABULARY);
        assert_eq!(content.phrases.len(), LEARNING_PHRASES);
        assert_eq!(content.articles.len(), LEARNING_ARTICLES);
        assert_eq!(content.categories.len(), 1);
        assert!(content.tips.len() <= 5);
    }

    #[rstest]
    #[case("New digital tools reach schools", "Technology", true)]
    #[case("Festival draws crowds", "General", false)]
    fn test_learning_content_categories_and_tips(
        #[case] title: &str,
        #[case] category: &str,
        #[case] tech_tip: bool,
    ) {
        let bundle = NewsBundle::with_top(vec![analyzed("a1", title, "")], true);
        let content = bundle.learning_content();

        assert_eq!(content.categories, vec![category.to_string()]);
        assert_eq!(
            content
                .tips
                .iter()
                .any(|t| t == "Tech news contains many modern English words"),
            tech_tip
        );
    }

    #[test]
    fn test_learning_content_without_articles() {
        let content = NewsLearningContent::from_articles(&[]);
        assert!(content.vocabulary.is_empty());
        assert!(content.categories.is_empty());
        assert_eq!(content.tips.len(), 4);
    }
}
