//! Articles from the NewsAPI `top-headlines` and `everything` endpoints

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{NewsFilters, NewsProvider};
use crate::config::NewsConfig;
use crate::models::{Article, Location};
use crate::news_analysis;
use crate::{ContextError, Result};

const PROVIDER: &str = "news";
const DEFAULT_LOCAL_QUERY: &str = "Hong Kong";
const DEFAULT_LOCAL_DAYS: u32 = 7;
const DEFAULT_TOPIC_DAYS: u32 = 30;
const DEFAULT_TOPIC_PAGE_SIZE: u32 = 15;

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Drop articles missing a title or description, analyze the rest
fn process_articles(raw: Vec<RawArticle>, is_local: bool) -> Vec<Article> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let title = raw.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
            let description = raw.description.filter(|d| !d.trim().is_empty())?;
            let source = raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string());
            let id = raw.url.clone().unwrap_or_else(|| format!("{source}-{i}"));

            let article = Article {
                url: raw.url,
                published_at: raw.published_at,
                is_local,
                ..Article::new(&id, &title, &description, &source)
            };
            Some(news_analysis::analyze(article))
        })
        .collect()
}

/// Region specific outlets for local news
#[must_use]
pub fn local_domains(location: &Location) -> &'static str {
    let city = location.address.city.to_lowercase();
    let country = location.address.country.to_lowercase();

    if city.contains("hong kong") || country.contains("hong kong") {
        "scmp.com,hk01.com,thestandard.com.hk,news.rthk.hk"
    } else if country.contains("taiwan") {
        "taipeitimes.com,focustaiwan.tw"
    } else if city.contains("singapore") || country.contains("singapore") {
        "straitstimes.com,channelnewsasia.com"
    } else {
        "reuters.com,bbc.com,cnn.com,apnews.com"
    }
}

fn local_query(location: &Location) -> String {
    let address = &location.address;
    if address.is_placeholder() {
        return DEFAULT_LOCAL_QUERY.to_string();
    }

    [address.city.as_str(), address.region.as_str()]
        .into_iter()
        .find(|s| !s.is_empty() && !s.starts_with("Unknown"))
        .unwrap_or(DEFAULT_LOCAL_QUERY)
        .to_string()
}

fn query_string(params: &[(&str, Option<String>)]) -> String {
    params
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| format!("{key}={}", urlencoding::encode(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn from_date(days_back: u32) -> String {
    (Utc::now() - ChronoDuration::days(days_back.into()))
        .format("%Y-%m-%d")
        .to_string()
}

pub struct NewsApiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    country: String,
    category: String,
}

impl NewsApiProvider {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            category: config.category.clone(),
        })
    }

    async fn get_articles(
        &self,
        endpoint: &str,
        params: &[(&str, Option<String>)],
    ) -> Result<Vec<RawArticle>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ContextError::provider(PROVIDER, "NewsAPI key not configured"))?;

        let url = format!("{}/{endpoint}?{}", self.base_url, query_string(params));
        debug!("NewsAPI request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.json::<ErrorResponse>().await.ok();
            let message = detail
                .and_then(|d| d.message.or(d.code))
                .unwrap_or_else(|| "no details".to_string());
            if status.as_u16() == 401 {
                warn!("NewsAPI authentication failed, check the API key");
            } else if status.as_u16() == 429 {
                warn!("NewsAPI quota exhausted");
            }
            return Err(ContextError::provider(
                PROVIDER,
                format!("NewsAPI returned status {status}: {message}"),
            ));
        }

        let body: ArticlesResponse = response.json().await?;
        Ok(body.articles)
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    #[instrument(skip(self))]
    async fn fetch_top(&self, filters: &NewsFilters) -> Result<Vec<Article>> {
        let params = [
            (
                "country",
                Some(filters.country.clone().unwrap_or_else(|| self.country.clone())),
            ),
            (
                "category",
                Some(filters.category.clone().unwrap_or_else(|| self.category.clone())),
            ),
            ("pageSize", filters.page_size.map(|n| n.to_string())),
        ];

        let articles = process_articles(self.get_articles("top-headlines", &params).await?, false);
        info!("Got {} top headlines", articles.len());
        Ok(articles)
    }

    #[instrument(skip(self, location), fields(city = %location.address.city))]
    async fn fetch_local(
        &self,
        location: &Location,
        filters: &NewsFilters,
    ) -> Result<Vec<Article>> {
        let place = local_query(location);
        let domains = filters
            .domains
            .clone()
            .unwrap_or_else(|| local_domains(location).to_string());

        let params = [
            (
                "q",
                Some(format!("\"{place}\" OR \"{place} news\" OR \"{place} local\"")),
            ),
            (
                "from",
                Some(from_date(filters.days_back.unwrap_or(DEFAULT_LOCAL_DAYS))),
            ),
            (
                "sortBy",
                Some(filters.sort_by.clone().unwrap_or_else(|| "publishedAt".to_string())),
            ),
            ("language", Some("en".to_string())),
            ("pageSize", filters.page_size.map(|n| n.to_string())),
            ("domains", Some(domains)),
        ];

        let articles = process_articles(self.get_articles("everything", &params).await?, true);
        info!("Got {} local articles for {}", articles.len(), place);
        Ok(articles)
    }

    #[instrument(skip(self))]
    async fn fetch_topic(&self, topic: &str, filters: &NewsFilters) -> Result<Vec<Article>> {
        let params = [
            ("q", Some(topic.to_string())),
            (
                "from",
                Some(from_date(filters.days_back.unwrap_or(DEFAULT_TOPIC_DAYS))),
            ),
            (
                "sortBy",
                Some(filters.sort_by.clone().unwrap_or_else(|| "popularity".to_string())),
            ),
            ("language", Some("en".to_string())),
            (
                "pageSize",
                Some(filters.page_size.unwrap_or(DEFAULT_TOPIC_PAGE_SIZE).to_string()),
            ),
            ("domains", filters.domains.clone()),
        ];

        let articles = process_articles(self.get_articles("everything", &params).await?, false);
        info!("Got {} articles for topic", articles.len());
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Address;

    fn raw(title: Option<&str>, description: Option<&str>) -> RawArticle {
        RawArticle {
            source: Some(RawSource {
                name: Some("Wire".to_string()),
            }),
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            url: None,
            published_at: None,
        }
    }

    #[test]
    fn test_process_drops_incomplete_articles() {
        let articles = process_articles(
            vec![
                raw(Some("Market rallies"), Some("Stocks rose today.")),
                raw(None, Some("No title")),
                raw(Some("No description"), None),
                raw(Some("[Removed]"), Some("Removed article")),
            ],
            true,
        );

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "Wire-0");
        assert_eq!(articles[0].category, "Business");
        assert!(articles[0].is_local);
    }

    #[test]
    fn test_local_query_and_domains() {
        let mut location = Location::from_fix(22.3, 114.2, 10.0);
        assert_eq!(local_query(&location), DEFAULT_LOCAL_QUERY);

        location.address = Address::new("Kowloon City", "Kowloon", "Hong Kong SAR", "");
        assert_eq!(local_query(&location), "Kowloon City");
        assert!(local_domains(&location).contains("scmp.com"));

        location.address = Address::fallback_for(48.85, 2.35);
        assert_eq!(local_query(&location), DEFAULT_LOCAL_QUERY);
        assert!(local_domains(&location).contains("reuters.com"));
    }

    #[test]
    fn test_query_string_skips_unset_and_encodes() {
        let query = query_string(&[
            ("q", Some("\"Hong Kong\" OR AI".to_string())),
            ("domains", None),
            ("pageSize", Some("3".to_string())),
        ]);
        assert_eq!(query, "q=%22Hong%20Kong%22%20OR%20AI&pageSize=3");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let provider = NewsApiProvider::new(&NewsConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..NewsConfig::default()
        })
        .unwrap();

        let err = provider
            .fetch_top(&NewsFilters::with_page_size(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::Provider { provider: "news", .. }));
    }
}
