//! Content fetching
//!
//! This module defines the `ContentFetcher` seam used by the crawler and its
//! HTTP implementation:
//! - Building the HTTP client with a proper user agent string
//! - GET requests for watch pages
//! - Error classification into `FetchError`

use crate::config::UserAgentConfig;
use crate::crawler::parser::parse_watch_page;
use crate::models::PageMetadata;
use crate::url::extract_video_id;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Fetches a page and returns its metadata and related candidates
///
/// Implementations must not retry forever; a failure is reported once and
/// the crawler moves on.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> FetchResult<PageMetadata>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Per-request timeout in seconds
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use vidcollector::config::UserAgentConfig;
/// use vidcollector::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "VidCollector".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout_secs: u64) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches watch pages over HTTP and parses them with `scraper`
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    client: Client,
}

impl HttpContentFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, locator: &str) -> FetchResult<PageMetadata> {
        let id = extract_video_id(locator)
            .ok_or_else(|| FetchError::InvalidLocator(locator.to_string()))?;
        let page_url =
            Url::parse(locator).map_err(|_| FetchError::InvalidLocator(locator.to_string()))?;

        let response = self
            .client
            .get(page_url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(locator, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: locator.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(locator, e))?;

        let page = parse_watch_page(&body, &page_url, &id);
        if page.title.is_empty() {
            return Err(FetchError::Parse {
                url: locator.to_string(),
                message: "page has no title".to_string(),
            });
        }

        tracing::debug!(
            "Fetched {} ({} related candidates)",
            locator,
            page.related.len()
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
        }
    }

    fn fetcher() -> HttpContentFetcher {
        HttpContentFetcher::new(build_http_client(&create_test_config(), 5).unwrap())
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, 30);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_watch_page() {
        let server = MockServer::start().await;
        let html = r#"<html><head><title>ویدیو فارسی</title>
            <meta name="description" content="توضیحات"></head>
            <body><a href="/watch?v=bbbbbbbbbbb" title="بعدی">next</a></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "aaaaaaaaaaa"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let locator = format!("{}/watch?v=aaaaaaaaaaa", server.uri());
        let page = fetcher().fetch(&locator).await.unwrap();

        assert_eq!(page.id, "aaaaaaaaaaa");
        assert_eq!(page.title, "ویدیو فارسی");
        assert_eq!(page.description, "توضیحات");
        assert_eq!(page.related.len(), 1);
        assert_eq!(
            page.related[0].locator,
            format!("{}/watch?v=bbbbbbbbbbb", server.uri())
        );
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let locator = format!("{}/watch?v=aaaaaaaaaaa", server.uri());
        let result = fetcher().fetch(&locator).await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_fetch_page_without_title() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let locator = format!("{}/watch?v=aaaaaaaaaaa", server.uri());
        let result = fetcher().fetch(&locator).await;

        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_fetch_invalid_locator() {
        let result = fetcher().fetch("https://www.youtube.com/feed/trending").await;
        assert!(matches!(result, Err(FetchError::InvalidLocator(_))));
    }
}
