use crate::support::{object, post_json, require_str};
use crate::ServiceConfig;
use async_trait::async_trait;
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "web-scraper";

/// Fetch and extract the readable content of a web page
pub struct WebScrapeAdapter {
    endpoint: String,
    client: reqwest::Client,
}

impl WebScrapeAdapter {
    pub fn new(config: &ServiceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            endpoint: config.endpoint("/scrape"),
            client: config.client()?,
        })
    }
}

#[async_trait]
impl IntegrationAdapter for WebScrapeAdapter {
    fn id(&self) -> &str {
        "web-scrape"
    }

    fn name(&self) -> &str {
        "Web Scraper"
    }

    fn description(&self) -> &str {
        "Extract title, text content and word count from a URL"
    }

    fn category(&self) -> &str {
        "research"
    }

    fn keywords(&self) -> &[&str] {
        &["scrape", "extract", "page", "url", "website", "crawl", "read"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let url = match require_str(&input, "url") {
            Ok(url) => url,
            Err(reason) => return IntegrationResult::fail(SOURCE, reason),
        };
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return IntegrationResult::fail(SOURCE, format!("Invalid URL: {}", url));
        }

        match post_json(&self.client, &self.endpoint, json!({ "url": url })).await {
            // Service responds { url, title, content, wordCount }
            Ok(body) => IntegrationResult::ok(
                SOURCE,
                object(json!({
                    "url": body.get("url").cloned().unwrap_or_else(|| json!(url)),
                    "title": body.get("title").cloned().unwrap_or_default(),
                    "content": body.get("content").cloned().unwrap_or_default(),
                    "wordCount": body.get("wordCount").cloned().unwrap_or_else(|| json!(0)),
                })),
            )
            .with_raw(body),
            Err(error) => IntegrationResult::fail(SOURCE, error.to_string()),
        }
    }
}
