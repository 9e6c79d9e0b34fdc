use crate::support::{object, opt_u64, post_json, require_str};
use crate::ServiceConfig;
use async_trait::async_trait;
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "web-search-api";

/// Live web search via the search service endpoint
pub struct WebSearchAdapter {
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearchAdapter {
    pub fn new(config: &ServiceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            endpoint: config.endpoint("/search"),
            client: config.client()?,
        })
    }
}

#[async_trait]
impl IntegrationAdapter for WebSearchAdapter {
    fn id(&self) -> &str {
        "web-search"
    }

    fn name(&self) -> &str {
        "Web Search"
    }

    fn description(&self) -> &str {
        "Search the web and return ranked results"
    }

    fn category(&self) -> &str {
        "research"
    }

    fn keywords(&self) -> &[&str] {
        &["search", "web", "google", "find", "lookup", "research", "news"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let query = match require_str(&input, "query") {
            Ok(query) => query,
            Err(reason) => return IntegrationResult::fail(SOURCE, reason),
        };
        let limit = opt_u64(&input, "limit").unwrap_or(5);

        tracing::debug!(%query, limit, "Web search");
        match post_json(
            &self.client,
            &self.endpoint,
            json!({ "query": query, "limit": limit }),
        )
        .await
        {
            Ok(body) => {
                let results = body.get("results").cloned().unwrap_or_else(|| json!([]));
                let count = results.as_array().map(|r| r.len()).unwrap_or(0);
                IntegrationResult::ok(
                    SOURCE,
                    object(json!({ "query": query, "results": results, "count": count })),
                )
                .with_raw(body)
            }
            Err(error) => IntegrationResult::fail(SOURCE, error.to_string()),
        }
    }
}
