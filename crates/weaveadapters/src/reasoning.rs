use async_trait::async_trait;
use weavecore::{CompletionRequest, ModelError, ReasoningClient};

/// HTTP client for the reasoning-model collaborator
///
/// Posts the completion request as camelCase JSON and returns the response
/// body verbatim; the step executor owns all parsing of that text.
pub struct HttpReasoningClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpReasoningClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: std::time::Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Endpoint from `WEAVE_MODEL_URL`, defaulting to the local collaborator
    pub fn from_env() -> reqwest::Result<Self> {
        let endpoint = std::env::var("WEAVE_MODEL_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8630/complete".to_string());
        Self::new(endpoint, std::time::Duration::from_secs(60))
    }
}

#[async_trait]
impl ReasoningClient for HttpReasoningClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(ModelError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
