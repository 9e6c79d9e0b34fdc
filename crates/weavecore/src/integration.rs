use crate::JsonMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Normalized result of one adapter operation
///
/// Adapters never return `Err` for expected failure conditions; they set
/// `success: false` with a reason so the caller can fail the step cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResult {
    pub success: bool,
    #[serde(default)]
    pub data: JsonMap,
    /// Adapter-specific provenance, e.g. a backend name
    pub source: String,
    /// Raw upstream response, kept for debugging only
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl IntegrationResult {
    pub fn ok(source: impl Into<String>, data: JsonMap) -> Self {
        Self {
            success: true,
            data,
            source: source.into(),
            raw: None,
            error: None,
        }
    }

    pub fn fail(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: JsonMap::new(),
            source: source.into(),
            raw: None,
            error: Some(error.into()),
        }
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Uniform capability plugin behind the execute contract
///
/// Adapters are long-lived and shared across concurrent workflow runs; any
/// adapter holding local state must serialize its own read-modify-write.
#[async_trait]
pub trait IntegrationAdapter: Send + Sync {
    /// Stable identifier referenced by node `integrationId` fields
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn category(&self) -> &str;

    fn requires_auth(&self) -> bool {
        false
    }

    /// Static keywords used for advisory free-text matching
    fn keywords(&self) -> &[&str];

    /// Cheap connectivity probe, no I/O
    fn is_connected(&self) -> bool {
        true
    }

    /// Perform one operation; the only method that does I/O
    async fn execute(&self, input: JsonMap) -> IntegrationResult;
}
