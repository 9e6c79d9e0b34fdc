//! Shared plumbing for adapter implementations

use std::fmt;
use std::sync::Mutex;
use weavecore::JsonMap;

/// The dispatch key adapters switch on; `None` means the caller omitted it
/// and the adapter should run its safe default read.
pub(crate) fn action(input: &JsonMap) -> Option<&str> {
    input.get("action").and_then(|v| v.as_str())
}

pub(crate) fn require_str<'a>(input: &'a JsonMap, key: &str) -> Result<&'a str, String> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required field: {}", key))
}

pub(crate) fn opt_str<'a>(input: &'a JsonMap, key: &str) -> Option<&'a str> {
    input.get(key).and_then(|v| v.as_str())
}

pub(crate) fn opt_u64(input: &JsonMap, key: &str) -> Option<u64> {
    input.get(key).and_then(|v| v.as_u64())
}

pub(crate) fn unsupported(source: &str, action: &str) -> weavecore::IntegrationResult {
    weavecore::IntegrationResult::fail(source, format!("Unsupported action: {}", action))
}

/// Convert a `json!` object literal into the map adapters return as data
pub(crate) fn object(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

/// Lazily seeded local state behind a mutex
///
/// Stateful adapters seed deterministic demo data on first access and keep
/// mutations for the process lifetime. The mutex serializes every
/// read-modify-write so concurrent nodes hitting the same adapter never
/// interleave a write.
pub(crate) struct SeededStore<T> {
    inner: Mutex<Option<T>>,
}

impl<T> SeededStore<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    pub(crate) fn with<R>(&self, seed: impl FnOnce() -> T, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        f(guard.get_or_insert_with(seed))
    }
}

/// Why a call to a backing service produced no usable response
pub(crate) enum ServiceError {
    /// The request never completed (connect failure, timeout, ...)
    Transport(String),
    /// The service answered with a non-success status; body kept verbatim
    Status(u16, String),
    /// 2xx response that was not the JSON we expected
    Malformed(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Transport(e) => write!(f, "Request failed: {}", e),
            ServiceError::Status(code, body) => {
                write!(f, "Service returned {}: {}", code, body)
            }
            ServiceError::Malformed(e) => write!(f, "Invalid response from service: {}", e),
        }
    }
}

pub(crate) async fn post_json(
    client: &reqwest::Client,
    endpoint: &str,
    payload: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let response = client
        .post(endpoint)
        .json(&payload)
        .send()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(ServiceError::Status(status.as_u16(), text));
    }
    serde_json::from_str(&text).map_err(|e| ServiceError::Malformed(e.to_string()))
}
