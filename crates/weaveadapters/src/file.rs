use crate::support::{action, object, post_json, require_str, unsupported};
use crate::ServiceConfig;
use async_trait::async_trait;
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "file-service";

enum FileAction {
    List,
    Read,
    Write,
}

/// File operations through the workspace file service
pub struct FileAdapter {
    endpoint: String,
    client: reqwest::Client,
}

impl FileAdapter {
    pub fn new(config: &ServiceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            endpoint: config.endpoint("/fs"),
            client: config.client()?,
        })
    }
}

#[async_trait]
impl IntegrationAdapter for FileAdapter {
    fn id(&self) -> &str {
        "file"
    }

    fn name(&self) -> &str {
        "File Access"
    }

    fn description(&self) -> &str {
        "List, read and write files in the managed workspace"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn requires_auth(&self) -> bool {
        true
    }

    fn keywords(&self) -> &[&str] {
        &["file", "directory", "folder", "save", "document", "write", "read"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let parsed = match action(&input).unwrap_or("list") {
            "list" => FileAction::List,
            "read" => FileAction::Read,
            "write" => FileAction::Write,
            other => return unsupported(SOURCE, other),
        };

        let path = match require_str(&input, "path") {
            Ok(path) => path,
            Err(reason) => return IntegrationResult::fail(SOURCE, reason),
        };

        let payload = match parsed {
            FileAction::List => json!({ "action": "list", "path": path }),
            FileAction::Read => json!({ "action": "read", "path": path }),
            FileAction::Write => {
                let content = match require_str(&input, "content") {
                    Ok(content) => content,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                json!({ "action": "write", "path": path, "content": content })
            }
        };

        match post_json(&self.client, &self.endpoint, payload).await {
            Ok(body) => IntegrationResult::ok(
                SOURCE,
                match body {
                    serde_json::Value::Object(map) => map,
                    other => object(json!({ "result": other })),
                },
            ),
            Err(error) => IntegrationResult::fail(SOURCE, error.to_string()),
        }
    }
}
