use crate::support::{object, post_json, require_str};
use crate::ServiceConfig;
use async_trait::async_trait;
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "shell-exec";

/// Run a shell command through the sandboxed execution service
///
/// A non-zero exit code is still a successful adapter call; the exit code
/// is data for the consuming step to interpret.
pub struct ShellAdapter {
    endpoint: String,
    client: reqwest::Client,
}

impl ShellAdapter {
    pub fn new(config: &ServiceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            endpoint: config.endpoint("/exec"),
            client: config.client()?,
        })
    }
}

#[async_trait]
impl IntegrationAdapter for ShellAdapter {
    fn id(&self) -> &str {
        "shell"
    }

    fn name(&self) -> &str {
        "Shell Execution"
    }

    fn description(&self) -> &str {
        "Execute a shell command and capture stdout, stderr and exit code"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn requires_auth(&self) -> bool {
        true
    }

    fn keywords(&self) -> &[&str] {
        &["shell", "command", "terminal", "script", "execute", "bash"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let command = match require_str(&input, "command") {
            Ok(command) => command,
            Err(reason) => return IntegrationResult::fail(SOURCE, reason),
        };

        tracing::debug!(%command, "Shell exec");
        match post_json(&self.client, &self.endpoint, json!({ "command": command })).await {
            Ok(body) => IntegrationResult::ok(
                SOURCE,
                object(json!({
                    "stdout": body.get("stdout").cloned().unwrap_or_default(),
                    "stderr": body.get("stderr").cloned().unwrap_or_default(),
                    "exitCode": body.get("exitCode").cloned().unwrap_or_else(|| json!(-1)),
                })),
            )
            .with_raw(body),
            Err(error) => IntegrationResult::fail(SOURCE, error.to_string()),
        }
    }
}
