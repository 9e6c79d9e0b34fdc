use crate::support::{object, post_json, require_str, ServiceError};
use crate::ServiceConfig;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "email-gateway";
const SIMULATED_SOURCE: &str = "email-simulated";

/// Send email through the mail gateway, with a simulated local send when
/// the gateway is unreachable so workflows keep moving without transport.
pub struct EmailAdapter {
    endpoint: String,
    client: reqwest::Client,
    sequence: AtomicU64,
}

impl EmailAdapter {
    pub fn new(config: &ServiceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            endpoint: config.endpoint("/email"),
            client: config.client()?,
            sequence: AtomicU64::new(1),
        })
    }

    fn simulated_send(&self, to: &str, subject: &str) -> IntegrationResult {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        IntegrationResult::ok(
            SIMULATED_SOURCE,
            object(json!({
                "messageId": format!("sim-{}", id),
                "to": to,
                "subject": subject,
                "delivered": false,
                "simulated": true,
            })),
        )
    }
}

#[async_trait]
impl IntegrationAdapter for EmailAdapter {
    fn id(&self) -> &str {
        "email"
    }

    fn name(&self) -> &str {
        "Email"
    }

    fn description(&self) -> &str {
        "Send an email via the configured mail gateway"
    }

    fn category(&self) -> &str {
        "communication"
    }

    fn requires_auth(&self) -> bool {
        true
    }

    fn keywords(&self) -> &[&str] {
        &["email", "mail", "send", "message", "inbox", "notify"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let to = match require_str(&input, "to") {
            Ok(to) => to,
            Err(reason) => return IntegrationResult::fail(SOURCE, reason),
        };
        let subject = match require_str(&input, "subject") {
            Ok(subject) => subject,
            Err(reason) => return IntegrationResult::fail(SOURCE, reason),
        };
        let body = input.get("body").and_then(|v| v.as_str()).unwrap_or("");

        match post_json(
            &self.client,
            &self.endpoint,
            json!({ "to": to, "subject": subject, "body": body }),
        )
        .await
        {
            Ok(response) => IntegrationResult::ok(
                SOURCE,
                object(json!({
                    "messageId": response.get("messageId").cloned().unwrap_or_default(),
                    "to": to,
                    "subject": subject,
                    "delivered": true,
                })),
            )
            .with_raw(response),
            // Gateway rejected the send: surface its answer verbatim
            Err(error @ ServiceError::Status(..)) => {
                IntegrationResult::fail(SOURCE, error.to_string())
            }
            Err(error @ ServiceError::Malformed(_)) => {
                IntegrationResult::fail(SOURCE, error.to_string())
            }
            // Gateway unreachable: degrade to a simulated send
            Err(ServiceError::Transport(reason)) => {
                tracing::warn!(%reason, "Mail gateway unreachable, simulating send");
                self.simulated_send(to, subject)
            }
        }
    }
}
