use crate::support::{action, object, opt_str, require_str, unsupported, SeededStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "notification-store";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Notification {
    id: String,
    channel: String,
    message: String,
}

struct NotifyState {
    notifications: Vec<Notification>,
    next: u32,
}

fn seed() -> NotifyState {
    NotifyState {
        notifications: vec![Notification {
            id: "notice-1".to_string(),
            channel: "system".to_string(),
            message: "Workspace provisioned".to_string(),
        }],
        next: 2,
    }
}

enum NotifyAction {
    List,
    Send,
}

/// In-process notification feed
pub struct NotificationAdapter {
    store: SeededStore<NotifyState>,
}

impl NotificationAdapter {
    pub fn new() -> Self {
        Self {
            store: SeededStore::new(),
        }
    }
}

impl Default for NotificationAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationAdapter for NotificationAdapter {
    fn id(&self) -> &str {
        "notification"
    }

    fn name(&self) -> &str {
        "Notifications"
    }

    fn description(&self) -> &str {
        "Send and list in-app notifications"
    }

    fn category(&self) -> &str {
        "communication"
    }

    fn keywords(&self) -> &[&str] {
        &["notification", "alert", "ping", "remind", "broadcast"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let parsed = match action(&input).unwrap_or("list") {
            "list" => NotifyAction::List,
            "send" => NotifyAction::Send,
            other => return unsupported(SOURCE, other),
        };

        self.store.with(seed, |state| match parsed {
            NotifyAction::List => IntegrationResult::ok(
                SOURCE,
                object(json!({
                    "notifications": state.notifications,
                    "count": state.notifications.len(),
                })),
            ),
            NotifyAction::Send => {
                let message = match require_str(&input, "message") {
                    Ok(message) => message,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let notification = Notification {
                    id: format!("notice-{}", state.next),
                    channel: opt_str(&input, "channel").unwrap_or("general").to_string(),
                    message: message.to_string(),
                };
                state.next += 1;
                state.notifications.push(notification.clone());
                IntegrationResult::ok(SOURCE, object(json!({ "notification": notification })))
            }
        })
    }
}
