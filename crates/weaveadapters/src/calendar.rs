use crate::support::{action, object, opt_str, require_str, unsupported, SeededStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "calendar-store";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEvent {
    id: String,
    title: String,
    start: String,
    end: Option<String>,
    location: Option<String>,
}

struct CalendarState {
    events: Vec<CalendarEvent>,
    next_event: u32,
}

fn seed() -> CalendarState {
    let event = |id: &str, title: &str, start: &str, end: &str| CalendarEvent {
        id: id.to_string(),
        title: title.to_string(),
        start: start.to_string(),
        end: Some(end.to_string()),
        location: None,
    };
    CalendarState {
        events: vec![
            event("event-1", "Team standup", "2026-09-01T09:00:00Z", "2026-09-01T09:15:00Z"),
            event("event-2", "Quarterly planning", "2026-09-02T14:00:00Z", "2026-09-02T16:00:00Z"),
            event("event-3", "Customer demo", "2026-09-04T11:00:00Z", "2026-09-04T12:00:00Z"),
        ],
        next_event: 4,
    }
}

enum CalendarAction {
    ListEvents,
    AddEvent,
    DeleteEvent,
}

/// Calendar events over a seeded local store
pub struct CalendarAdapter {
    store: SeededStore<CalendarState>,
}

impl CalendarAdapter {
    pub fn new() -> Self {
        Self {
            store: SeededStore::new(),
        }
    }
}

impl Default for CalendarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationAdapter for CalendarAdapter {
    fn id(&self) -> &str {
        "calendar"
    }

    fn name(&self) -> &str {
        "Calendar"
    }

    fn description(&self) -> &str {
        "List, add and delete calendar events"
    }

    fn category(&self) -> &str {
        "productivity"
    }

    fn keywords(&self) -> &[&str] {
        &["calendar", "schedule", "meeting", "event", "appointment", "book"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let parsed = match action(&input).unwrap_or("list-events") {
            "list-events" => CalendarAction::ListEvents,
            "add-event" => CalendarAction::AddEvent,
            "delete-event" => CalendarAction::DeleteEvent,
            other => return unsupported(SOURCE, other),
        };

        self.store.with(seed, |state| match parsed {
            CalendarAction::ListEvents => IntegrationResult::ok(
                SOURCE,
                object(json!({ "events": state.events, "count": state.events.len() })),
            ),
            CalendarAction::AddEvent => {
                let title = match require_str(&input, "title") {
                    Ok(title) => title,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let start = match require_str(&input, "start") {
                    Ok(start) => start,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let event = CalendarEvent {
                    id: format!("event-{}", state.next_event),
                    title: title.to_string(),
                    start: start.to_string(),
                    end: opt_str(&input, "end").map(str::to_string),
                    location: opt_str(&input, "location").map(str::to_string),
                };
                state.next_event += 1;
                state.events.push(event.clone());
                IntegrationResult::ok(SOURCE, object(json!({ "event": event })))
            }
            CalendarAction::DeleteEvent => {
                let id = match require_str(&input, "id") {
                    Ok(id) => id,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let before = state.events.len();
                state.events.retain(|e| e.id != id);
                if state.events.len() == before {
                    IntegrationResult::fail(SOURCE, "Event not found")
                } else {
                    IntegrationResult::ok(SOURCE, object(json!({ "deleted": id })))
                }
            }
        })
    }
}
