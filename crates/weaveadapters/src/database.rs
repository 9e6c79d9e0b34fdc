use crate::support::{action, object, opt_str, require_str, unsupported, SeededStore};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "local-db";

// BTreeMap keeps table listings deterministic
type Tables = BTreeMap<String, Vec<JsonMap>>;

fn seed() -> Tables {
    let row = |value: serde_json::Value| match value {
        serde_json::Value::Object(map) => map,
        _ => JsonMap::new(),
    };
    let mut tables = Tables::new();
    tables.insert(
        "customers".to_string(),
        vec![
            row(json!({ "id": 1, "name": "Acme Corp", "region": "west", "mrr": 2000 })),
            row(json!({ "id": 2, "name": "Globex", "region": "east", "mrr": 450 })),
            row(json!({ "id": 3, "name": "Initech", "region": "west", "mrr": 4000 })),
        ],
    );
    tables.insert(
        "orders".to_string(),
        vec![
            row(json!({ "id": 101, "customerId": 1, "total": 240.0, "status": "shipped" })),
            row(json!({ "id": 102, "customerId": 3, "total": 1200.0, "status": "pending" })),
        ],
    );
    tables
}

enum DbAction {
    ListTables,
    Query,
    Insert,
}

/// Queryable local tables seeded with demo rows
pub struct DatabaseAdapter {
    store: SeededStore<Tables>,
}

impl DatabaseAdapter {
    pub fn new() -> Self {
        Self {
            store: SeededStore::new(),
        }
    }
}

impl Default for DatabaseAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationAdapter for DatabaseAdapter {
    fn id(&self) -> &str {
        "database"
    }

    fn name(&self) -> &str {
        "Database"
    }

    fn description(&self) -> &str {
        "Query and insert rows in local demo tables"
    }

    fn category(&self) -> &str {
        "data"
    }

    fn keywords(&self) -> &[&str] {
        &["database", "table", "query", "sql", "rows", "records", "data"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let parsed = match action(&input).unwrap_or("list-tables") {
            "list-tables" => DbAction::ListTables,
            "query" => DbAction::Query,
            "insert" => DbAction::Insert,
            other => return unsupported(SOURCE, other),
        };

        self.store.with(seed, |tables| match parsed {
            DbAction::ListTables => {
                let names: Vec<&String> = tables.keys().collect();
                IntegrationResult::ok(
                    SOURCE,
                    object(json!({ "tables": names, "count": names.len() })),
                )
            }
            DbAction::Query => {
                let table = match require_str(&input, "table") {
                    Ok(table) => table,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let Some(rows) = tables.get(table) else {
                    return IntegrationResult::fail(SOURCE, format!("Table not found: {}", table));
                };
                // Optional equality filter on one column
                let filtered: Vec<&JsonMap> = match (opt_str(&input, "column"), input.get("value")) {
                    (Some(column), Some(value)) => {
                        rows.iter().filter(|r| r.get(column) == Some(value)).collect()
                    }
                    _ => rows.iter().collect(),
                };
                IntegrationResult::ok(
                    SOURCE,
                    object(json!({ "table": table, "rows": filtered, "count": filtered.len() })),
                )
            }
            DbAction::Insert => {
                let table = match require_str(&input, "table") {
                    Ok(table) => table,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let Some(serde_json::Value::Object(row)) = input.get("row") else {
                    return IntegrationResult::fail(SOURCE, "Missing required field: row");
                };
                let rows = tables.entry(table.to_string()).or_default();
                rows.push(row.clone());
                IntegrationResult::ok(
                    SOURCE,
                    object(json!({ "table": table, "inserted": row, "count": rows.len() })),
                )
            }
        })
    }
}
