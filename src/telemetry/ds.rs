use crate::{db::connection::ConnectionManager, db::DatabaseTrait, error::AppError, time::TimeProvider};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// A schema-less JSON object as it crosses the HTTP and store boundaries.
pub type Document = serde_json::Map<String, Value>;

/// Storage key of the settings singleton.
pub const SETTINGS_KEY: &str = "singleton";

/// Typed view of a stored reading. Every measurement keeps the raw JSON value
/// so an explicit `null` stays distinct from a missing key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub moisture: Option<Value>,
    pub pump_status: Option<Value>,
    pub system_status: Option<Value>,
    pub threshold: Option<Value>,
    pub temperature: Option<Value>,
    pub humidity: Option<Value>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&Document> for Reading {
    fn from(doc: &Document) -> Self {
        Self {
            moisture: doc.get("moisture").cloned(),
            pump_status: doc.get("pumpStatus").cloned(),
            system_status: doc.get("systemStatus").cloned(),
            threshold: doc.get("threshold").cloned(),
            temperature: doc.get("temperature").cloned(),
            humidity: doc.get("humidity").cloned(),
            timestamp: doc.get("timestamp").and_then(parse_timestamp),
        }
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().map(crate::time::from_millis),
        _ => None,
    }
}

pub struct AppState {
    pub store: ConnectionManager,
    pub time_provider: Arc<dyn TimeProvider>,
}

impl AppState {
    pub fn new(store: ConnectionManager, time_provider: Arc<dyn TimeProvider>) -> Arc<Self> {
        Arc::new(AppState { store, time_provider })
    }

    pub async fn db(&self) -> Result<Arc<dyn DatabaseTrait>, AppError> {
        self.store.get_handle().await
    }
}
