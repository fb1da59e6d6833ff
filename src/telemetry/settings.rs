use super::ds::Document;
use serde_json::Value;

pub const DEFAULT_THRESHOLD: i64 = 250;
pub const DEFAULT_SYSTEM_STATUS: i64 = 0;

/// Keys a telemetry payload may fold into the settings singleton.
pub const INGEST_SETTINGS_KEYS: [&str; 2] = ["threshold", "systemStatus"];

pub fn default_settings() -> Document {
    let mut doc = Document::new();
    doc.insert("threshold".to_owned(), Value::from(DEFAULT_THRESHOLD));
    doc.insert("systemStatus".to_owned(), Value::from(DEFAULT_SYSTEM_STATUS));
    doc
}

/// Stored settings over the defaults. Only missing keys are filled; a stored
/// `null` wins over the default.
pub fn with_defaults(stored: Option<Document>) -> Document {
    let mut merged = default_settings();
    if let Some(stored) = stored {
        merged.extend(stored);
    }
    merged
}

/// Top-level `$set`: supplied keys replace, everything else stays.
pub fn merge_partial(existing: Option<Document>, partial: &Document) -> Document {
    let mut merged = existing.unwrap_or_default();
    for (key, value) in partial {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// The settings write implied by a telemetry payload, if any.
pub fn ingest_settings_update(payload: &Document) -> Option<Document> {
    let update: Document = INGEST_SETTINGS_KEYS
        .iter()
        .filter_map(|key| payload.get(*key).map(|value| ((*key).to_owned(), value.clone())))
        .collect();
    if update.is_empty() {
        None
    } else {
        Some(update)
    }
}
