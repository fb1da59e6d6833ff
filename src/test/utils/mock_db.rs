use crate::db::DatabaseTrait;
use crate::error::AppError;
use crate::telemetry::{ds::Document, settings::merge_partial};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::trace;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    readings: Vec<(i64, i64, Document)>, // (id, timestamp_ms, doc)
    settings: Option<Document>,
    settings_writes: usize,
}

/// In-memory document store with the same ordering and merge rules as the
/// SQLite one.
#[derive(Clone, Debug, Default)]
pub struct MockDatabase {
    inner: Arc<Mutex<Inner>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored reading documents in insertion order, without `_id`.
    pub fn readings(&self) -> Vec<Document> {
        self.inner.lock().unwrap().readings.iter().map(|(_, _, doc)| doc.clone()).collect()
    }

    pub fn stored_settings(&self) -> Option<Document> {
        self.inner.lock().unwrap().settings.clone()
    }

    pub fn settings_writes(&self) -> usize {
        self.inner.lock().unwrap().settings_writes
    }
}

fn with_id(mut doc: Document, id: i64) -> Document {
    doc.insert("_id".to_owned(), serde_json::Value::String(id.to_string()));
    doc
}

#[async_trait]
impl DatabaseTrait for MockDatabase {
    async fn insert_reading(&self, doc: Document, timestamp_ms: i64) -> Result<Document, AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        trace!(id, timestamp_ms, "Mock insert reading");
        inner.readings.push((id, timestamp_ms, doc.clone()));
        Ok(with_id(doc, id))
    }

    async fn recent_readings(&self, limit: usize) -> Result<Vec<Document>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<_> = inner.readings.iter().collect();
        rows.sort_by(|a, b| (b.1, b.0).cmp(&(a.1, a.0)));
        Ok(rows.into_iter().take(limit).map(|(id, _, doc)| with_id(doc.clone(), *id)).collect())
    }

    async fn find_settings(&self) -> Result<Option<Document>, AppError> {
        Ok(self.inner.lock().unwrap().settings.clone())
    }

    async fn upsert_settings(&self, partial: Document) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        trace!(keys = partial.len(), "Mock upsert settings");
        inner.settings = Some(merge_partial(inner.settings.take(), &partial));
        inner.settings_writes += 1;
        Ok(())
    }
}
