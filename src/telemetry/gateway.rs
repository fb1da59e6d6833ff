use super::{
    ds::{Document, Reading},
    legacy::{FeedResponse, LegacyFeed},
    settings::{ingest_settings_update, with_defaults},
};
use crate::{db::DatabaseTrait, error::AppError, time::iso_millis, time::TimeProvider};
use serde_json::Value;
use tracing::debug;

/// Stores one reading stamped with server time, then folds `threshold` /
/// `systemStatus` into the settings singleton. The two writes are
/// independent: a failed settings write leaves the reading in place.
pub async fn ingest(db: &dyn DatabaseTrait, clock: &dyn TimeProvider, payload: Document) -> Result<(), AppError> {
    let settings_update = ingest_settings_update(&payload);

    let timestamp_ms = clock.now();
    let mut doc = payload;
    doc.insert("timestamp".to_owned(), Value::String(iso_millis(crate::time::from_millis(timestamp_ms))));
    db.insert_reading(doc, timestamp_ms).await?;

    if let Some(update) = settings_update {
        debug!(keys = ?update.keys().collect::<Vec<_>>(), "Folding telemetry into settings.");
        db.upsert_settings(update).await?;
    }
    Ok(())
}

/// Newest `limit` readings in the legacy feed shape. `limit` is expected to
/// be clamped already.
pub async fn list_recent(db: &dyn DatabaseTrait, clock: &dyn TimeProvider, limit: usize) -> Result<FeedResponse, AppError> {
    let docs = db.recent_readings(limit).await?;
    let now = clock.now_utc();
    let feeds = docs.iter().map(|doc| LegacyFeed::from_reading(&Reading::from(doc), now)).collect();
    Ok(FeedResponse::new(feeds))
}

pub async fn latest(db: &dyn DatabaseTrait) -> Result<Option<Document>, AppError> {
    Ok(db.recent_readings(1).await?.into_iter().next())
}

/// Defaults are merged at read time only and never written back.
pub async fn current_settings(db: &dyn DatabaseTrait) -> Result<Document, AppError> {
    Ok(with_defaults(db.find_settings().await?))
}

pub async fn update_settings(db: &dyn DatabaseTrait, partial: Document) -> Result<(), AppError> {
    db.upsert_settings(partial).await
}
