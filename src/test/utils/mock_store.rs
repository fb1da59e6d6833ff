use crate::db::DatabaseTrait;
use crate::error::AppError;
use crate::telemetry::ds::Document;
use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Store {}

    #[async_trait]
    impl DatabaseTrait for Store {
        async fn insert_reading(&self, doc: Document, timestamp_ms: i64) -> Result<Document, AppError>;
        async fn recent_readings(&self, limit: usize) -> Result<Vec<Document>, AppError>;
        async fn find_settings(&self) -> Result<Option<Document>, AppError>;
        async fn upsert_settings(&self, partial: Document) -> Result<(), AppError>;
    }
}

fn unavailable(msg: &str) -> AppError {
    AppError::StoreUnavailable(msg.to_owned())
}

/// Every operation fails with `msg`.
pub fn set_failing_store(msg: &'static str) -> Arc<MockStore> {
    let mut store = MockStore::new();
    store.expect_insert_reading().times(0..).returning(move |_, _| Err(unavailable(msg)));
    store.expect_recent_readings().times(0..).returning(move |_| Err(unavailable(msg)));
    store.expect_find_settings().times(0..).returning(move || Err(unavailable(msg)));
    store.expect_upsert_settings().times(0..).returning(move |_| Err(unavailable(msg)));
    Arc::new(store)
}

/// Readings are accepted, the settings write fails.
pub fn set_settings_failing_store(msg: &'static str) -> Arc<MockStore> {
    let mut store = MockStore::new();
    store.expect_insert_reading().times(1).returning(|doc, _| Ok(doc));
    store.expect_upsert_settings().times(1).returning(move |_| Err(unavailable(msg)));
    Arc::new(store)
}
