pub mod mock_db;
pub mod mock_store;
pub mod mock_time;

use crate::{
    db::{connection::ConnectionManager, DatabaseTrait},
    telemetry::ds::AppState,
};
use mock_db::MockDatabase;
use mock_store::set_failing_store;
use mock_time::MockTimeProvider;
use std::sync::Arc;

pub type MockAppState = Arc<AppState>;

pub fn new_with_store(db: Arc<dyn DatabaseTrait>, time_provider: Arc<MockTimeProvider>) -> MockAppState {
    AppState::new(ConnectionManager::with_handle(db), time_provider)
}

pub fn set_app_state(start_time: i64) -> (MockAppState, Arc<MockDatabase>, Arc<MockTimeProvider>) {
    let db = Arc::new(MockDatabase::new());
    let time_provider = Arc::new(MockTimeProvider::new(start_time));
    (new_with_store(db.clone(), time_provider.clone()), db, time_provider)
}

pub fn set_failing_app_state(start_time: i64, msg: &'static str) -> MockAppState {
    let time_provider = Arc::new(MockTimeProvider::new(start_time));
    new_with_store(set_failing_store(msg), time_provider)
}
