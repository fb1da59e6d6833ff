use crate::time::TimeProvider;
use chrono::TimeZone;
use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};
use tracing_subscriber::fmt::time::FormatTime;

/// Clock frozen at a chosen Unix millisecond until advanced.
#[derive(Debug)]
pub struct MockTimeProvider {
    current_time: Arc<AtomicI64>,
}

impl MockTimeProvider {
    pub fn new(start_time: i64) -> Self {
        Self { current_time: Arc::new(AtomicI64::new(start_time)) }
    }

    pub fn advance_time(&self, millis: i64) {
        self.current_time.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, new_time: i64) {
        self.current_time.store(new_time, Ordering::SeqCst)
    }
}

impl TimeProvider for MockTimeProvider {
    fn now(&self) -> i64 {
        self.current_time.load(Ordering::SeqCst)
    }
}

/// Log timestamps taken from an injected clock.
pub struct MockTimeFormatter {
    pub time_provider: Arc<dyn TimeProvider>,
}

impl FormatTime for MockTimeFormatter {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let mock_time = self.time_provider.now();
        match chrono::Utc.timestamp_millis_opt(mock_time).single() {
            Some(time) => write!(w, "{}", time.to_rfc3339()),
            None => write!(w, "{}", mock_time),
        }
    }
}
