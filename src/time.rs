use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::{
    fmt::Debug,
    sync::atomic::{AtomicI64, Ordering},
};

pub trait TimeProvider: Send + Sync + Debug {
    fn now(&self) -> i64; // Returns the current time as Unix UTC milliseconds

    fn now_utc(&self) -> DateTime<Utc> {
        from_millis(self.now())
    }
}

/// Wall clock that never hands out the same millisecond twice, so readings
/// stamped in a burst still sort strictly.
#[derive(Debug, Default)]
pub struct RealTimeProvider {
    last: AtomicI64,
}

impl RealTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> i64 {
        let wall = Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(wall.max(last + 1)))
            .unwrap_or(wall);
        wall.max(prev + 1)
    }
}

pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// `2024-05-01T10:00:00.000Z`
pub fn iso_millis(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
