//! The ThingSpeak-style feed shape the old dashboard still reads:
//! `field1..field6` as text plus `created_at`.

use super::{ds::Reading, CHANNEL_ID};
use crate::time::iso_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 500;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LegacyFeed {
    pub field1: Option<String>, // moisture
    pub field2: Option<String>, // pump status
    pub field3: Option<String>, // system status
    pub field4: Option<String>, // threshold
    pub field5: Option<String>, // temperature
    pub field6: Option<String>, // humidity
    pub created_at: String,
}

impl LegacyFeed {
    /// `now` stands in for `created_at` when the reading carries no timestamp.
    pub fn from_reading(reading: &Reading, now: DateTime<Utc>) -> Self {
        Self {
            field1: reading.moisture.as_ref().map(value_text),
            field2: Some(reading.pump_status.as_ref().map_or_else(|| "0".to_owned(), value_text)),
            field3: Some(reading.system_status.as_ref().map_or_else(|| "0".to_owned(), value_text)),
            field4: reading.threshold.as_ref().map(value_text),
            field5: reading.temperature.as_ref().map(value_text),
            field6: reading.humidity.as_ref().map(value_text),
            created_at: iso_millis(reading.timestamp.unwrap_or(now)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeedResponse {
    pub channel: Channel,
    pub feeds: Vec<LegacyFeed>,
}

impl FeedResponse {
    pub fn new(feeds: Vec<LegacyFeed>) -> Self {
        Self { channel: Channel { id: CHANNEL_ID.to_owned() }, feeds }
    }
}

/// Text rendering of a stored value as the dashboard expects it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => float_text(f),
            _ => n.to_string(),
        },
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn float_text(f: f64) -> String {
    if f == 0.0 {
        "0".to_owned()
    } else if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

/// Leading-integer parse of the raw `limit` query value. Missing, empty or
/// non-numeric input gives the default.
pub fn parse_limit(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return DEFAULT_LIMIT;
    };
    let text = raw.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits: &str = &digits[..digits.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return DEFAULT_LIMIT;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_LIMIT, MAX_LIMIT) as usize
}
