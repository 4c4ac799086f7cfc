//! Temperature history samples.
//!
//! History is an ordered-by-time sequence of scalar samples that may
//! contain gaps. It is owned by the telemetry source; the card only reads it.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::utils::{parse_numeric, parse_timestamp};

/// A point in time.
pub type Timestamp = DateTime<Utc>;

/// A single timestamped reading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// When the reading was taken.
    pub timestamp: Timestamp,
    /// The reading in °C.
    pub value: f64,
}

impl Sample {
    /// Create a new sample.
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Parse an attribute history array of `[iso8601, value]` pairs.
///
/// Rows with an unparseable timestamp or a non-numeric value are dropped.
/// The result is sorted by timestamp.
pub fn parse_attribute_history(value: &Value) -> Vec<Sample> {
    let rows = match value {
        Value::Array(rows) => rows,
        _ => return Vec::new(),
    };

    let mut samples: Vec<Sample> = rows
        .iter()
        .filter_map(|row| {
            let pair = row.as_array()?;
            let timestamp = parse_timestamp(pair.first()?)?;
            let value = parse_numeric(pair.get(1)?)?;
            Some(Sample::new(timestamp, value))
        })
        .collect();

    sort_samples(&mut samples);
    samples
}

/// Sort samples by timestamp, keeping arrival order for equal timestamps.
pub fn sort_samples(samples: &mut [Sample]) {
    samples.sort_by_key(|s| s.timestamp);
}

/// The most recent sample value, if any.
pub fn last_value(samples: &[Sample]) -> Option<f64> {
    samples.last().map(|s| s.value)
}
