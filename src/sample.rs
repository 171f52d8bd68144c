//! Wire types for the telemetry stream and snapshot store.
//!
//! The stream delivers one JSON object per message: `{tag, value, ts}`
//! with `value` transmitted as text and `ts` as an ISO-8601 timestamp.
//! Interpretation of `value` (float reading, integer status code, …) is
//! up to the consumer, so it is kept as a string here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation on a named telemetry channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Channel name, e.g. `Pressure_Sterilizer_1`.
    pub tag: String,
    /// Raw value text as transmitted by the server.
    pub value: String,
    /// Server-side timestamp of the observation.
    pub at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct WireFrame {
    tag: String,
    value: String,
    ts: String,
}

impl Sample {
    /// Parse a raw inbound text frame. Returns `None` for anything that
    /// does not match the expected shape; the stream is trusted beyond
    /// that, and malformed frames are simply dropped by the caller.
    pub fn from_wire(text: &str) -> Option<Sample> {
        let frame: WireFrame = serde_json::from_str(text).ok()?;
        let at = DateTime::parse_from_rfc3339(&frame.ts).ok()?.with_timezone(&Utc);
        Some(Sample {
            tag: frame.tag,
            value: frame.value,
            at,
        })
    }

    /// The value parsed as a float reading, if it is one.
    pub fn value_f64(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }

    /// The value parsed as an integer code. Codes occasionally arrive
    /// with a fractional rendering (`"2.0"`), so this goes through f64.
    pub fn value_code(&self) -> Option<i64> {
        self.value_f64().map(|v| v as i64)
    }
}

/// A parsed point of one time series: the form held in rolling buffers
/// and returned by snapshot fetches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPoint {
    pub at: DateTime<Utc>,
    pub value: f64,
}

impl TimedPoint {
    /// Project to `[unix_seconds, value]` for plotting code.
    #[inline]
    pub fn xy(&self) -> [f64; 2] {
        [self.at.timestamp_millis() as f64 * 1e-3, self.value]
    }
}

/// The full-replacement interest announcement sent to the server:
/// `{"Subscribe": ["TagA", "TagB"]}`. The set always replaces whatever
/// was announced before; the server computes the diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscribeFrame {
    #[serde(rename = "Subscribe")]
    pub subscribe: Vec<String>,
}

impl SubscribeFrame {
    pub fn new(tags: Vec<String>) -> Self {
        Self { subscribe: tags }
    }

    pub fn to_json(&self) -> String {
        // Serialization of Vec<String> cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
