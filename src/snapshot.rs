//! Snapshot fetch client: bounded-range historical queries against the
//! telemetry store.
//!
//! One stateless request per call: `GET {base}/telemetry?start-at=…
//! [&end-at=…]&tag=…`. Omitting `end-at` means "through now" and is how
//! live feeds seed themselves. Fetch failures are returned to the caller,
//! who keeps whatever data it already had — there is no automatic retry.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::sample::TimedPoint;

/// HTTP request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a snapshot fetch.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Network-level failure or undecodable body.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("server error: HTTP {0}")]
    Status(u16),
}

#[derive(Deserialize)]
struct SnapshotResponse {
    values: Vec<SnapshotValue>,
}

#[derive(Deserialize)]
struct SnapshotValue {
    ts: DateTime<Utc>,
    value: f64,
}

/// Client for the `/telemetry` range endpoint.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http: reqwest::Client,
    base_url: String,
}

impl SnapshotClient {
    /// `base_url` without a trailing slash, e.g. `http://plant-server:8080`.
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch all samples of `tag` in `[start, end]`; `end = None` means
    /// through now. Points come back in the store's order (ascending).
    pub async fn fetch(
        &self,
        tag: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimedPoint>, SnapshotError> {
        let url = self.url_for(tag, start, end);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SnapshotError::Status(response.status().as_u16()));
        }
        let body: SnapshotResponse = response.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|v| TimedPoint {
                at: v.ts,
                value: v.value,
            })
            .collect())
    }

    fn url_for(&self, tag: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> String {
        let start = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        match end {
            Some(end) => format!(
                "{}/telemetry?start-at={}&end-at={}&tag={}",
                self.base_url,
                start,
                end.to_rfc3339_opts(SecondsFormat::Secs, true),
                tag
            ),
            None => format!("{}/telemetry?start-at={}&tag={}", self.base_url, start, tag),
        }
    }
}
