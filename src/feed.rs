//! Per-chart data pipeline: one [`ChartFeed`] per chart widget, fed by
//! the subscription registry and seeded by a snapshot fetch.
//!
//! A feed runs in exactly one of two modes for its whole lifetime:
//!
//! - **Live**: subscribes its tag set, seeds the buffer from a snapshot
//!   of the last three hours, then appends stream samples as they come.
//! - **History**: fetches an explicit date range once and never touches
//!   the stream.
//!
//! The primary pressure tag is the only one with history; the secondary
//! tags (status code, hold/alarm flag, countdown, dynamic limit lines)
//! each update a latest-value scalar consumed at render time.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::buffer::RollingBuffer;
use crate::registry::{SubscriptionRegistry, TagSubscription};
use crate::sample::{Sample, TimedPoint};
use crate::snapshot::{SnapshotClient, SnapshotError};
use crate::status::{format_countdown, HoldState, VesselStatus};
use crate::timerange::{history_window, live_window, PLANT_TZ};

// ─────────────────────────────────────────────────────────────────────────────
// TagSet – which channels one chart consumes
// ─────────────────────────────────────────────────────────────────────────────

/// The tags wired to one chart. Only the pressure tag is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    /// Primary series: the pressure reading, appended to the buffer.
    pub pressure: String,
    /// Status code tag (`Status_*`).
    pub status: Option<String>,
    /// Hold/alarm flag tag (`HA_S*`), sterilizers only.
    pub hold: Option<String>,
    /// Countdown tag (`THA_S*`), sterilizers only.
    pub countdown: Option<String>,
    /// Dynamic upper strip-line limit.
    pub upper_limit: Option<String>,
    /// Dynamic lower strip-line limit.
    pub lower_limit: Option<String>,
}

impl TagSet {
    pub fn pressure_only<S: Into<String>>(pressure: S) -> Self {
        Self {
            pressure: pressure.into(),
            status: None,
            hold: None,
            countdown: None,
            upper_limit: None,
            lower_limit: None,
        }
    }

    /// Sterilizer `n` (1-based): pressure, status, hold flag, countdown.
    pub fn sterilizer(n: u32) -> Self {
        Self {
            pressure: format!("Pressure_Sterilizer_{n}"),
            status: Some(format!("Status_Sterilizer_{n}")),
            hold: Some(format!("HA_S{n}")),
            countdown: Some(format!("THA_S{n}")),
            upper_limit: None,
            lower_limit: None,
        }
    }

    /// Back-pressure valve: pressure, status, dynamic limit lines.
    pub fn bpv() -> Self {
        Self {
            pressure: "Pressure_BPV".to_string(),
            status: Some("Status_BPV".to_string()),
            hold: None,
            countdown: None,
            upper_limit: Some("tagUL".to_string()),
            lower_limit: Some("tagLL".to_string()),
        }
    }

    pub fn boiler() -> Self {
        Self {
            pressure: "Pressure_Boiler".to_string(),
            status: Some("Status_Boiler".to_string()),
            hold: None,
            countdown: None,
            upper_limit: None,
            lower_limit: None,
        }
    }

    pub fn turbine() -> Self {
        Self {
            pressure: "Pressure_Steam_Chest_Turbine".to_string(),
            status: Some("Status_Turbine".to_string()),
            hold: None,
            countdown: None,
            upper_limit: None,
            lower_limit: None,
        }
    }

    fn all_tags(&self) -> Vec<&str> {
        let mut tags = vec![self.pressure.as_str()];
        for t in [
            &self.status,
            &self.hold,
            &self.countdown,
            &self.upper_limit,
            &self.lower_limit,
        ]
        .into_iter()
        .flatten()
        {
            tags.push(t.as_str());
        }
        tags
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FeedMode & AlarmSnapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Live and history modes are mutually exclusive per feed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Live,
    History { start: NaiveDate, end: NaiveDate },
}

/// What the reading was at alarm onset. Captured once when the hold flag
/// becomes active and held unchanged until it clears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmSnapshot {
    /// Stream timestamp of the activating hold sample.
    pub at: DateTime<Utc>,
    /// Last buffered pressure at that moment.
    pub pressure: f64,
    pub kind: HoldState,
    /// Vessel status at onset.
    pub status: VesselStatus,
}

impl AlarmSnapshot {
    /// Activation time as a plant-local clock string.
    pub fn local_time(&self) -> String {
        self.at.with_timezone(&*PLANT_TZ).format("%H:%M:%S").to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChartFeed
// ─────────────────────────────────────────────────────────────────────────────

/// The data side of one chart widget.
pub struct ChartFeed {
    tags: TagSet,
    mode: FeedMode,
    registry: Option<SubscriptionRegistry>,
    subs: Vec<TagSubscription>,

    buffer: RollingBuffer,
    status: VesselStatus,
    hold: HoldState,
    alarm: Option<AlarmSnapshot>,
    countdown_secs: f64,
    upper_limit: f64,
    lower_limit: f64,

    dirty: bool,
}

impl ChartFeed {
    /// Live-mode feed: registers every configured tag with the registry.
    /// Call [`seed`](Self::seed) afterwards to backfill the buffer; live
    /// samples arriving before the seed lands are replaced along with
    /// everything else when it does.
    pub fn live(registry: &SubscriptionRegistry, tags: TagSet) -> Self {
        let subs = tags
            .all_tags()
            .into_iter()
            .map(|tag| registry.subscribe(tag))
            .collect();
        Self::with_parts(tags, FeedMode::Live, Some(registry.clone()), subs)
    }

    /// History-mode feed for `[start, end]` plant-local days. Never
    /// subscribes to the stream.
    pub fn history(tags: TagSet, start: NaiveDate, end: NaiveDate) -> Self {
        Self::with_parts(tags, FeedMode::History { start, end }, None, Vec::new())
    }

    fn with_parts(
        tags: TagSet,
        mode: FeedMode,
        registry: Option<SubscriptionRegistry>,
        subs: Vec<TagSubscription>,
    ) -> Self {
        Self {
            tags,
            mode,
            registry,
            subs,
            buffer: RollingBuffer::default(),
            status: VesselStatus::Unknown,
            hold: HoldState::Inactive,
            alarm: None,
            countdown_secs: 0.0,
            // Strip-line defaults until the first limit sample arrives.
            upper_limit: 3.0,
            lower_limit: 0.0,
            dirty: false,
        }
    }

    /// The snapshot range this feed seeds from: the last buffer span up
    /// to now for live mode, the full plant-local day range for history.
    pub fn seed_range(&self) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        match self.mode {
            FeedMode::Live => (live_window(Utc::now()).0, None),
            FeedMode::History { start, end } => {
                let (s, e) = history_window(start, end);
                (s, Some(e))
            }
        }
    }

    /// Fetch the seed range and wholesale-replace the buffer. On failure
    /// the buffer keeps its prior contents and the error is returned; the
    /// chart shows stale data (or "No Data") until the user re-triggers.
    pub async fn seed(&mut self, client: &SnapshotClient) -> Result<(), SnapshotError> {
        let (start, end) = self.seed_range();
        match client.fetch(&self.tags.pressure, start, end).await {
            Ok(points) => {
                self.buffer.replace(points);
                self.dirty = true;
                Ok(())
            }
            Err(err) => {
                warn!(tag = %self.tags.pressure, %err, "snapshot fetch failed");
                Err(err)
            }
        }
    }

    /// Drain every subscription channel and route the samples. Call once
    /// per display frame; the resulting redraw need is reported by
    /// [`take_dirty`](Self::take_dirty) so bursts coalesce into one
    /// refresh.
    pub fn pump(&mut self) {
        let mut pending = Vec::new();
        for sub in &self.subs {
            while let Ok(sample) = sub.rx.try_recv() {
                pending.push(sample);
            }
        }
        for sample in pending {
            self.apply(&sample);
        }
    }

    /// Returns whether anything changed since the last call, clearing
    /// the flag. At most one redraw per frame regardless of burst size.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn apply(&mut self, sample: &Sample) {
        if sample.tag == self.tags.pressure {
            if let Some(value) = sample.value_f64() {
                self.buffer.push(TimedPoint {
                    at: sample.at,
                    value,
                });
                self.dirty = true;
            }
            return;
        }
        if self.tags.status.as_deref() == Some(sample.tag.as_str()) {
            if let Some(code) = sample.value_code() {
                self.status = VesselStatus::from_code(code);
                self.dirty = true;
            }
            return;
        }
        if self.tags.hold.as_deref() == Some(sample.tag.as_str()) {
            if let Some(code) = sample.value_code() {
                self.hold = HoldState::from_code(code);
                // Capture the reading at onset; cleared (not refreshed)
                // while active, dropped when the flag goes inactive.
                self.alarm = match (self.hold.is_active(), self.buffer.last()) {
                    (true, Some(last)) => Some(AlarmSnapshot {
                        at: sample.at,
                        pressure: last.value,
                        kind: self.hold,
                        status: self.status,
                    }),
                    _ => None,
                };
                self.dirty = true;
            }
            return;
        }
        if self.tags.countdown.as_deref() == Some(sample.tag.as_str()) {
            if let Some(secs) = sample.value_f64() {
                self.countdown_secs = secs;
                self.dirty = true;
            }
            return;
        }
        if self.tags.upper_limit.as_deref() == Some(sample.tag.as_str()) {
            if let Some(v) = sample.value_f64() {
                self.upper_limit = v;
                self.dirty = true;
            }
            return;
        }
        if self.tags.lower_limit.as_deref() == Some(sample.tag.as_str()) {
            if let Some(v) = sample.value_f64() {
                self.lower_limit = v;
                self.dirty = true;
            }
        }
    }

    // ── Render surface ───────────────────────────────────────────────────────

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        matches!(self.mode, FeedMode::Live)
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    /// Buffer projected to `[unix_seconds, value]` pairs.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.buffer.xy()
    }

    /// The most recent pressure reading, if any arrived yet.
    pub fn last_pressure(&self) -> Option<f64> {
        self.buffer.last().map(|p| p.value)
    }

    pub fn status(&self) -> VesselStatus {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    pub fn status_color(&self) -> &'static str {
        self.status.color()
    }

    pub fn hold(&self) -> HoldState {
        self.hold
    }

    pub fn alarm(&self) -> Option<&AlarmSnapshot> {
        self.alarm.as_ref()
    }

    pub fn countdown_secs(&self) -> f64 {
        self.countdown_secs
    }

    /// Current (upper, lower) strip-line limits.
    pub fn limits(&self) -> (f64, f64) {
        (self.upper_limit, self.lower_limit)
    }

    /// Overlay text while the hold alarm is active, e.g.
    /// `[AFBLAST - 1:23]`. `None` when there is nothing to show.
    pub fn overlay_text(&self) -> Option<String> {
        let alarm = self.alarm.as_ref()?;
        Some(format!(
            "[{} - {}]",
            alarm.kind.label(),
            format_countdown(self.countdown_secs)
        ))
    }
}

impl Drop for ChartFeed {
    fn drop(&mut self) {
        if let Some(registry) = &self.registry {
            for sub in &self.subs {
                registry.unsubscribe(sub);
            }
        }
    }
}
