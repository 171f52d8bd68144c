//! Vesselscope: the live-telemetry core of a pressure-vessel monitoring
//! dashboard.
//!
//! The crate owns everything between the plant's telemetry server and
//! the chart-drawing layer:
//! - `connection`: one persistent WebSocket session with fixed-delay
//!   reconnect and full-replacement Subscribe announcements
//! - `registry`: tag → listener fan-out with token-handle subscriptions
//! - `snapshot`: bounded-range historical fetches over HTTP
//! - `buffer`: the bounded rolling time series each chart renders
//! - `feed`: the per-chart pipeline tying the above together
//! - `status`: status/alarm code derivation, defined once
//! - `timerange`: live and history window computation
//! - `config`: local/online endpoint selection
//!
//! Rendering is deliberately absent: a UI layer consumes each feed's
//! points, status label/color, and alarm overlay text however it likes.

pub mod buffer;
pub mod config;
pub mod connection;
pub mod feed;
pub mod registry;
pub mod sample;
pub mod snapshot;
pub mod status;
pub mod timerange;

// Public re-exports for a compact external API
pub use buffer::{RollingBuffer, DEFAULT_MAX_POINTS};
pub use config::{EndpointConfig, EndpointPair};
pub use connection::{ConnectionConfig, TelemetryConnection, DEFAULT_RECONNECT_DELAY};
pub use feed::{AlarmSnapshot, ChartFeed, FeedMode, TagSet};
pub use registry::{SubscriptionId, SubscriptionRegistry, TagSubscription};
pub use sample::{Sample, SubscribeFrame, TimedPoint};
pub use snapshot::{SnapshotClient, SnapshotError};
pub use status::{format_countdown, HoldState, VesselStatus};
