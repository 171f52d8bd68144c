//! The tag value stream connection: one persistent WebSocket session to
//! the telemetry server, multiplexing inbound samples to the registry.
//!
//! The connection is an explicitly owned value — whatever composes the
//! application spawns exactly one and keeps it for the process lifetime.
//! On every successful (re)connect it announces the full current tag set
//! once; while connected, every registry membership change re-sends the
//! set verbatim. On close or error it waits a fixed delay and connects
//! again, forever. Failures are never surfaced to callers; the only
//! visible symptom of an outage is a frozen chart until the server
//! returns.

use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::registry::SubscriptionRegistry;
use crate::sample::{Sample, SubscribeFrame};

/// Fixed wait between reconnect attempts. No backoff, no retry cap: the
/// plant network is local and stable, and the dashboard must always
/// recover once the server comes back.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Connection parameters for the streaming transport.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket endpoint, e.g. `ws://plant-server:9001/stream`.
    pub stream_url: String,
    /// Wait between reconnect attempts.
    pub reconnect_delay: Duration,
}

impl ConnectionConfig {
    pub fn new<S: Into<String>>(stream_url: S) -> Self {
        Self {
            stream_url: stream_url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Handle owning the background stream task.
///
/// Dropping the handle leaves the task running for the rest of the
/// process (the intended mode for a dashboard); call
/// [`shutdown`](Self::shutdown) to stop it explicitly.
pub struct TelemetryConnection {
    registry: SubscriptionRegistry,
    task: JoinHandle<()>,
}

impl TelemetryConnection {
    /// Start the connection task. Attaches the announce wakeup to the
    /// registry, so subscriptions made before the first successful
    /// connect are announced as one set once the transport opens.
    pub fn spawn(config: ConnectionConfig, registry: SubscriptionRegistry) -> Self {
        let (announce_tx, announce_rx) = tokio::sync::mpsc::unbounded_channel();
        registry.set_announcer(announce_tx);
        let task = tokio::spawn(run(config, registry.clone(), announce_rx));
        Self { registry, task }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Stop the stream task. Listeners keep whatever they already have.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn run(
    config: ConnectionConfig,
    registry: SubscriptionRegistry,
    mut announce_rx: UnboundedReceiver<()>,
) {
    loop {
        match connect_async(config.stream_url.as_str()).await {
            Ok((ws, _response)) => {
                debug!(url = %config.stream_url, "stream connected");
                session(ws, &registry, &mut announce_rx).await;
                debug!("stream session ended, reconnecting");
            }
            Err(err) => {
                debug!(url = %config.stream_url, %err, "stream connect failed");
            }
        }
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// One connected session: announce, then pump pings and frames until the
/// transport goes away.
async fn session<S>(ws: S, registry: &SubscriptionRegistry, announce_rx: &mut UnboundedReceiver<()>)
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut write, mut read) = ws.split();

    // Pings that queued up while disconnected are covered by the fresh
    // snapshot sent below; drain them so they don't trigger duplicates.
    while announce_rx.try_recv().is_ok() {}
    if announce(&mut write, registry).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            ping = announce_rx.recv() => {
                if ping.is_none() {
                    return;
                }
                // Coalesce bursts of membership changes into one announcement.
                while announce_rx.try_recv().is_ok() {}
                if announce(&mut write, registry).await.is_err() {
                    return;
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match Sample::from_wire(&text) {
                            Some(sample) => registry.dispatch(&sample),
                            None => debug!("dropped malformed frame"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {} // binary/ping/pong frames are not part of the protocol
                    Some(Err(err)) => {
                        warn!(%err, "stream read error");
                        return;
                    }
                }
            }
        }
    }
}

/// Send the full current tag set as one Subscribe announcement. The set
/// may be empty; that tells the server to stop streaming everything.
async fn announce<W>(write: &mut W, registry: &SubscriptionRegistry) -> Result<(), W::Error>
where
    W: Sink<Message> + Unpin,
{
    let frame = SubscribeFrame::new(registry.subscribed_tags());
    debug!(tags = ?frame.subscribe, "announcing subscription set");
    write.send(Message::Text(frame.to_json().into())).await
}
