//! The daemon's single control loop.
//!
//! One task owns the whole bridge: it polls the classified session-event
//! channel with a bounded timeout, dispatches each event into the protocol
//! client, and drives the client's heartbeat at most once per observed
//! wall-clock second. Shutdown is cooperative: the loop re-checks an
//! atomic flag every iteration, so the 200 ms poll bound is also the upper
//! bound on shutdown latency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Browser-connection identifier, unique for the process lifetime.
pub type ConnId = u64;

/// Carries payloads back to one browser connection.
pub type FrameSink = mpsc::UnboundedSender<Vec<u8>>;

/// A classified event from the web layer.
#[derive(Debug)]
pub enum SessionEvent {
    /// A WebSocket upgrade completed; `FrameSink` is the way back.
    Opened(ConnId, FrameSink),
    /// Payload received on an upgraded connection. May be empty.
    Frame(ConnId, Vec<u8>),
    /// The connection is gone.
    Closed(ConnId),
}

/// The remote protocol client driven by the loop.
#[async_trait]
pub trait ControlClient {
    fn attach(&mut self, id: ConnId, sink: FrameSink);
    async fn frame(&mut self, id: ConnId, payload: &[u8]);
    /// Per-connection cleanup hook.
    fn detach(&mut self, id: ConnId);
    /// Heartbeat, called at most once per observed wall-clock second.
    async fn tick(&mut self);
    async fn disconnect(&mut self);
}

/// Upper bound on one poll. Caps both heartbeat latency and how long a
/// shutdown request can go unnoticed.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(200);

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Run the loop until `shutdown` is set or every event sender is gone.
pub async fn run<C: ControlClient>(
    events: mpsc::Receiver<SessionEvent>,
    client: &mut C,
    shutdown: &AtomicBool,
) {
    run_with_clock(events, client, shutdown, unix_seconds).await
}

/// As [`run`], with the wall-clock sampler injected.
pub async fn run_with_clock<C: ControlClient>(
    mut events: mpsc::Receiver<SessionEvent>,
    client: &mut C,
    shutdown: &AtomicBool,
    mut now_seconds: impl FnMut() -> u64,
) {
    let mut last_tick: Option<u64> = None;

    while !shutdown.load(Ordering::SeqCst) {
        match tokio::time::timeout(POLL_TIMEOUT, events.recv()).await {
            Ok(Some(event)) => dispatch(client, event).await,
            // All senders gone: the web layer is down, nothing left to poll.
            Ok(None) => break,
            // Quiet poll window; fall through to the heartbeat check.
            Err(_) => {}
        }

        let second = now_seconds();
        if last_tick != Some(second) {
            // Stored before the call so a slow tick cannot re-fire within
            // its own second. Skipped seconds are not caught up; the
            // client's heartbeat is idempotent, not frequency-counted.
            last_tick = Some(second);
            client.tick().await;
        }
    }

    // Teardown order matters: the client lets go of its sinks first, then
    // the receiver (and with it the event source) is released on return.
    client.disconnect().await;
}

async fn dispatch<C: ControlClient>(client: &mut C, event: SessionEvent) {
    match event {
        SessionEvent::Opened(id, sink) => client.attach(id, sink),
        // An empty payload on an upgraded connection is fine and means nothing.
        SessionEvent::Frame(_, payload) if payload.is_empty() => {}
        SessionEvent::Frame(id, payload) => client.frame(id, &payload).await,
        SessionEvent::Closed(id) => client.detach(id),
    }
}
