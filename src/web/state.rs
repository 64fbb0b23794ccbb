use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::auth::AuthGate;
use crate::relay::SessionEvent;

#[derive(Clone)]
pub struct AppState {
    /// Feeds classified events into the relay loop.
    pub events: mpsc::Sender<SessionEvent>,
    /// Present iff an htpasswd path is configured; absent means open access.
    pub auth: Option<Arc<AuthGate>>,
    pub next_conn_id: Arc<AtomicU64>,
}
