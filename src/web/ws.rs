//! WebSocket endpoint: one relay task per browser connection.

use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::relay::SessionEvent;
use crate::web::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_socket(socket, state))
}

/// Pump one upgraded connection: inbound frames become `SessionEvent`s for
/// the relay loop, outbound payloads arrive on this connection's sink.
async fn relay_socket(socket: WebSocket, state: AppState) {
    let id = state.next_conn_id.fetch_add(1, Ordering::Relaxed);
    let (mut sender, mut receiver) = socket.split();
    let (sink_tx, mut sink_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    if state
        .events
        .send(SessionEvent::Opened(id, sink_tx))
        .await
        .is_err()
    {
        // Relay loop already gone; nothing to bridge to.
        return;
    }
    tracing::debug!("websocket {} connected", id);

    loop {
        tokio::select! {
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if state.events.send(SessionEvent::Frame(id, text.as_bytes().to_vec())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    if state.events.send(SessionEvent::Frame(id, data.to_vec())).await.is_err() {
                        break;
                    }
                }
                // axum answers pings on its own
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
            },
            outbound = sink_rx.recv() => match outbound {
                Some(payload) => {
                    // MPD speaks a line-oriented text protocol; relay as text.
                    let text = String::from_utf8_lossy(&payload).into_owned();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                // Bridge dropped this sink (disconnect or dead-channel sweep).
                None => break,
            },
        }
    }

    let _ = state.events.send(SessionEvent::Closed(id)).await;
    tracing::debug!("websocket {} closed", id);
}
