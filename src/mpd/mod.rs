//! Opaque relay between browser connections and the MPD control socket.
//!
//! The bridge never interprets the MPD protocol: browser payloads are
//! written through verbatim, and whatever MPD sends back fans out to every
//! attached connection. The heartbeat keeps the TCP session alive and
//! re-establishes it after errors. A failed connect is logged and retried
//! on the next tick, never fatal.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::relay::{ConnId, ControlClient, FrameSink};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

pub struct MpdBridge {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    sinks: HashMap<ConnId, FrameSink>,
}

impl MpdBridge {
    pub fn new(host: &str, port: u16) -> Self {
        MpdBridge {
            host: host.to_string(),
            port,
            stream: None,
            sinks: HashMap::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn ensure_connected(&mut self) {
        if self.stream.is_some() {
            return;
        }
        let target = (self.host.as_str(), self.port);
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => {
                tracing::info!("connected to mpd at {}:{}", self.host, self.port);
                self.stream = Some(stream);
            }
            Ok(Err(e)) => {
                tracing::warn!("mpd connect {}:{} failed: {}", self.host, self.port, e);
            }
            Err(_) => {
                tracing::warn!("mpd connect {}:{} timed out", self.host, self.port);
            }
        }
    }

    /// Drain whatever MPD has buffered without blocking the loop, and fan
    /// it out to the attached connections.
    fn drain_ready(&mut self) {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        let mut lost = false;

        if let Some(stream) = &self.stream {
            let mut buf = [0u8; 4096];
            loop {
                match stream.try_read(&mut buf) {
                    Ok(0) => {
                        tracing::warn!("mpd closed the connection");
                        lost = true;
                        break;
                    }
                    Ok(n) => chunks.push(buf[..n].to_vec()),
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => {
                        tracing::warn!("mpd read error: {}", e);
                        lost = true;
                        break;
                    }
                }
            }
        }

        if lost {
            self.stream = None;
        }
        for chunk in chunks {
            self.broadcast(&chunk);
        }
    }

    fn broadcast(&mut self, payload: &[u8]) {
        // Sinks whose connection task is gone get dropped here; the Closed
        // event will follow through the loop anyway.
        self.sinks
            .retain(|_, sink| sink.send(payload.to_vec()).is_ok());
    }
}

#[async_trait]
impl ControlClient for MpdBridge {
    fn attach(&mut self, id: ConnId, sink: FrameSink) {
        tracing::debug!("connection {} attached", id);
        self.sinks.insert(id, sink);
    }

    async fn frame(&mut self, id: ConnId, payload: &[u8]) {
        if self.stream.is_none() {
            self.ensure_connected().await;
        }
        let Some(stream) = &mut self.stream else {
            tracing::debug!("dropping {} bytes from {}: mpd not connected", payload.len(), id);
            return;
        };
        if let Err(e) = stream.write_all(payload).await {
            tracing::warn!("mpd write error: {}, reconnecting on next tick", e);
            self.stream = None;
        }
    }

    fn detach(&mut self, id: ConnId) {
        tracing::debug!("connection {} detached", id);
        self.sinks.remove(&id);
    }

    async fn tick(&mut self) {
        self.ensure_connected().await;
        self.drain_ready();
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            tracing::info!("disconnected from mpd");
        }
        self.sinks.clear();
    }
}
