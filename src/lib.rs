//! Minimal web client for MPD — serve the player UI over HTTP, relay browser
//! WebSocket traffic to the music daemon, and gate it all behind optional
//! HTTP Digest authentication.

pub mod auth;
pub mod cli;
pub mod config;
pub mod mpd;
pub mod relay;
pub mod web;
