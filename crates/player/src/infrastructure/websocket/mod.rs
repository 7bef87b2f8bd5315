//! WebSocket adapter for the realtime port.
//!
//! - `core`: ref allocation and pending-reply tracking
//! - `shared`: endpoint URL building, defaults and reply mapping
//! - `socket`: the tokio-tungstenite connection task
//! - `channel`: per-topic join/leave/push

mod channel;
mod core;
mod shared;
mod socket;


pub use channel::PhoenixChannel;
pub use shared::{endpoint_url, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_PUSH_TIMEOUT, PROTOCOL_VSN};
pub use socket::{PhoenixSocket, PhoenixSocketFactory};
