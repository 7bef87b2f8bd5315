//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing the session to interact with the realtime backend without
//! depending on a concrete websocket client.

pub mod realtime_port;

pub use realtime_port::{
    ChannelPort, ChannelState, ConnectOptions, ConnectionState, PushError, PushReceipt,
    PushResult, SocketFactory, SocketPort, TransportError,
};

#[cfg(any(test, feature = "testing"))]
pub use realtime_port::{MockChannelPort, MockSocketFactory, MockSocketPort};
