//! Realtime Port - Outbound port for Phoenix-style socket/channel operations
//!
//! The session layer talks to the backend exclusively through these traits so
//! it can be driven by the websocket adapter in production and by mocks in tests.
//!
//! Every channel operation returns a [`PushReceipt`] immediately. The receipt is a
//! future that resolves once the server replies (or the push fails locally).

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use islands_protocol::{JoinParams, Topic};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

/// Connection state of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to the server
    Disconnected,
    /// Attempting to establish connection
    Connecting,
    /// Successfully connected
    Connected,
    /// Connection attempt failed
    Failed,
}

impl ConnectionState {
    /// Convert to u8 for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Failed => 3,
        }
    }

    /// Convert from u8 (atomic storage).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Failed,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Lifecycle of a single channel subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Joining,
    Joined,
    Leaving,
    Errored,
}

/// Options for opening a socket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Extra query parameters sent with the websocket handshake
    pub params: BTreeMap<String, String>,
    /// Overrides the configured heartbeat interval
    pub heartbeat_interval: Option<Duration>,
    /// Overrides the configured push timeout
    pub timeout: Option<Duration>,
}

impl ConnectOptions {
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Errors raised while setting up a socket.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid socket URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Socket task could not be started: {0}")]
    Spawn(String),
}

/// Why a push did not produce an `ok` reply.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PushError {
    /// Server replied with `status: "error"`; carries the response payload
    #[error("Rejected by server: {0}")]
    Rejected(Value),

    /// No reply arrived within the push timeout
    #[error("Timed out waiting for reply")]
    Timeout,

    /// Socket closed before the reply arrived
    #[error("Socket closed before reply")]
    Closed,

    /// The socket is not running, so the push could not be queued
    #[error("Not connected to server")]
    NotConnected,

    /// `join` called on a channel that is already joining or joined
    #[error("Channel already joined")]
    AlreadyJoined,

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type PushResult = Result<Value, PushError>;

/// Pending reply for a join, leave or push.
///
/// Dropping the receipt does not cancel the request; the reply is discarded.
#[derive(Debug)]
pub struct PushReceipt {
    rx: oneshot::Receiver<PushResult>,
}

impl PushReceipt {
    /// Create a receipt together with the sender that resolves it.
    pub fn channel() -> (oneshot::Sender<PushResult>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A receipt that is already resolved.
    pub fn ready(result: PushResult) -> Self {
        let (tx, receipt) = Self::channel();
        let _ = tx.send(result);
        receipt
    }
}

impl Future for PushReceipt {
    type Output = PushResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Resolver dropped without answering: the socket went away.
            Poll::Ready(Err(_)) => Poll::Ready(Err(PushError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A socket connection to the realtime backend.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SocketPort: Send + Sync {
    /// Get the current connection state
    fn state(&self) -> ConnectionState;

    /// Begin connecting. Returns once the connection task is running, not when
    /// the handshake completes.
    fn connect(&self) -> Result<(), TransportError>;

    /// Close the connection. Pending pushes resolve with [`PushError::Closed`].
    fn disconnect(&self);

    /// Create a channel for `topic` on this socket. Does not join it.
    fn channel(&self, topic: Topic, params: JoinParams) -> Arc<dyn ChannelPort>;
}

/// A subscription to a single topic.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ChannelPort: Send + Sync {
    fn topic(&self) -> Topic;

    fn state(&self) -> ChannelState;

    /// Send `phx_join` with the channel's join params
    fn join(&self) -> PushReceipt;

    /// Send `phx_leave`
    fn leave(&self) -> PushReceipt;

    /// Push a named event with a payload
    fn push(&self, event: &str, payload: Value) -> PushReceipt;
}

/// Opens sockets. The session asks for a fresh socket on every start.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SocketFactory: Send + Sync {
    fn open(&self, options: ConnectOptions) -> Result<Arc<dyn SocketPort>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn ready_receipt_resolves_immediately() {
        let receipt = PushReceipt::ready(Ok(json!({"ok": true})));
        assert_eq!(receipt.await, Ok(json!({"ok": true})));
    }

    #[tokio::test]
    async fn dropped_resolver_reports_closed() {
        let (tx, receipt) = PushReceipt::channel();
        drop(tx);
        assert_eq!(receipt.await, Err(PushError::Closed));
    }

    #[test]
    fn connection_state_round_trips_through_u8() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Failed,
        ] {
            assert_eq!(ConnectionState::from_u8(state.to_u8()), state);
        }
    }
}
