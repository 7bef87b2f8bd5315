//! Phoenix socket over tokio-tungstenite.
//!
//! A `PhoenixSocket` owns one websocket connection task. Frames pushed by
//! channels go through an unbounded queue, so anything pushed before the
//! handshake completes is sent once it does. A socket connects at most once;
//! the session opens a fresh one on every start.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use islands_protocol::{Frame, JoinParams, Topic, PHOENIX_TOPIC};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::channel::{ChannelShared, PhoenixChannel};
use super::core::{lock, PendingCallback, PendingReplies, RefCounter};
use super::shared::{
    endpoint_url, reply_result, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_PUSH_TIMEOUT,
};
use crate::ports::outbound::{
    ChannelPort, ConnectOptions, ConnectionState, PushError, PushResult, SocketFactory,
    SocketPort, TransportError,
};

/// State shared between the socket handle, its channels and the connection task.
pub(crate) struct SocketInner {
    endpoint: Url,
    timeout: Duration,
    heartbeat_interval: Duration,
    refs: RefCounter,
    state: AtomicU8,
    tx: mpsc::UnboundedSender<Frame>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Frame>>>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    pending: Mutex<PendingReplies>,
    channels: Mutex<HashMap<String, Weak<ChannelShared>>>,
}

impl SocketInner {
    pub(crate) fn next_ref(&self) -> String {
        self.refs.next()
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Queue `frame` and register `on_reply` under its ref.
    ///
    /// The callback runs exactly once: with the server reply, with
    /// [`PushError::Timeout`], or with a local failure. Outside a tokio runtime
    /// the push fails immediately with [`PushError::Transport`].
    pub(crate) fn push(self: &Arc<Self>, frame: Frame, on_reply: PendingCallback) {
        let Some(msg_ref) = frame.msg_ref.clone() else {
            on_reply(Err(PushError::Transport("frame has no ref".into())));
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            on_reply(Err(PushError::Transport("no tokio runtime".into())));
            return;
        };

        lock(&self.pending).insert(msg_ref.clone(), on_reply);

        tracing::debug!(
            topic = %frame.topic,
            event = %frame.event,
            msg_ref = %msg_ref,
            "Queueing frame"
        );
        if self.tx.send(frame).is_err() {
            self.resolve(&msg_ref, Err(PushError::NotConnected));
            return;
        }

        let socket = Arc::downgrade(self);
        let timeout = self.timeout;
        runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(socket) = socket.upgrade() {
                if socket.resolve(&msg_ref, Err(PushError::Timeout)) {
                    tracing::debug!(msg_ref = %msg_ref, "Push timed out");
                }
            }
        });
    }

    /// Queue a frame whose reply nobody waits for.
    pub(crate) fn push_unobserved(self: &Arc<Self>, frame: Frame) {
        self.push(frame, Box::new(|_| {}));
    }

    /// Returns true if a pending reply was found.
    fn resolve(&self, msg_ref: &str, result: PushResult) -> bool {
        let callback = lock(&self.pending).take(msg_ref);
        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => false,
        }
    }

    fn fail_pending(&self, error: PushError) {
        let callbacks = lock(&self.pending).drain();
        if !callbacks.is_empty() {
            tracing::debug!(count = callbacks.len(), "Failing pending pushes: {}", error);
        }
        for callback in callbacks {
            callback(Err(error.clone()));
        }
    }

    fn register_channel(&self, channel: &Arc<ChannelShared>) {
        lock(&self.channels).insert(channel.topic().to_string(), Arc::downgrade(channel));
    }

    fn channel_for(&self, topic: &str) -> Option<Arc<ChannelShared>> {
        let mut channels = lock(&self.channels);
        match channels.get(topic).map(Weak::upgrade) {
            Some(Some(channel)) => Some(channel),
            Some(None) => {
                channels.remove(topic);
                None
            }
            None => None,
        }
    }

    fn error_channels(&self) {
        let channels: Vec<_> = lock(&self.channels)
            .values()
            .filter_map(Weak::upgrade)
            .collect();
        for channel in channels {
            channel.on_socket_closed();
        }
    }

    fn handle_text(&self, text: &str, pending_heartbeat: &mut Option<String>) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to parse server frame: {}", e);
                return;
            }
        };
        tracing::debug!(topic = %frame.topic, event = %frame.event, "Received frame");

        if frame.is_reply() {
            let is_heartbeat = frame.topic == PHOENIX_TOPIC
                && frame.msg_ref.is_some()
                && frame.msg_ref == *pending_heartbeat;
            if is_heartbeat {
                *pending_heartbeat = None;
                return;
            }
            let Some(msg_ref) = frame.msg_ref.as_deref() else {
                tracing::warn!(topic = %frame.topic, "Reply without ref ignored");
                return;
            };
            let result = frame
                .reply()
                .map_err(|e| PushError::Transport(e.to_string()))
                .and_then(reply_result);
            if !self.resolve(msg_ref, result) {
                tracing::debug!(
                    msg_ref = %msg_ref,
                    "Reply for unknown ref - push may have timed out"
                );
            }
            return;
        }

        match self.channel_for(&frame.topic) {
            Some(channel) => channel.on_event(&frame),
            None => tracing::debug!(
                topic = %frame.topic,
                event = %frame.event,
                "Frame for unknown topic"
            ),
        }
    }
}

/// Phoenix socket (desktop, tokio-tungstenite)
#[derive(Clone)]
pub struct PhoenixSocket {
    inner: Arc<SocketInner>,
}

impl PhoenixSocket {
    /// Create a socket for `base_url`. Values in `options` override the defaults.
    pub fn new(
        base_url: &str,
        options: &ConnectOptions,
        heartbeat_interval: Duration,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let endpoint = endpoint_url(base_url, &options.params)?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            inner: Arc::new(SocketInner {
                endpoint,
                timeout: options.timeout.unwrap_or(timeout),
                heartbeat_interval: options.heartbeat_interval.unwrap_or(heartbeat_interval),
                refs: RefCounter::default(),
                state: AtomicU8::new(ConnectionState::Disconnected.to_u8()),
                tx,
                rx: Mutex::new(Some(rx)),
                shutdown: Mutex::new(None),
                pending: Mutex::new(PendingReplies::default()),
                channels: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

impl SocketPort for PhoenixSocket {
    fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    fn connect(&self) -> Result<(), TransportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Spawn(e.to_string()))?;

        let Some(outbound) = lock(&self.inner.rx).take() else {
            tracing::debug!(url = %self.inner.endpoint, "Socket already connected");
            return Ok(());
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *lock(&self.inner.shutdown) = Some(shutdown_tx);
        self.inner.set_state(ConnectionState::Connecting);

        runtime.spawn(run_connection(Arc::clone(&self.inner), outbound, shutdown_rx));
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(shutdown) = lock(&self.inner.shutdown).take() {
            let _ = shutdown.send(());
            return;
        }
        // Never connected: drop the queue so later pushes fail fast.
        if lock(&self.inner.rx).take().is_some() {
            self.inner.fail_pending(PushError::Closed);
        }
        self.inner.set_state(ConnectionState::Disconnected);
    }

    fn channel(&self, topic: Topic, params: JoinParams) -> Arc<dyn ChannelPort> {
        let shared = Arc::new(ChannelShared::new(topic, params));
        self.inner.register_channel(&shared);
        Arc::new(PhoenixChannel::new(shared, Arc::clone(&self.inner)))
    }
}

async fn run_connection(
    inner: Arc<SocketInner>,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let connected = tokio::select! {
        result = connect_async(inner.endpoint.as_str()) => result,
        _ = &mut shutdown => {
            tracing::info!("Disconnect requested before connection was established");
            inner.set_state(ConnectionState::Disconnected);
            inner.fail_pending(PushError::Closed);
            return;
        }
    };

    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            tracing::error!(url = %inner.endpoint, "Failed to connect: {}", e);
            inner.set_state(ConnectionState::Failed);
            inner.error_channels();
            inner.fail_pending(PushError::Transport(e.to_string()));
            return;
        }
    };

    tracing::info!(url = %inner.endpoint, "Connected to game server");
    inner.set_state(ConnectionState::Connected);

    let (mut write, mut read) = ws_stream.split();
    let mut heartbeat = interval_at(
        Instant::now() + inner.heartbeat_interval,
        inner.heartbeat_interval,
    );
    let mut pending_heartbeat: Option<String> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Disconnect requested");
                // Frames queued before the disconnect (e.g. a leave) still go out.
                while let Ok(frame) = outbound.try_recv() {
                    match frame.encode() {
                        Ok(text) => {
                            if let Err(e) = write.send(Message::Text(text)).await {
                                tracing::warn!("Failed to flush frame on disconnect: {}", e);
                                break;
                            }
                        }
                        Err(e) => tracing::error!("Failed to serialize frame: {}", e),
                    }
                }
                let _ = write.send(Message::Close(None)).await;
                break;
            }

            Some(frame) = outbound.recv() => {
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to serialize frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text)).await {
                    tracing::error!("Failed to send frame: {}", e);
                    break;
                }
            }

            _ = heartbeat.tick() => {
                if let Some(stale) = pending_heartbeat.take() {
                    tracing::warn!(msg_ref = %stale, "Heartbeat timeout, closing connection");
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
                let msg_ref = inner.next_ref();
                let text = match Frame::heartbeat(msg_ref.clone()).encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to serialize heartbeat: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text)).await {
                    tracing::error!("Failed to send heartbeat: {}", e);
                    break;
                }
                pending_heartbeat = Some(msg_ref);
            }

            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => inner.handle_text(&text, &mut pending_heartbeat),
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    }

    inner.set_state(ConnectionState::Disconnected);
    inner.error_channels();
    inner.fail_pending(PushError::Closed);
}

/// Opens [`PhoenixSocket`]s against a fixed server URL.
#[derive(Debug, Clone)]
pub struct PhoenixSocketFactory {
    base_url: String,
    heartbeat_interval: Duration,
    timeout: Duration,
}

impl PhoenixSocketFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            timeout: DEFAULT_PUSH_TIMEOUT,
        }
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SocketFactory for PhoenixSocketFactory {
    fn open(&self, options: ConnectOptions) -> Result<Arc<dyn SocketPort>, TransportError> {
        let socket = PhoenixSocket::new(
            &self.base_url,
            &options,
            self.heartbeat_interval,
            self.timeout,
        )?;
        tracing::debug!(url = %socket.endpoint(), "Opened socket");
        Ok(Arc::new(socket))
    }
}
