//! Game session - owns one socket and one game channel subscription.
//!
//! Operations return as soon as the request is queued. Their replies are
//! logged by a background task and are also available through the returned
//! [`Outcome`]. Nothing here retries or reconnects.
//!
//! Channel operations spawn onto the current tokio runtime; called outside
//! one they fail with [`SessionError::NoRuntime`] before anything is sent.

use std::sync::Arc;

use islands_protocol::{GameMessage, JoinParams, PlayerInfo, Topic};
use tokio::runtime::Handle;

use crate::application::error::SessionError;
use crate::application::outcome::{Operation, Outcome};
use crate::ports::outbound::{ChannelPort, ConnectOptions, PushReceipt, SocketFactory, SocketPort};

/// A single player's connection to a game channel.
pub struct GameSession {
    factory: Arc<dyn SocketFactory>,
    connection: Option<Arc<dyn SocketPort>>,
    subscription: Option<Arc<dyn ChannelPort>>,
}

impl GameSession {
    pub fn new(factory: Arc<dyn SocketFactory>) -> Self {
        Self {
            factory,
            connection: None,
            subscription: None,
        }
    }

    pub fn connection(&self) -> Option<&Arc<dyn SocketPort>> {
        self.connection.as_ref()
    }

    pub fn subscription(&self) -> Option<&Arc<dyn ChannelPort>> {
        self.subscription.as_ref()
    }

    /// Connect, subscribe to `game:<topic_suffix>` as `participant_name`, and join.
    ///
    /// Calling this on a running session leaves the old channel and closes the
    /// old socket before the new ones replace them.
    pub fn start(
        &mut self,
        participant_name: &str,
        topic_suffix: &str,
    ) -> Result<Outcome, SessionError> {
        self.teardown();
        self.new_connection(ConnectOptions::default())?;
        self.new_subscription(topic_suffix, participant_name)?;
        self.join()
    }

    /// Open a socket with `options` and start connecting it.
    pub fn new_connection(
        &mut self,
        options: ConnectOptions,
    ) -> Result<Arc<dyn SocketPort>, SessionError> {
        let socket = self.factory.open(options)?;
        socket.connect()?;
        self.connection = Some(Arc::clone(&socket));
        Ok(socket)
    }

    /// Create the `game:<topic_suffix>` channel on the current socket.
    pub fn new_subscription(
        &mut self,
        topic_suffix: &str,
        participant_name: &str,
    ) -> Result<Arc<dyn ChannelPort>, SessionError> {
        let socket = self.connection.as_ref().ok_or(SessionError::NoConnection)?;
        let topic = Topic::game(topic_suffix);
        tracing::debug!(topic = %topic, participant = participant_name, "Creating subscription");
        let channel = socket.channel(topic, JoinParams::new(participant_name));
        self.subscription = Some(Arc::clone(&channel));
        Ok(channel)
    }

    pub fn join(&self) -> Result<Outcome, SessionError> {
        let channel = self.require_subscription()?;
        track(Operation::Join, || channel.join())
    }

    /// Leave the topic. Allowed in any channel state; the server decides what it means.
    pub fn leave(&self) -> Result<Outcome, SessionError> {
        let channel = self.require_subscription()?;
        track(Operation::Leave, || channel.leave())
    }

    pub fn say_hello(&self, message: impl Into<String>) -> Result<Outcome, SessionError> {
        self.push(
            Operation::Hello,
            GameMessage::Hello {
                message: message.into(),
            },
        )
    }

    pub fn new_game(&self) -> Result<Outcome, SessionError> {
        self.push(Operation::NewGame, GameMessage::NewGame)
    }

    /// Only a failed `add_player` is logged.
    pub fn add_player(&self, player: PlayerInfo) -> Result<Outcome, SessionError> {
        self.push(Operation::AddPlayer, GameMessage::AddPlayer(player))
    }

    fn push(&self, operation: Operation, message: GameMessage) -> Result<Outcome, SessionError> {
        let channel = self.require_subscription()?;
        let (event, payload) = message.into_parts();
        track(operation, || channel.push(event, payload))
    }

    fn require_subscription(&self) -> Result<&Arc<dyn ChannelPort>, SessionError> {
        self.subscription.as_ref().ok_or(SessionError::NoSubscription)
    }

    fn teardown(&mut self) {
        if let Some(channel) = self.subscription.take() {
            tracing::info!(topic = %channel.topic(), "Leaving previous subscription");
            // Reply is irrelevant; the socket is closed right after.
            drop(channel.leave());
        }
        if let Some(socket) = self.connection.take() {
            tracing::info!("Closing previous connection");
            socket.disconnect();
        }
    }
}

/// Issue the request only once a runtime is known to be available for its outcome.
fn track(
    operation: Operation,
    request: impl FnOnce() -> PushReceipt,
) -> Result<Outcome, SessionError> {
    let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
    Ok(Outcome::spawn(&runtime, operation, request()))
}
