//! Phoenix channel bound to a [`PhoenixSocket`](super::PhoenixSocket).

use std::sync::{Arc, Mutex};

use islands_protocol::{events, Frame, JoinParams, Topic};
use serde_json::{json, Value};

use super::core::lock;
use super::socket::SocketInner;
use crate::ports::outbound::{ChannelPort, ChannelState, PushError, PushReceipt};

/// Channel state the socket can reach for routing.
pub(crate) struct ChannelShared {
    topic: Topic,
    params: JoinParams,
    state: Mutex<ChannelState>,
    join_ref: Mutex<Option<String>>,
}

impl ChannelShared {
    pub(crate) fn new(topic: Topic, params: JoinParams) -> Self {
        Self {
            topic,
            params,
            state: Mutex::new(ChannelState::Closed),
            join_ref: Mutex::new(None),
        }
    }

    pub(crate) fn topic(&self) -> &Topic {
        &self.topic
    }

    fn state(&self) -> ChannelState {
        *lock(&self.state)
    }

    fn set_state(&self, state: ChannelState) {
        *lock(&self.state) = state;
    }

    fn join_ref(&self) -> Option<String> {
        lock(&self.join_ref).clone()
    }

    /// Apply a join reply, unless a leave or a newer join superseded it.
    fn settle_join(&self, join_ref: &str, joined: bool) {
        let current = lock(&self.join_ref).as_deref() == Some(join_ref);
        let mut state = lock(&self.state);
        if current && *state == ChannelState::Joining {
            *state = if joined {
                ChannelState::Joined
            } else {
                ChannelState::Errored
            };
        } else {
            tracing::debug!(
                topic = %self.topic,
                join_ref,
                "Ignoring reply to superseded join"
            );
        }
    }

    /// Handle a non-reply frame addressed to this topic.
    pub(crate) fn on_event(&self, frame: &Frame) {
        // Frames from an earlier join of the same topic are stale.
        if frame.join_ref.is_some() && frame.join_ref != self.join_ref() {
            tracing::debug!(
                topic = %self.topic,
                event = %frame.event,
                "Dropping frame for stale join"
            );
            return;
        }

        match frame.event.as_str() {
            events::ERROR => {
                tracing::warn!(topic = %self.topic, "Channel crashed on the server");
                self.set_state(ChannelState::Errored);
            }
            events::CLOSE => {
                tracing::info!(topic = %self.topic, "Channel closed by the server");
                self.set_state(ChannelState::Closed);
            }
            event if events::is_lifecycle(event) => {
                tracing::debug!(topic = %self.topic, event, "Ignoring lifecycle event");
            }
            event => {
                tracing::debug!(
                    topic = %self.topic,
                    event,
                    payload = %frame.payload,
                    "Broadcast received"
                );
            }
        }
    }

    pub(crate) fn on_socket_closed(&self) {
        if matches!(self.state(), ChannelState::Joining | ChannelState::Joined) {
            self.set_state(ChannelState::Errored);
        }
    }
}

/// A subscription to one topic on a Phoenix socket.
pub struct PhoenixChannel {
    shared: Arc<ChannelShared>,
    socket: Arc<SocketInner>,
}

impl PhoenixChannel {
    pub(crate) fn new(shared: Arc<ChannelShared>, socket: Arc<SocketInner>) -> Self {
        Self { shared, socket }
    }

    fn frame(&self, event: &str, payload: Value, msg_ref: String) -> Frame {
        Frame::new(
            self.shared.topic.as_str(),
            event,
            payload,
            Some(msg_ref),
            self.shared.join_ref(),
        )
    }
}

impl ChannelPort for PhoenixChannel {
    fn topic(&self) -> Topic {
        self.shared.topic.clone()
    }

    fn state(&self) -> ChannelState {
        self.shared.state()
    }

    fn join(&self) -> PushReceipt {
        {
            let mut state = lock(&self.shared.state);
            if matches!(*state, ChannelState::Joining | ChannelState::Joined) {
                return PushReceipt::ready(Err(PushError::AlreadyJoined));
            }
            *state = ChannelState::Joining;
        }

        // The join push's ref doubles as the join_ref for everything after it.
        let msg_ref = self.socket.next_ref();
        *lock(&self.shared.join_ref) = Some(msg_ref.clone());
        let frame = self.frame(events::JOIN, self.shared.params.to_payload(), msg_ref.clone());

        let (tx, receipt) = PushReceipt::channel();
        let shared = Arc::clone(&self.shared);
        self.socket.push(
            frame,
            Box::new(move |result| {
                shared.settle_join(&msg_ref, result.is_ok());
                let _ = tx.send(result);
            }),
        );
        receipt
    }

    fn leave(&self) -> PushReceipt {
        let was_joined = self.shared.state() == ChannelState::Joined;
        self.shared.set_state(ChannelState::Leaving);

        let msg_ref = self.socket.next_ref();
        let frame = self.frame(events::LEAVE, json!({}), msg_ref);
        // Late replies and broadcasts for the old join no longer apply.
        *lock(&self.shared.join_ref) = None;

        if !was_joined {
            // Nothing to leave on the server side; resolve locally.
            self.socket.push_unobserved(frame);
            self.shared.set_state(ChannelState::Closed);
            return PushReceipt::ready(Ok(json!({})));
        }

        let (tx, receipt) = PushReceipt::channel();
        let shared = Arc::clone(&self.shared);
        self.socket.push(
            frame,
            Box::new(move |result| {
                shared.set_state(ChannelState::Closed);
                let _ = tx.send(result);
            }),
        );
        receipt
    }

    fn push(&self, event: &str, payload: Value) -> PushReceipt {
        let frame = self.frame(event, payload, self.socket.next_ref());
        let (tx, receipt) = PushReceipt::channel();
        self.socket.push(
            frame,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        receipt
    }
}
