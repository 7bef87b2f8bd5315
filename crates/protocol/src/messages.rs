//! Game messages pushed by the player onto a game channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Join Metadata
// =============================================================================

/// Metadata sent with `phx_join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinParams {
    pub screen_name: String,
}

impl JoinParams {
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
        }
    }

    pub fn to_payload(&self) -> Value {
        serde_json::json!({ "screen_name": self.screen_name })
    }
}

// =============================================================================
// Player Info
// =============================================================================

/// Arbitrary player description forwarded with `add_player`.
///
/// The client does not interpret the fields; the server decides what it accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerInfo(Map<String, Value>);

impl PlayerInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for PlayerInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// =============================================================================
// Game Messages (Player → Channel)
// =============================================================================

/// Messages the player pushes on a joined game channel.
#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    /// Greeting echoed back by the server
    Hello { message: String },
    /// Ask the server to start a new game on this channel
    NewGame,
    /// Register another player in the game
    AddPlayer(PlayerInfo),
}

impl GameMessage {
    pub const HELLO: &'static str = "hello";
    pub const NEW_GAME: &'static str = "new_game";
    pub const ADD_PLAYER: &'static str = "add_player";

    pub fn event_name(&self) -> &'static str {
        match self {
            GameMessage::Hello { .. } => Self::HELLO,
            GameMessage::NewGame => Self::NEW_GAME,
            GameMessage::AddPlayer(_) => Self::ADD_PLAYER,
        }
    }

    /// Payload as sent on the wire. `new_game` carries an empty object.
    pub fn payload(&self) -> Value {
        match self {
            GameMessage::Hello { message } => serde_json::json!({ "message": message }),
            GameMessage::NewGame => Value::Object(Map::new()),
            GameMessage::AddPlayer(player) => player.clone().into_value(),
        }
    }

    /// Split into `(event, payload)` for a channel push.
    pub fn into_parts(self) -> (&'static str, Value) {
        let event = self.event_name();
        let payload = match self {
            GameMessage::AddPlayer(player) => player.into_value(),
            other => other.payload(),
        };
        (event, payload)
    }
}
