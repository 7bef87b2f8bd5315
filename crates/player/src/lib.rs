//! Islands Player - game session client for the Phoenix channel backend.
//!
//! A [`GameSession`] connects a socket, subscribes to `game:<suffix>`, joins it
//! and pushes game messages. Every operation returns immediately with an
//! [`Outcome`]; replies are logged and can also be awaited.
//!
//! ```ignore
//! let config = PlayerConfig::from_env();
//! let mut session = GameSession::new(Arc::new(config.socket_factory()));
//! session.start(&config.player_name, &config.topic_suffix)?;
//! session.say_hello("Hello, world!")?;
//! ```

pub mod application;
pub mod infrastructure;
pub mod ports;

pub use application::{GameSession, Operation, OperationFailure, Outcome, SessionError};
pub use infrastructure::{PhoenixSocket, PhoenixSocketFactory, PlayerConfig};
pub use islands_protocol::{PlayerInfo, Topic};
pub use ports::outbound::{ConnectOptions, PushError};
