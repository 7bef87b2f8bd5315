//! Islands Protocol - wire types for the Phoenix channel game backend
//!
//! This crate contains the vocabulary the player client speaks on the socket:
//! - Phoenix V2 frames (`[join_ref, ref, topic, event, payload]`)
//! - Topic naming for game channels
//! - Typed game messages (`hello`, `new_game`, `add_player`)
//! - Reply envelopes (`phx_reply` with `status` + `response`)
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No transport** - Nothing here touches a socket

pub mod frame;
pub mod messages;
pub mod topic;

// =============================================================================
// Frame Types
// =============================================================================
pub use frame::{events, Frame, FrameError, Reply, ReplyStatus};

// =============================================================================
// Message Types
// =============================================================================
pub use messages::{GameMessage, JoinParams, PlayerInfo};

// =============================================================================
// Topic Types
// =============================================================================
pub use topic::{Topic, GAME_TOPIC_PREFIX, PHOENIX_TOPIC};
