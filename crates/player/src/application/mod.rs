//! Application layer - the game session and its operation outcomes.

pub mod error;
pub mod outcome;
pub mod session;

pub use error::{OperationFailure, SessionError};
pub use outcome::{Operation, Outcome};
pub use session::GameSession;
