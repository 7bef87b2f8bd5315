//! Session error types.

use serde_json::Value;
use thiserror::Error;

use crate::application::outcome::Operation;
use crate::ports::outbound::{PushError, TransportError};

/// Local precondition failures, returned synchronously by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active connection; call start or new_connection first")]
    NoConnection,

    #[error("No active subscription; call start or new_subscription first")]
    NoSubscription,

    #[error("Channel operations need a running tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Terminal failure of a join, leave or push, as reported by the backend.
///
/// These are never raised at the call site. They are logged and delivered
/// through the operation's [`Outcome`](crate::application::Outcome).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationFailure {
    /// The server refused the join; carries its response
    #[error("Join rejected: {0}")]
    JoinRejected(Value),

    /// The server refused a leave or push; carries its response
    #[error("{operation} rejected: {response}")]
    OperationRejected { operation: Operation, response: Value },

    /// No reply was received (timeout, closed socket, not connected)
    #[error("{operation} failed: {error}")]
    Transport {
        operation: Operation,
        error: PushError,
    },

    /// The task waiting for the reply was aborted
    #[error("{operation} aborted")]
    Aborted { operation: Operation },
}

impl OperationFailure {
    pub fn from_push(operation: Operation, error: PushError) -> Self {
        match (operation, error) {
            (Operation::Join, PushError::Rejected(response)) => {
                OperationFailure::JoinRejected(response)
            }
            (operation, PushError::Rejected(response)) => {
                OperationFailure::OperationRejected {
                    operation,
                    response,
                }
            }
            (operation, error) => OperationFailure::Transport { operation, error },
        }
    }

    /// Server response payload, when the server answered at all.
    pub fn response(&self) -> Option<&Value> {
        match self {
            OperationFailure::JoinRejected(response)
            | OperationFailure::OperationRejected { response, .. } => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejected_join_maps_to_join_rejected() {
        let failure =
            OperationFailure::from_push(Operation::Join, PushError::Rejected(json!({"reason": "x"})));
        assert_eq!(failure, OperationFailure::JoinRejected(json!({"reason": "x"})));
        assert_eq!(failure.response(), Some(&json!({"reason": "x"})));
    }

    #[test]
    fn rejected_push_maps_to_operation_rejected() {
        let failure =
            OperationFailure::from_push(Operation::NewGame, PushError::Rejected(json!({})));
        assert!(matches!(
            failure,
            OperationFailure::OperationRejected {
                operation: Operation::NewGame,
                ..
            }
        ));
    }

    #[test]
    fn timeouts_are_transport_failures() {
        let failure = OperationFailure::from_push(Operation::Leave, PushError::Timeout);
        assert_eq!(failure.response(), None);
        assert_eq!(failure.to_string(), "leave failed: Timed out waiting for reply");
    }
}
