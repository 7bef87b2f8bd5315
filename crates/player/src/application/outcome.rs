//! Operation outcomes.
//!
//! Each session operation spawns a task that waits for the server reply, logs
//! it, and hands the result to whoever holds the [`Outcome`]. Dropping the
//! outcome only discards the result; the log line is still written.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::application::error::OperationFailure;
use crate::ports::outbound::{PushReceipt, PushResult};

static NULL: Value = Value::Null;

/// The channel operations a session can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Join,
    Leave,
    Hello,
    NewGame,
    AddPlayer,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Join => "join",
            Operation::Leave => "leave",
            Operation::Hello => "hello",
            Operation::NewGame => "new_game",
            Operation::AddPlayer => "add_player",
        }
    }

    fn success_text(self) -> Option<&'static str> {
        match self {
            Operation::Join => Some("Joined successfully!"),
            Operation::Leave => Some("Left successfully"),
            Operation::Hello => Some("Hello"),
            Operation::NewGame => Some("New game created!"),
            Operation::AddPlayer => None,
        }
    }

    fn failure_text(self) -> &'static str {
        match self {
            Operation::Join => "Unable to join",
            Operation::Leave => "Unable to leave",
            Operation::Hello => "Unable to say hello to the channel.",
            Operation::NewGame => "Unable to start a new game.",
            Operation::AddPlayer => "Unable to add new player",
        }
    }

    /// The part of a response worth logging. Greetings only show the echoed message.
    fn loggable<'a>(self, response: &'a Value) -> &'a Value {
        match self {
            Operation::Hello => response.get("message").unwrap_or(&NULL),
            _ => response,
        }
    }

    fn log_success(self, response: &Value) {
        if let Some(text) = self.success_text() {
            tracing::info!(
                operation = %self,
                response = %self.loggable(response),
                "{}",
                text
            );
        }
    }

    fn log_failure(self, failure: &OperationFailure) {
        match failure.response() {
            Some(response) => tracing::warn!(
                operation = %self,
                response = %self.loggable(response),
                "{}",
                self.failure_text()
            ),
            None => tracing::warn!(
                operation = %self,
                error = %failure,
                "{}",
                self.failure_text()
            ),
        }
    }

    /// Log a reply and convert it into the operation's result.
    pub fn report(self, result: PushResult) -> Result<Value, OperationFailure> {
        match result {
            Ok(response) => {
                self.log_success(&response);
                Ok(response)
            }
            Err(error) => {
                let failure = OperationFailure::from_push(self, error);
                self.log_failure(&failure);
                Err(failure)
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Awaitable result of a session operation.
#[derive(Debug)]
pub struct Outcome {
    operation: Operation,
    handle: JoinHandle<Result<Value, OperationFailure>>,
}

impl Outcome {
    /// Spawn the reporting task for `receipt` on `runtime`.
    pub(crate) fn spawn(runtime: &Handle, operation: Operation, receipt: PushReceipt) -> Self {
        let handle = runtime.spawn(async move { operation.report(receipt.await) });
        Self { operation, handle }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Future for Outcome {
    type Output = Result<Value, OperationFailure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let operation = self.operation;
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(OperationFailure::Aborted { operation })),
            Poll::Pending => Poll::Pending,
        }
    }
}
