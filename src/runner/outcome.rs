//! Result of one cancellable call.

use thiserror::Error;

use crate::context::ContextError;

/// Errors produced by the outbound call itself.
#[derive(Debug, Error)]
pub enum CallError {
    /// DNS, connect or IO failure talking to the upstream.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// The upstream body was not the expected JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The call observed its abort signal and stopped.
    #[error("call aborted")]
    Aborted,

    /// The background task ended without reporting (it panicked).
    #[error("background call ended without reporting a result")]
    Lost,
}

/// Exactly one of these is produced per runner invocation.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The call completed first and succeeded.
    Success(T),
    /// The call completed first and failed.
    Failure(CallError),
    /// The context fired first; the call was aborted and drained.
    Cancelled(ContextError),
}

impl<T> Outcome<T> {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Failure(_) => "failure",
            Outcome::Cancelled(_) => "cancelled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled(_))
    }
}
