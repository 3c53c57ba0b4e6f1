//! Abort signal handed to a background call.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::runner::outcome::CallError;

/// Best-effort abort request from the runner to its background call.
///
/// The call stays responsible for reporting completion; aborting only asks it
/// to stop early.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Whether the runner has asked for an abort.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the runner asks for an abort.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }

    /// Drive `call` until it completes or the abort fires.
    ///
    /// On abort the in-flight future is dropped, which closes any connection
    /// it held, and `CallError::Aborted` is returned.
    pub async fn or_abort<F, T>(&self, call: F) -> Result<T, CallError>
    where
        F: Future<Output = Result<T, CallError>>,
    {
        tokio::select! {
            result = call => result,
            _ = self.token.cancelled() => Err(CallError::Aborted),
        }
    }
}
