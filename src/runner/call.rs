//! Racing a background call against its context.
//!
//! # Responsibilities
//! - Spawn the outbound call on its own task with a single-slot channel
//! - Wait on the channel and the context concurrently
//! - On cancellation: abort the call, drain its channel, report `Cancelled`
//! - On completion: report `Success` or `Failure` as-is
//!
//! # Design Decisions
//! - First to resolve wins; ties go to `select!`'s random branch order
//! - The completion channel is read exactly once on every path
//! - Dropping the race future (client went away) also fires the abort
//! - Nothing is retried

use std::future::Future;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::context::{Context, ContextError};
use crate::runner::abort::AbortSignal;
use crate::runner::outcome::{CallError, Outcome};
use crate::upstream::{CallDescriptor, SearchClient, SearchResult};

type Completion<T> = Result<Result<T, CallError>, oneshot::error::RecvError>;

enum FirstEvent<T> {
    Completed(Completion<T>),
    ContextDone,
}

/// Run `operation` on a background task and race it against `ctx`.
///
/// The operation receives an [`AbortSignal`] and must report completion
/// promptly once it fires; the runner waits for that report before returning
/// `Cancelled`.
pub async fn race<T, F, Fut>(ctx: &Context, operation: F) -> Outcome<T>
where
    T: Send + 'static,
    F: FnOnce(AbortSignal) -> Fut,
    Fut: Future<Output = Result<T, CallError>> + Send + 'static,
{
    let abort = CancellationToken::new();
    let _abort_on_exit = abort.clone().drop_guard();
    let (tx, mut rx) = oneshot::channel();

    let call = operation(AbortSignal::new(abort.clone()));
    tokio::spawn(async move {
        // The receiver may already be gone if the caller was dropped.
        let _ = tx.send(call.await);
    });

    let first = tokio::select! {
        completion = &mut rx => FirstEvent::Completed(completion),
        _ = ctx.done() => FirstEvent::ContextDone,
    };

    match first {
        FirstEvent::Completed(completion) => {
            tracing::debug!("Call resolved before context");
            match completion {
                Ok(Ok(value)) => Outcome::Success(value),
                Ok(Err(e)) => Outcome::Failure(e),
                Err(_) => Outcome::Failure(CallError::Lost),
            }
        }
        FirstEvent::ContextDone => {
            abort.cancel();
            let late = rx.await;
            let err = ctx.err().unwrap_or(ContextError::Canceled);
            tracing::debug!(
                reason = %err,
                late_result_ok = matches!(late, Ok(Ok(_))),
                "Context fired before call; drained aborted call"
            );
            Outcome::Cancelled(err)
        }
    }
}

/// Runs upstream search calls under a request context.
#[derive(Debug, Clone)]
pub struct CallRunner {
    client: SearchClient,
}

impl CallRunner {
    pub fn new(client: SearchClient) -> Self {
        Self { client }
    }

    /// Execute `descriptor` against the upstream, bounded by `ctx`.
    pub async fn run(&self, ctx: &Context, descriptor: CallDescriptor) -> Outcome<SearchResult> {
        let client = self.client.clone();
        race(ctx, move |abort| async move {
            abort.or_abort(client.execute(descriptor)).await
        })
        .await
    }
}
