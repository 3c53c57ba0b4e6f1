//! Cancellable call runner.
//!
//! # Data Flow
//! ```text
//! race(ctx, operation)
//!     → tokio::spawn(operation(abort))  ──▶ oneshot tx (written once)
//!     → select! { oneshot rx, ctx.done() }
//!         rx first   → Success / Failure
//!         ctx first  → abort.cancel() → rx.await (drain) → Cancelled(ctx.err())
//! ```

pub mod abort;
pub mod call;
pub mod outcome;

pub use abort::AbortSignal;
pub use call::{race, CallRunner};
pub use outcome::{CallError, Outcome};
