//! Request-scoped deadline contexts.
//!
//! # Data Flow
//! ```text
//! Context::background()            (process-wide, never cancelled)
//!     → with_timeout(50ms)         (per request; spawns a timer task)
//!     → with_value(CLIENT_IP, ip)  (shares cancellation, adds a value)
//!     → passed by reference to the call runner
//!     → Canceler dropped when the handler returns (timer released)
//! ```
//!
//! # Design Decisions
//! - Cancellation is monotonic: parents cancel children, never the reverse
//! - A fired context stays fired; `err()` never goes back to `None`
//! - Values are an immutable linked list; deriving never mutates the parent
//! - The `Canceler` owns the release obligation and fires on `Drop`

pub mod deadline;
pub mod values;

pub use deadline::{Canceler, Context, ContextError};
pub use values::{Key, ValueError};
