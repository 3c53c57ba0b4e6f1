//! Deadline and cancellation propagation.
//!
//! # Responsibilities
//! - Carry a cancellation signal and optional deadline across call boundaries
//! - Fire automatically when the deadline elapses (timer task)
//! - Remember why the context fired (`DeadlineExceeded` vs `Canceled`)
//! - Resolve request-scoped values by key
//!
//! Contexts are cheap to clone and are always passed by parameter.

use std::any::Any;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::context::values::{Entry, Key, ValueError};

/// Why a context stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The owning `Canceler` fired (explicitly or on drop).
    #[error("context canceled")]
    Canceled,

    /// The deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// One cancellation scope. Every `with_cancel`/`with_timeout` creates a new
/// scope whose token is a child of the parent scope's token.
struct Scope {
    token: CancellationToken,
    cause: OnceLock<ContextError>,
    deadline: Option<Instant>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    fn root() -> Self {
        Self {
            token: CancellationToken::new(),
            cause: OnceLock::new(),
            deadline: None,
            parent: None,
        }
    }

    fn child(parent: &Arc<Scope>, deadline: Option<Instant>) -> Self {
        Self {
            token: parent.token.child_token(),
            cause: OnceLock::new(),
            deadline,
            parent: Some(Arc::clone(parent)),
        }
    }

    /// Fire this scope. A scope already cancelled through its parent keeps
    /// the parent's cause.
    fn fire(&self, cause: ContextError) {
        if self.token.is_cancelled() {
            return;
        }
        let _ = self.cause.set(cause);
        self.token.cancel();
    }

    fn err(&self) -> Option<ContextError> {
        if !self.token.is_cancelled() {
            return None;
        }
        if let Some(cause) = self.cause.get() {
            return Some(*cause);
        }
        match &self.parent {
            Some(parent) => parent.err().or(Some(ContextError::Canceled)),
            None => Some(ContextError::Canceled),
        }
    }
}

/// A request-scoped cancellation token with an optional deadline and
/// immutable attached values.
#[derive(Clone)]
pub struct Context {
    scope: Arc<Scope>,
    values: Option<Arc<Entry>>,
}

impl Context {
    /// The root context: never cancelled, no deadline, no values.
    pub fn background() -> Self {
        Self {
            scope: Arc::new(Scope::root()),
            values: None,
        }
    }

    /// Derive a context that is cancelled when the returned [`Canceler`]
    /// fires or when `self` is cancelled.
    pub fn with_cancel(&self) -> (Context, Canceler) {
        self.derive(self.scope.deadline)
    }

    /// Derive a context that fires after `timeout`.
    ///
    /// A timeout too large to represent as an instant never fires on its own;
    /// the child still inherits the parent's deadline and cancellation.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> (Context, Canceler) {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.with_cancel(),
        }
    }

    /// Derive a context that fires at `deadline`, or at the parent's deadline
    /// if that is earlier.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_deadline(&self, deadline: Instant) -> (Context, Canceler) {
        if let Some(inherited) = self.scope.deadline {
            if inherited <= deadline {
                return self.with_cancel();
            }
        }

        let (ctx, canceler) = self.derive(Some(deadline));
        if deadline <= Instant::now() {
            ctx.scope.fire(ContextError::DeadlineExceeded);
            return (ctx, canceler);
        }

        let scope = Arc::clone(&ctx.scope);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    scope.fire(ContextError::DeadlineExceeded);
                }
                _ = scope.token.cancelled() => {}
            }
        });

        (ctx, canceler)
    }

    /// Derive a context that additionally resolves `key` to `value`.
    /// Cancellation is shared with `self`.
    pub fn with_value<T>(&self, key: Key, value: T) -> Context
    where
        T: Any + Send + Sync,
    {
        Self {
            scope: Arc::clone(&self.scope),
            values: Some(Entry::push(self.values.clone(), key, value)),
        }
    }

    /// Look up the value attached under `key`.
    pub fn value<T>(&self, key: Key) -> Result<&T, ValueError>
    where
        T: Any + Send + Sync,
    {
        Entry::lookup(self.values.as_deref(), key)
    }

    /// The instant at which this context fires on its own, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.scope.deadline
    }

    /// Time left before the deadline, `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.scope
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Resolves once the context is cancelled or expired.
    pub fn done(&self) -> WaitForCancellationFuture<'_> {
        self.scope.token.cancelled()
    }

    /// Whether the context has fired.
    pub fn is_done(&self) -> bool {
        self.scope.token.is_cancelled()
    }

    /// `None` while live, otherwise the reason the context fired.
    pub fn err(&self) -> Option<ContextError> {
        self.scope.err()
    }

    fn derive(&self, deadline: Option<Instant>) -> (Context, Canceler) {
        let scope = Arc::new(Scope::child(&self.scope, deadline));
        let canceler = Canceler {
            scope: Arc::clone(&scope),
        };
        let ctx = Self {
            scope,
            values: self.values.clone(),
        };
        (ctx, canceler)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.scope.deadline)
            .field("err", &self.err())
            .finish_non_exhaustive()
    }
}

/// Release handle for a derived context.
///
/// Cancels the context (and stops its timer task) on [`cancel`](Self::cancel)
/// or when dropped, whichever comes first. Calling `cancel` again is a no-op.
pub struct Canceler {
    scope: Arc<Scope>,
}

impl Canceler {
    /// Cancel the context with [`ContextError::Canceled`].
    pub fn cancel(&self) {
        self.scope.fire(ContextError::Canceled);
    }
}

impl Drop for Canceler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Canceler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canceler")
            .field("fired", &self.scope.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    const CLIENT: Key = Key::new("client");
    const OTHER: Key = Key::new("other");

    #[test]
    fn background_never_fires() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert_eq!(ctx.err(), None);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.remaining(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_deadline_exceeded() {
        let start = Instant::now();
        let (ctx, _cancel) = Context::background().with_timeout(Duration::from_millis(50));
        assert_eq!(ctx.err(), None);

        ctx.done().await;

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_timeout_has_no_deadline() {
        let (ctx, cancel) = Context::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(!ctx.is_done());

        let (parent, _parent_cancel) = Context::background().with_timeout(Duration::from_millis(50));
        let (child, _child_cancel) = parent.with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());

        child.done().await;
        assert_eq!(child.err(), Some(ContextError::DeadlineExceeded));

        cancel.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_fires_before_deadline() {
        let (ctx, cancel) = Context::background().with_timeout(Duration::from_secs(10));
        cancel.cancel();

        assert!(ctx.is_done());
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (ctx, cancel) = Context::background().with_timeout(Duration::from_millis(50));
        cancel.cancel();
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_expiry_keeps_deadline_cause() {
        let (ctx, cancel) = Context::background().with_timeout(Duration::from_millis(10));
        ctx.done().await;
        cancel.cancel();

        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn dropping_canceler_releases_context() {
        let (ctx, cancel) = Context::background().with_timeout(Duration::from_secs(60));
        {
            let _scoped = cancel;
        }
        assert!(ctx.is_done());
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[tokio::test]
    async fn zero_timeout_is_already_expired() {
        let (ctx, _cancel) = Context::background().with_timeout(Duration::ZERO);
        assert!(ctx.is_done());
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn child_of_cancelled_parent_is_cancelled() {
        let (parent, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let (child, _child_cancel) = parent.with_timeout(Duration::from_secs(5));
        assert!(child.is_done());
        assert_eq!(child.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_expiry_propagates_to_children() {
        let (parent, _cancel) = Context::background().with_timeout(Duration::from_millis(20));
        let (child, _child_cancel) = parent.with_cancel();
        let valued = child.with_value(CLIENT, 7u32);

        valued.done().await;

        assert_eq!(child.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(valued.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn child_cancel_does_not_touch_parent() {
        let (parent, _cancel) = Context::background().with_cancel();
        let (child, child_cancel) = parent.with_cancel();
        child_cancel.cancel();

        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn child_inherits_earlier_parent_deadline() {
        let (parent, _cancel) = Context::background().with_timeout(Duration::from_millis(50));
        let (child, _child_cancel) = parent.with_timeout(Duration::from_secs(10));

        assert_eq!(child.deadline(), parent.deadline());
        child.done().await;
        assert_eq!(child.err(), Some(ContextError::DeadlineExceeded));
    }

    #[test]
    fn value_lookup() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let ctx = Context::background().with_value(CLIENT, ip);

        assert_eq!(ctx.value::<IpAddr>(CLIENT), Ok(&ip));
        assert_eq!(
            ctx.value::<IpAddr>(OTHER),
            Err(ValueError::NotFound(OTHER))
        );
        assert!(matches!(
            ctx.value::<String>(CLIENT),
            Err(ValueError::WrongType { key, .. }) if key == CLIENT
        ));
    }

    #[test]
    fn derived_values_shadow_without_mutating_parent() {
        let parent = Context::background().with_value(CLIENT, 1u32);
        let child = parent.with_value(CLIENT, 2u32).with_value(OTHER, "x");

        assert_eq!(parent.value::<u32>(CLIENT), Ok(&1));
        assert_eq!(child.value::<u32>(CLIENT), Ok(&2));
        assert_eq!(child.value::<&str>(OTHER), Ok(&"x"));
        assert!(parent.value::<&str>(OTHER).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn attached_values_do_not_change_timing() {
        let start = Instant::now();
        let (ctx, _cancel) = Context::background().with_timeout(Duration::from_millis(50));
        let valued = ctx.with_value(CLIENT, IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert_eq!(valued.deadline(), ctx.deadline());
        valued.done().await;

        assert!(ctx.is_done());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50) && elapsed < Duration::from_millis(52));
    }

    #[tokio::test]
    async fn values_survive_derivation_of_new_scopes() {
        let parent = Context::background().with_value(CLIENT, 9u8);
        let (child, _cancel) = parent.with_timeout(Duration::from_secs(1));
        assert_eq!(child.value::<u8>(CLIENT), Ok(&9));
    }
}
