//! Request-scoped storage for the active [`SecurityContext`].
//!
//! The holder is backed by a tokio task-local. A context is only ever visible inside the
//! future (or closure) it was scoped to, and the slot is restored when that scope exits,
//! whether it completed, returned an error, panicked, or was dropped mid-flight. There is
//! no free-standing `start`/`end` pair: entering a scope is start and leaving it is end.
//!
//! ```ignore
//! let response = SecurityContextHolder::scope(ctx, async {
//!     let ctx = SecurityContextHolder::current()?;
//!     handle(&ctx).await
//! })
//! .await;
//! assert!(SecurityContextHolder::current().is_err());
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::context::SecurityContext;

tokio::task_local! {
    static CURRENT: Arc<SecurityContext>;
}

/// Returned by [`SecurityContextHolder::current`] outside of an active request scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no security context is active for the current request")]
pub struct NoActiveContext;

/// Process-wide accessor for the request's security context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityContextHolder;

impl SecurityContextHolder {
    /// Run `fut` with `context` published as the current context.
    ///
    /// # Panics
    ///
    /// Panics if a context is already active for the calling task. Starting a second
    /// context before the first ended is a pipeline ordering bug and is never silently
    /// overwritten.
    pub async fn scope<F>(context: SecurityContext, fut: F) -> F::Output
    where
        F: Future,
    {
        Self::assert_not_active();
        CURRENT.scope(Arc::new(context), fut).await
    }

    /// Blocking counterpart of [`SecurityContextHolder::scope`] for synchronous code.
    ///
    /// # Panics
    ///
    /// Panics if a context is already active on the calling thread.
    pub fn sync_scope<R>(context: SecurityContext, f: impl FnOnce() -> R) -> R {
        Self::assert_not_active();
        CURRENT.sync_scope(Arc::new(context), f)
    }

    /// The context of the request currently executing on this task.
    ///
    /// # Errors
    ///
    /// Returns [`NoActiveContext`] when called outside a request scope. An absent context
    /// is never reported as an empty or default one.
    pub fn current() -> Result<Arc<SecurityContext>, NoActiveContext> {
        CURRENT.try_with(Arc::clone).map_err(|_| NoActiveContext)
    }

    #[must_use]
    pub fn is_active() -> bool {
        CURRENT.try_with(|_| ()).is_ok()
    }

    /// Run blocking work on tokio's blocking pool with the current context carried over.
    ///
    /// The blocking thread gets its own scope, cleared when `f` returns or panics, so the
    /// pooled thread never keeps the context after the job.
    ///
    /// # Errors
    ///
    /// Returns [`NoActiveContext`] when called outside a request scope.
    pub fn spawn_blocking<F, R>(f: F) -> Result<tokio::task::JoinHandle<R>, NoActiveContext>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let context = Self::current()?;
        Ok(tokio::task::spawn_blocking(move || {
            CURRENT.sync_scope(context, f)
        }))
    }

    fn assert_not_active() {
        assert!(
            !Self::is_active(),
            "security context already active: a second context was started before the first ended"
        );
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::principal::{Principal, PrincipalClaims};
    use crate::tenant::TenantId;

    fn context(tenant: &str) -> SecurityContext {
        SecurityContext::builder(Principal::ResourceOwnerUser(PrincipalClaims::new("staff")))
            .tenant_id(TenantId::new(tenant))
            .build()
    }

    #[test]
    fn current_outside_scope_is_no_active_context() {
        assert_eq!(SecurityContextHolder::current().unwrap_err(), NoActiveContext);
        assert!(!SecurityContextHolder::is_active());
    }

    #[test]
    fn sync_scope_publishes_and_clears() {
        let tenant = SecurityContextHolder::sync_scope(context("clinicA"), || {
            SecurityContextHolder::current()
                .unwrap()
                .tenant_id()
                .to_string()
        });

        assert_eq!(tenant, "clinicA");
        assert!(SecurityContextHolder::current().is_err());
    }

    #[test]
    fn sync_scope_clears_after_panic() {
        let result = catch_unwind(AssertUnwindSafe(|| {
            SecurityContextHolder::sync_scope(context("clinicA"), || {
                panic!("business logic failed");
            });
        }));

        assert!(result.is_err());
        assert!(
            SecurityContextHolder::current().is_err(),
            "context must not survive into the next request on this thread"
        );
    }

    #[test]
    fn nested_sync_scope_is_fatal() {
        let result = catch_unwind(AssertUnwindSafe(|| {
            SecurityContextHolder::sync_scope(context("clinicA"), || {
                SecurityContextHolder::sync_scope(context("clinicB"), || ());
            });
        }));

        assert!(result.is_err());
        assert!(!SecurityContextHolder::is_active());
    }

    #[tokio::test]
    async fn async_scope_publishes_and_clears() {
        let tenant = SecurityContextHolder::scope(context("clinicA"), async {
            tokio::task::yield_now().await;
            SecurityContextHolder::current()
                .unwrap()
                .tenant_id()
                .to_string()
        })
        .await;

        assert_eq!(tenant, "clinicA");
        assert!(SecurityContextHolder::current().is_err());
    }

    #[tokio::test]
    async fn async_scope_clears_when_future_is_dropped() {
        let fut = SecurityContextHolder::scope(context("clinicA"), async {
            std::future::pending::<()>().await;
        });
        let aborted = tokio::time::timeout(std::time::Duration::from_millis(10), fut).await;

        assert!(aborted.is_err());
        assert!(SecurityContextHolder::current().is_err());
    }

    #[tokio::test]
    async fn nested_async_scope_is_fatal() {
        let joined = tokio::spawn(SecurityContextHolder::scope(context("clinicA"), async {
            SecurityContextHolder::scope(context("clinicB"), async {}).await;
        }))
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert!(!SecurityContextHolder::is_active());
    }

    #[tokio::test]
    async fn spawned_tasks_do_not_inherit_context() {
        let seen = SecurityContextHolder::scope(context("clinicA"), async {
            tokio::spawn(async { SecurityContextHolder::is_active() })
                .await
                .unwrap()
        })
        .await;

        assert!(!seen);
    }

    #[tokio::test]
    async fn spawn_blocking_carries_context() {
        let tenant = SecurityContextHolder::scope(context("clinicA"), async {
            SecurityContextHolder::spawn_blocking(|| {
                SecurityContextHolder::current()
                    .unwrap()
                    .tenant_id()
                    .to_string()
            })
            .unwrap()
            .await
            .unwrap()
        })
        .await;

        assert_eq!(tenant, "clinicA");
    }

    #[tokio::test]
    async fn spawn_blocking_outside_scope_is_rejected() {
        assert!(SecurityContextHolder::spawn_blocking(|| ()).is_err());
    }
}
