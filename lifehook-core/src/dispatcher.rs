// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Execution strategies for the hook registry.
//!
//! Every strategy funnels each hook through the same path: an eligibility
//! check that may end in a skip notification, then observer start, the hook
//! body, a metrics record, observer end and observer error on failure.
//!
//! Errors from hook bodies never stop sibling hooks (except under
//! [`HookRegistry::execute_with_retry`], which retries the whole list). The
//! caller receives only the last error seen; per-hook detail is available
//! through the observer and metrics. A dispatch cut short by cancellation
//! returns [`HookError::Cancelled`].
//!
//! | strategy | runs on | ordering |
//! |---|---|---|
//! | `execute` / `execute_sequential` | caller thread | ascending priority |
//! | `execute_async` | blocking pool | ascending priority |
//! | `execute_parallel` | one blocking task per hook | none |
//! | `execute_with_timeout` | blocking pool, raced against a timer | ascending priority |
//! | `execute_with_retry` | caller task | ascending priority |

use crate::context::HookContext;
use crate::error::{HookError, HookResult};
use crate::hook::{Hook, SharedHook};
use crate::observer::{HookObserver, SkipReason};
use crate::registry::{HookRegistry, RegistryInner};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Keeps the in-flight count raised while a background dispatch runs.
struct InFlightGuard {
    inner: Arc<RegistryInner>,
}

impl InFlightGuard {
    fn new(inner: Arc<RegistryInner>) -> Self {
        inner.in_flight.fetch_add(1, Ordering::AcqRel);
        Self { inner }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff.saturating_mul(attempt.saturating_add(1))
}

fn skip_reason(hook: &dyn Hook, ctx: &HookContext) -> Option<SkipReason> {
    if !hook.is_enabled() {
        Some(SkipReason::Disabled)
    } else if !hook.should_execute(ctx) {
        Some(SkipReason::ConditionNotMet)
    } else {
        None
    }
}

impl HookRegistry {
    /// Run the hooks registered for `ctx.event` on the calling thread.
    ///
    /// The hook list is copied before any hook runs; hooks registered or
    /// removed during the dispatch do not affect it.
    pub fn execute(&self, ctx: &HookContext) -> HookResult<()> {
        let hooks = self.get_hooks(&ctx.event);
        if hooks.is_empty() {
            return Ok(());
        }
        debug!(event = %ctx.event, hooks = hooks.len(), "Dispatching event");
        self.execute_sequential(&hooks, ctx)
    }

    /// Run [`execute`](Self::execute) on the blocking pool.
    ///
    /// The dispatch counts as in flight for [`shutdown`](Self::shutdown)
    /// until it finishes. Must be called from within a Tokio runtime.
    pub fn execute_async(&self, ctx: Arc<HookContext>) -> JoinHandle<HookResult<()>> {
        let registry = self.clone();
        let guard = InFlightGuard::new(self.inner.clone());
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            registry.execute(&ctx)
        })
    }

    /// Run an explicit hook list in order on the calling thread.
    ///
    /// Once the context is cancelled the remaining hooks are skipped and
    /// [`HookError::Cancelled`] is returned.
    pub fn execute_sequential(&self, hooks: &[SharedHook], ctx: &HookContext) -> HookResult<()> {
        self.run_sequential(hooks, ctx, ctx.cancellation_token())
    }

    fn run_sequential(
        &self,
        hooks: &[SharedHook],
        ctx: &HookContext,
        cancel: &CancellationToken,
    ) -> HookResult<()> {
        let observer = self.observer();
        let mut last_error = None;

        for (index, hook) in hooks.iter().enumerate() {
            if cancel.is_cancelled() {
                for rest in &hooks[index..] {
                    observer.on_hook_skip(rest.name(), ctx, SkipReason::Cancelled.as_str());
                }
                let skipped = hooks.len() - index;
                debug!(event = %ctx.event, skipped, "Dispatch cancelled");
                return Err(HookError::Cancelled { skipped });
            }

            if let Some(reason) = skip_reason(hook.as_ref(), ctx) {
                observer.on_hook_skip(hook.name(), ctx, reason.as_str());
                continue;
            }

            if let Err(e) = self.invoke(hook.as_ref(), ctx, observer.as_ref()) {
                last_error = Some(e);
            }
        }

        last_error.map_or(Ok(()), Err)
    }

    /// Run every eligible hook concurrently, one blocking task each.
    ///
    /// No ordering is guaranteed. When several hooks fail, the error of the
    /// one that finished last is returned.
    pub async fn execute_parallel(
        &self,
        hooks: Vec<SharedHook>,
        ctx: Arc<HookContext>,
    ) -> HookResult<()> {
        let observer = self.observer();
        let mut tasks = JoinSet::new();

        for hook in hooks {
            if let Some(reason) = skip_reason(hook.as_ref(), &ctx) {
                observer.on_hook_skip(hook.name(), &ctx, reason.as_str());
                continue;
            }
            let registry = self.clone();
            let observer = observer.clone();
            let ctx = ctx.clone();
            tasks.spawn_blocking(move || registry.invoke(hook.as_ref(), &ctx, observer.as_ref()));
        }

        let mut last_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => last_error = Some(e),
                Err(e) => {
                    warn!(event = %ctx.event, error = %e, "Parallel hook task failed");
                    last_error = Some(HookError::Panicked(e.to_string()));
                }
            }
        }

        last_error.map_or(Ok(()), Err)
    }

    /// Run the hooks sequentially on the blocking pool, giving up after
    /// `timeout`.
    ///
    /// The dispatch runs under a child of the context's token. On expiry
    /// only that child is cancelled: hooks not yet started are skipped, a
    /// hook body already running is left to finish, and the context's own
    /// token stays live for later dispatches.
    pub async fn execute_with_timeout(
        &self,
        hooks: Vec<SharedHook>,
        ctx: Arc<HookContext>,
        timeout: Duration,
    ) -> HookResult<()> {
        let registry = self.clone();
        let task_ctx = ctx.clone();
        let dispatch = ctx.cancellation_token().child_token();
        let task_cancel = dispatch.clone();
        let task = tokio::task::spawn_blocking(move || {
            registry.run_sequential(&hooks, &task_ctx, &task_cancel)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(HookError::Panicked(e.to_string())),
            Err(_) => {
                dispatch.cancel();
                warn!(event = %ctx.event, timeout = ?timeout, "Hook execution timed out");
                Err(HookError::Timeout(timeout))
            }
        }
    }

    /// [`execute_with_timeout`](Self::execute_with_timeout) with the
    /// configured `default_timeout_ms`.
    pub async fn execute_with_default_timeout(
        &self,
        hooks: Vec<SharedHook>,
        ctx: Arc<HookContext>,
    ) -> HookResult<()> {
        let timeout = self.inner.config.default_timeout();
        self.execute_with_timeout(hooks, ctx, timeout).await
    }

    /// Re-run the hook list until one pass succeeds.
    ///
    /// Makes at most `retries + 1` attempts and sleeps
    /// `(attempt + 1) * retry_backoff` between them. A cancelled dispatch is
    /// not retried.
    pub async fn execute_with_retry(
        &self,
        hooks: &[SharedHook],
        ctx: &HookContext,
        retries: u32,
    ) -> HookResult<()> {
        let backoff = self.inner.config.retry_backoff();
        let mut attempt: u32 = 0;

        loop {
            match self.execute_sequential(hooks, ctx) {
                Ok(()) => return Ok(()),
                Err(e @ HookError::Cancelled { .. }) => return Err(e),
                Err(e) if attempt >= retries => {
                    warn!(event = %ctx.event, attempts = attempt + 1, error = %e, "Retries exhausted");
                    return Err(HookError::RetryExhausted {
                        attempts: attempt + 1,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = retry_delay(backoff, attempt);
                    warn!(
                        event = %ctx.event,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Hook execution failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// [`execute_with_retry`](Self::execute_with_retry) with the configured
    /// `max_retries`.
    pub async fn execute_with_default_retry(
        &self,
        hooks: &[SharedHook],
        ctx: &HookContext,
    ) -> HookResult<()> {
        let retries = self.inner.config.max_retries;
        self.execute_with_retry(hooks, ctx, retries).await
    }

    /// Background dispatches started by `execute_async` still running.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Wait up to `grace` for background dispatches, then clear the registry.
    ///
    /// The registry is cleared even when the grace period runs out, in which
    /// case [`HookError::ShutdownTimeout`] is returned.
    pub async fn shutdown(&self, grace: Duration) -> HookResult<()> {
        info!(in_flight = self.in_flight(), "Shutting down hook registry");
        let drained = tokio::time::timeout(grace, self.wait_idle()).await.is_ok();
        self.clear();

        if drained {
            info!("Hook registry shut down");
            Ok(())
        } else {
            warn!(grace = ?grace, remaining = self.in_flight(), "Shutdown grace period elapsed");
            Err(HookError::ShutdownTimeout(grace))
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.inner.drained.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Invoke one eligible hook and report it to metrics and the observer.
    fn invoke(&self, hook: &dyn Hook, ctx: &HookContext, observer: &dyn HookObserver) -> HookResult<()> {
        let name = hook.name();
        observer.on_hook_start(name, ctx);

        let start = Instant::now();
        let result = hook.execute(ctx);
        let elapsed = start.elapsed();

        self.inner
            .metrics
            .record_execution(name, &ctx.event, elapsed, result.as_ref().err());
        observer.on_hook_end(name, ctx, result.as_ref().err(), elapsed);

        if let Err(e) = &result {
            observer.on_hook_error(name, ctx, e);
            warn!(
                hook = %name,
                event = %ctx.event,
                duration_ms = elapsed.as_millis() as u64,
                error = %e,
                "Hook failed"
            );
        }

        result
    }
}
