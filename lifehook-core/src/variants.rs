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

//! Conditional, filtered and async hooks.
//!
//! Each wraps a [`BaseHook`] and adds one capability on top of it.

use crate::context::HookContext;
use crate::error::HookResult;
use crate::event::HookEvent;
use crate::filter::HookFilters;
use crate::hook::{BaseHook, EnableToggle, HasAsyncExecution, HasCondition, HasFilters, Hook};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub type Condition = Arc<dyn Fn(&HookContext) -> bool + Send + Sync>;

/// Hook that only runs when its condition holds.
pub struct ConditionalHook {
    base: BaseHook,
    condition: Option<Condition>,
}

impl ConditionalHook {
    pub fn new(base: BaseHook) -> Self {
        Self {
            base,
            condition: None,
        }
    }

    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&HookContext) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }
}

impl Hook for ConditionalHook {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn events(&self) -> Vec<HookEvent> {
        self.base.events()
    }

    fn priority(&self) -> i32 {
        self.base.priority()
    }

    fn is_enabled(&self) -> bool {
        self.base.is_enabled()
    }

    fn execute(&self, ctx: &HookContext) -> HookResult<()> {
        self.base.execute(ctx)
    }

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        Some(&self.base)
    }

    fn as_conditional(&self) -> Option<&dyn HasCondition> {
        Some(self)
    }
}

impl HasCondition for ConditionalHook {
    fn condition_met(&self, ctx: &HookContext) -> bool {
        self.condition.as_ref().map_or(true, |c| c(ctx))
    }
}

impl fmt::Debug for ConditionalHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalHook")
            .field("base", &self.base)
            .field("has_condition", &self.condition.is_some())
            .finish()
    }
}

/// Hook that only runs for requests passing its filters.
#[derive(Debug)]
pub struct FilteredHook {
    base: BaseHook,
    filters: HookFilters,
}

impl FilteredHook {
    pub fn new(base: BaseHook, filters: HookFilters) -> Self {
        Self { base, filters }
    }

    pub fn filters(&self) -> &HookFilters {
        &self.filters
    }
}

impl Hook for FilteredHook {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn events(&self) -> Vec<HookEvent> {
        self.base.events()
    }

    fn priority(&self) -> i32 {
        self.base.priority()
    }

    fn is_enabled(&self) -> bool {
        self.base.is_enabled()
    }

    fn execute(&self, ctx: &HookContext) -> HookResult<()> {
        self.base.execute(ctx)
    }

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        Some(&self.base)
    }

    fn as_filtered(&self) -> Option<&dyn HasFilters> {
        Some(self)
    }
}

impl HasFilters for FilteredHook {
    fn filters_pass(&self, ctx: &HookContext) -> bool {
        self.filters.matches(ctx.request.as_ref())
    }
}

/// Default queue size advertised by async hooks.
pub const DEFAULT_ASYNC_BUFFER: usize = 100;
/// Default deadline advertised by async hooks.
pub const DEFAULT_ASYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Hook with an additional fire-and-forget entry point.
#[derive(Debug)]
pub struct AsyncHook {
    base: BaseHook,
    buffer_size: usize,
    timeout: Duration,
}

impl AsyncHook {
    pub fn new(base: BaseHook) -> Self {
        Self {
            base,
            buffer_size: DEFAULT_ASYNC_BUFFER,
            timeout: DEFAULT_ASYNC_TIMEOUT,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `execute` on the blocking pool and return immediately.
    ///
    /// A panicking hook surfaces as the handle's `JoinError`. Must be called
    /// from within a Tokio runtime.
    pub fn execute_async(self: Arc<Self>, ctx: Arc<HookContext>) -> JoinHandle<HookResult<()>> {
        tokio::task::spawn_blocking(move || self.execute(&ctx))
    }
}

impl Hook for AsyncHook {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn events(&self) -> Vec<HookEvent> {
        self.base.events()
    }

    fn priority(&self) -> i32 {
        self.base.priority()
    }

    fn is_enabled(&self) -> bool {
        self.base.is_enabled()
    }

    fn execute(&self, ctx: &HookContext) -> HookResult<()> {
        self.base.execute(ctx)
    }

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        Some(&self.base)
    }

    fn as_async(&self) -> Option<&dyn HasAsyncExecution> {
        Some(self)
    }
}

impl HasAsyncExecution for AsyncHook {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
