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

//! Hook trait, optional capabilities and the plain hook types.
//!
//! Extra behaviour (mutable enabled flag, a condition, request filters,
//! async entry point) is expressed as capability traits a hook may expose
//! through the `as_*` accessors on [`Hook`]. The engine asks for a
//! capability instead of relying on a fixed type hierarchy.

use crate::context::HookContext;
use crate::error::HookResult;
use crate::event::HookEvent;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Well-known priority values. Lower values execute first.
pub mod priority {
    pub const HIGHEST: i32 = -1000;
    pub const HIGH: i32 = -100;
    pub const NORMAL: i32 = 0;
    pub const LOW: i32 = 100;
    pub const LOWEST: i32 = 1000;
}

/// Closure run when a hook fires.
pub type HookFn = Arc<dyn Fn(&HookContext) -> HookResult<()> + Send + Sync>;

/// Shared handle to a registered hook.
pub type SharedHook = Arc<dyn Hook>;

/// A named, prioritized unit of work bound to one or more events.
pub trait Hook: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Events this hook wants when registered without an explicit list.
    fn events(&self) -> Vec<HookEvent>;

    /// Lower values run first.
    fn priority(&self) -> i32 {
        priority::NORMAL
    }

    fn is_enabled(&self) -> bool {
        true
    }

    /// Whether the hook should run for this context.
    ///
    /// Combines the enabled flag with the condition and filter capabilities
    /// when the hook exposes them.
    fn should_execute(&self, ctx: &HookContext) -> bool {
        self.is_enabled()
            && self.as_conditional().map_or(true, |c| c.condition_met(ctx))
            && self.as_filtered().map_or(true, |f| f.filters_pass(ctx))
    }

    fn execute(&self, ctx: &HookContext) -> HookResult<()>;

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        None
    }

    fn as_conditional(&self) -> Option<&dyn HasCondition> {
        None
    }

    fn as_filtered(&self) -> Option<&dyn HasFilters> {
        None
    }

    fn as_async(&self) -> Option<&dyn HasAsyncExecution> {
        None
    }
}

/// Hooks whose enabled flag can be flipped at runtime.
pub trait EnableToggle: Send + Sync {
    fn set_enabled(&self, enabled: bool);
}

/// Hooks gated by a predicate over the context.
pub trait HasCondition: Send + Sync {
    fn condition_met(&self, ctx: &HookContext) -> bool;
}

/// Hooks gated by request path/method/header filters.
pub trait HasFilters: Send + Sync {
    fn filters_pass(&self, ctx: &HookContext) -> bool;
}

/// Hooks that advertise an async dispatch contract.
///
/// Both values are advisory: callers use them to size their own queues and
/// deadlines, the hook does no queuing of its own.
pub trait HasAsyncExecution: Send + Sync {
    fn buffer_size(&self) -> usize;
    fn timeout(&self) -> Duration;
}

/// Identity and enabled state shared by the concrete hook types.
pub(crate) struct HookCore {
    pub(crate) name: String,
    pub(crate) events: Vec<HookEvent>,
    pub(crate) priority: i32,
    enabled: AtomicBool,
}

impl HookCore {
    pub(crate) fn new(name: String, events: Vec<HookEvent>) -> Self {
        Self {
            name,
            events,
            priority: priority::NORMAL,
            enabled: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl fmt::Debug for HookCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCore")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("priority", &self.priority)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Hook backed by a closure, with a toggleable enabled flag.
pub struct BaseHook {
    pub(crate) core: HookCore,
    action: HookFn,
}

impl BaseHook {
    pub fn new<F>(name: impl Into<String>, events: Vec<HookEvent>, action: F) -> Self
    where
        F: Fn(&HookContext) -> HookResult<()> + Send + Sync + 'static,
    {
        Self::from_fn(name, events, Arc::new(action))
    }

    pub(crate) fn from_fn(name: impl Into<String>, events: Vec<HookEvent>, action: HookFn) -> Self {
        Self {
            core: HookCore::new(name.into(), events),
            action,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.core.priority = priority;
        self
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.core.set_enabled(enabled);
        self
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.core.set_enabled(enabled);
    }
}

impl Hook for BaseHook {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn events(&self) -> Vec<HookEvent> {
        self.core.events.clone()
    }

    fn priority(&self) -> i32 {
        self.core.priority
    }

    fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    fn execute(&self, ctx: &HookContext) -> HookResult<()> {
        (self.action)(ctx)
    }

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        Some(self)
    }
}

impl EnableToggle for BaseHook {
    fn set_enabled(&self, enabled: bool) {
        self.core.set_enabled(enabled);
    }
}

impl fmt::Debug for BaseHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseHook").field("core", &self.core).finish()
    }
}

/// Function-only hook. Always enabled and cannot be toggled.
pub struct FnHook {
    name: String,
    events: Vec<HookEvent>,
    priority: i32,
    action: HookFn,
}

impl FnHook {
    pub fn new<F>(name: impl Into<String>, events: Vec<HookEvent>, action: F) -> Self
    where
        F: Fn(&HookContext) -> HookResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            events,
            priority: priority::NORMAL,
            action: Arc::new(action),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Hook for FnHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> Vec<HookEvent> {
        self.events.clone()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn execute(&self, ctx: &HookContext) -> HookResult<()> {
        (self.action)(ctx)
    }
}

impl fmt::Debug for FnHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("priority", &self.priority)
            .finish()
    }
}
