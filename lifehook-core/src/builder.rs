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

//! Fluent construction of hooks with any mix of capabilities.
//!
//! ```rust,ignore
//! let hook = HookBuilder::new()
//!     .name("audit")
//!     .event(HookEvent::RequestEnd)
//!     .priority(priority::LOW)
//!     .path_filter(|p| p.starts_with("/admin"))
//!     .execute(|ctx| {
//!         ctx.set_metadata("audited", true);
//!         Ok(())
//!     })
//!     .build()?;
//! registry.register(Arc::new(hook))?;
//! ```

use crate::context::HookContext;
use crate::error::{HookError, HookResult};
use crate::event::HookEvent;
use crate::filter::HookFilters;
use crate::hook::{
    priority, EnableToggle, HasCondition, HasFilters, Hook, HookCore, HookFn,
};
use crate::variants::Condition;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hook produced by [`HookBuilder`].
///
/// Exposes the condition and filter capabilities only when they were set.
pub struct CustomHook {
    core: HookCore,
    action: HookFn,
    condition: Option<Condition>,
    filters: Option<HookFilters>,
}

impl Hook for CustomHook {
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

    fn as_conditional(&self) -> Option<&dyn HasCondition> {
        self.condition.as_ref().map(|_| self as &dyn HasCondition)
    }

    fn as_filtered(&self) -> Option<&dyn HasFilters> {
        self.filters.as_ref().map(|_| self as &dyn HasFilters)
    }
}

impl EnableToggle for CustomHook {
    fn set_enabled(&self, enabled: bool) {
        self.core.set_enabled(enabled);
    }
}

impl HasCondition for CustomHook {
    fn condition_met(&self, ctx: &HookContext) -> bool {
        self.condition.as_ref().map_or(true, |c| c(ctx))
    }
}

impl HasFilters for CustomHook {
    fn filters_pass(&self, ctx: &HookContext) -> bool {
        self.filters
            .as_ref()
            .map_or(true, |f| f.matches(ctx.request.as_ref()))
    }
}

impl fmt::Debug for CustomHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomHook")
            .field("core", &self.core)
            .field("has_condition", &self.condition.is_some())
            .field("filters", &self.filters)
            .finish()
    }
}

/// Accumulates hook settings; all validation happens in [`HookBuilder::build`].
pub struct HookBuilder {
    name: Option<String>,
    events: Vec<HookEvent>,
    priority: i32,
    enabled: bool,
    action: Option<HookFn>,
    condition: Option<Condition>,
    filters: HookFilters,
}

impl Default for HookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HookBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            events: Vec::new(),
            priority: priority::NORMAL,
            enabled: true,
            action: None,
            condition: None,
            filters: HookFilters::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn event(mut self, event: HookEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn events(mut self, events: impl IntoIterator<Item = HookEvent>) -> Self {
        self.events.extend(events);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn execute<F>(mut self, action: F) -> Self
    where
        F: Fn(&HookContext) -> HookResult<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&HookContext) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn path_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.filters = self.filters.with_path(filter);
        self
    }

    pub fn method_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.filters = self.filters.with_method(filter);
        self
    }

    pub fn header_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&HashMap<String, String>) -> bool + Send + Sync + 'static,
    {
        self.filters = self.filters.with_headers(filter);
        self
    }

    /// Replace all filters at once.
    pub fn filters(mut self, filters: HookFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Validate and build the hook.
    ///
    /// Fails with [`HookError::InvalidHook`] when the name, every event or
    /// the execute function is missing. Duplicate events are collapsed.
    pub fn build(self) -> HookResult<CustomHook> {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(HookError::InvalidHook("hook name is required".into())),
        };
        if self.events.is_empty() {
            return Err(HookError::InvalidHook(format!(
                "hook {name} must subscribe to at least one event"
            )));
        }
        let Some(action) = self.action else {
            return Err(HookError::InvalidHook(format!(
                "hook {name} has no execute function"
            )));
        };

        let mut events = Vec::with_capacity(self.events.len());
        for event in self.events {
            if !events.contains(&event) {
                events.push(event);
            }
        }

        let mut core = HookCore::new(name, events);
        core.priority = self.priority;
        core.set_enabled(self.enabled);

        Ok(CustomHook {
            core,
            action,
            condition: self.condition,
            filters: (!self.filters.is_empty()).then_some(self.filters),
        })
    }
}
