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

//! Built-in hooks for request logging, error tracking and server lifecycle.
//!
//! These write through a [`Logger`] rather than `tracing` directly so a host
//! can route them to its own sink.

use crate::config::BuiltinHooksConfig;
use crate::context::HookContext;
use crate::error::HookResult;
use crate::event::HookEvent;
use crate::hook::{priority, EnableToggle, Hook, HookCore};
use crate::logger::Logger;
use crate::registry::HookRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const LOGGING_HOOK: &str = "builtin.logging";
pub const ERROR_TRACKING_HOOK: &str = "builtin.error_tracking";
pub const LIFECYCLE_HOOK: &str = "builtin.lifecycle";

/// Logs request start and completion. Runs after other request hooks.
pub struct LoggingHook {
    core: HookCore,
    logger: Arc<dyn Logger>,
}

impl LoggingHook {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        let mut core = HookCore::new(
            LOGGING_HOOK.to_string(),
            vec![HookEvent::RequestStart, HookEvent::RequestEnd],
        );
        core.priority = priority::LOWEST;
        Self { core, logger }
    }
}

fn request_fields(ctx: &HookContext) -> Vec<(&'static str, String)> {
    let mut fields = Vec::with_capacity(5);
    if let Some(method) = ctx.request_method() {
        fields.push(("method", method.to_string()));
    }
    if let Some(path) = ctx.request_path() {
        fields.push(("path", path.to_string()));
    }
    if let Some(id) = &ctx.correlation_id {
        fields.push(("correlation_id", id.clone()));
    }
    fields
}

impl Hook for LoggingHook {
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
        let mut fields = request_fields(ctx);
        match ctx.event {
            HookEvent::RequestStart => self.logger.info("request started", &fields),
            HookEvent::RequestEnd => {
                if let Some(status) = ctx.status_code {
                    fields.push(("status", status.to_string()));
                }
                if let Some(duration) = ctx.duration {
                    fields.push(("duration_ms", duration.as_millis().to_string()));
                }
                self.logger.info("request completed", &fields);
            }
            _ => {}
        }
        Ok(())
    }

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        Some(self)
    }
}

impl EnableToggle for LoggingHook {
    fn set_enabled(&self, enabled: bool) {
        self.core.set_enabled(enabled);
    }
}

/// Counts and logs every error event. Marks the context with `error_tracked`.
pub struct ErrorTrackingHook {
    core: HookCore,
    logger: Arc<dyn Logger>,
    counts: Mutex<HashMap<HookEvent, u64>>,
}

impl ErrorTrackingHook {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        let events = HookEvent::all()
            .iter()
            .filter(|event| event.is_error())
            .cloned()
            .collect();
        let mut core = HookCore::new(ERROR_TRACKING_HOOK.to_string(), events);
        core.priority = priority::HIGH;
        Self {
            core,
            logger,
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Total errors seen across all events.
    pub fn error_count(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    pub fn counts(&self) -> HashMap<HookEvent, u64> {
        self.counts.lock().clone()
    }
}

impl Hook for ErrorTrackingHook {
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
        let occurrences = {
            let mut counts = self.counts.lock();
            let count = counts.entry(ctx.event.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let mut fields = request_fields(ctx);
        fields.push(("event", ctx.event.to_string()));
        fields.push(("occurrences", occurrences.to_string()));
        if let Some(error) = &ctx.error {
            fields.push(("error", error.clone()));
        }
        self.logger.error("error event", &fields);

        ctx.set_metadata("error_tracked", true);
        Ok(())
    }

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        Some(self)
    }
}

impl EnableToggle for ErrorTrackingHook {
    fn set_enabled(&self, enabled: bool) {
        self.core.set_enabled(enabled);
    }
}

/// Records server start and logs uptime when the server stops.
pub struct LifecycleHook {
    core: HookCore,
    logger: Arc<dyn Logger>,
    started: Mutex<Option<Instant>>,
}

impl LifecycleHook {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        let mut core = HookCore::new(
            LIFECYCLE_HOOK.to_string(),
            vec![
                HookEvent::ServerStart,
                HookEvent::ServerStop,
                HookEvent::ServerShutdown,
            ],
        );
        core.priority = priority::HIGHEST;
        Self {
            core,
            logger,
            started: Mutex::new(None),
        }
    }

    /// Time since the last `ServerStart`, if the server is running.
    pub fn uptime(&self) -> Option<Duration> {
        self.started.lock().map(|started| started.elapsed())
    }
}

impl Hook for LifecycleHook {
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
        let server = ("server", ctx.server_name.clone());
        match ctx.event {
            HookEvent::ServerStart => {
                *self.started.lock() = Some(Instant::now());
                self.logger.info("server started", &[server]);
            }
            HookEvent::ServerStop | HookEvent::ServerShutdown => {
                let uptime = self.started.lock().take().map(|started| started.elapsed());
                let mut fields = vec![server, ("event", ctx.event.to_string())];
                if let Some(uptime) = uptime {
                    fields.push(("uptime_ms", uptime.as_millis().to_string()));
                }
                self.logger.info("server stopped", &fields);
            }
            _ => {}
        }
        Ok(())
    }

    fn as_toggle(&self) -> Option<&dyn EnableToggle> {
        Some(self)
    }
}

impl EnableToggle for LifecycleHook {
    fn set_enabled(&self, enabled: bool) {
        self.core.set_enabled(enabled);
    }
}

/// Register the built-in hooks switched on in `config`.
pub fn register_builtin_hooks(
    registry: &HookRegistry,
    config: &BuiltinHooksConfig,
    logger: Arc<dyn Logger>,
) -> HookResult<()> {
    if config.logging {
        registry.register(Arc::new(LoggingHook::new(logger.clone())))?;
    }
    if config.error_tracking {
        registry.register(Arc::new(ErrorTrackingHook::new(logger.clone())))?;
    }
    if config.lifecycle {
        registry.register(Arc::new(LifecycleHook::new(logger)))?;
    }
    Ok(())
}
