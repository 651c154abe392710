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

//! Hook observer that emits structured `tracing` events.

use lifehook_core::{HookContext, HookError, HookObserver};
use std::time::Duration;
use tracing::{debug, warn};

/// Turns hook notifications into log events under the `lifehook::hooks`
/// target. Start, end and skip are `DEBUG`; failures are `WARN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

fn correlation(ctx: &HookContext) -> &str {
    ctx.correlation_id.as_deref().unwrap_or("-")
}

impl HookObserver for TracingObserver {
    fn on_hook_start(&self, name: &str, ctx: &HookContext) {
        debug!(
            target: "lifehook::hooks",
            hook = name,
            event = %ctx.event,
            server = %ctx.server_name,
            correlation_id = correlation(ctx),
            "hook started"
        );
    }

    fn on_hook_end(&self, name: &str, ctx: &HookContext, error: Option<&HookError>, duration: Duration) {
        debug!(
            target: "lifehook::hooks",
            hook = name,
            event = %ctx.event,
            duration_ms = duration.as_millis() as u64,
            success = error.is_none(),
            correlation_id = correlation(ctx),
            "hook finished"
        );
    }

    fn on_hook_error(&self, name: &str, ctx: &HookContext, error: &HookError) {
        warn!(
            target: "lifehook::hooks",
            hook = name,
            event = %ctx.event,
            error = %error,
            path = ctx.request_path().unwrap_or("-"),
            correlation_id = correlation(ctx),
            "hook failed"
        );
    }

    fn on_hook_skip(&self, name: &str, ctx: &HookContext, reason: &str) {
        debug!(
            target: "lifehook::hooks",
            hook = name,
            event = %ctx.event,
            reason,
            "hook skipped"
        );
    }
}
