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

//! Ad-hoc ordered hook lists, run outside any registry.

use crate::context::HookContext;
use crate::error::HookResult;
use crate::hook::SharedHook;
use std::fmt;

/// Hooks run in insertion order. No metrics or observer notifications.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<SharedHook>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, hook: SharedHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn hooks(&self) -> &[SharedHook] {
        &self.hooks
    }

    /// Run every eligible hook, continuing past failures. Returns the last error.
    pub fn execute(&self, ctx: &HookContext) -> HookResult<()> {
        let mut last_error = None;
        for hook in self.hooks.iter().filter(|h| h.should_execute(ctx)) {
            if let Err(e) = hook.execute(ctx) {
                last_error = Some(e);
            }
        }
        last_error.map_or(Ok(()), Err)
    }

    /// Run eligible hooks until `stop` holds after one of them.
    ///
    /// Stopping is not an error. The first hook error ends the run and is
    /// returned.
    pub fn execute_until<F>(&self, ctx: &HookContext, stop: F) -> HookResult<()>
    where
        F: Fn(&HookContext) -> bool,
    {
        for hook in self.hooks.iter().filter(|h| h.should_execute(ctx)) {
            hook.execute(ctx)?;
            if stop(ctx) {
                break;
            }
        }
        Ok(())
    }

    /// Run the whole chain only when `gate` holds beforehand.
    pub fn execute_if<F>(&self, ctx: &HookContext, gate: F) -> HookResult<()>
    where
        F: Fn(&HookContext) -> bool,
    {
        if gate(ctx) {
            self.execute(ctx)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}
