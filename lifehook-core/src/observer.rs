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

//! Side-channel notifications about hook execution.
//!
//! For every hook in a dispatch an observer sees either a single
//! `on_hook_skip`, or `on_hook_start` followed by `on_hook_end`, with
//! `on_hook_error` in between when the hook failed. Callbacks run inline on
//! the dispatching thread and should return quickly.

use crate::context::HookContext;
use crate::error::HookError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Why a hook was not invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Disabled,
    ConditionNotMet,
    Cancelled,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "hook disabled",
            SkipReason::ConditionNotMet => "condition not met",
            SkipReason::Cancelled => "dispatch cancelled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives hook lifecycle notifications. All methods default to no-ops.
pub trait HookObserver: Send + Sync {
    fn on_hook_start(&self, _name: &str, _ctx: &HookContext) {}

    fn on_hook_end(
        &self,
        _name: &str,
        _ctx: &HookContext,
        _error: Option<&HookError>,
        _duration: Duration,
    ) {
    }

    fn on_hook_error(&self, _name: &str, _ctx: &HookContext, _error: &HookError) {}

    fn on_hook_skip(&self, _name: &str, _ctx: &HookContext, _reason: &str) {}
}

/// Observer that ignores everything. Installed by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl HookObserver for NoopObserver {}

/// Forwards every notification to each inner observer in order.
#[derive(Default, Clone)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn HookObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn HookObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn push(&mut self, observer: Arc<dyn HookObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl HookObserver for CompositeObserver {
    fn on_hook_start(&self, name: &str, ctx: &HookContext) {
        for observer in &self.observers {
            observer.on_hook_start(name, ctx);
        }
    }

    fn on_hook_end(
        &self,
        name: &str,
        ctx: &HookContext,
        error: Option<&HookError>,
        duration: Duration,
    ) {
        for observer in &self.observers {
            observer.on_hook_end(name, ctx, error, duration);
        }
    }

    fn on_hook_error(&self, name: &str, ctx: &HookContext, error: &HookError) {
        for observer in &self.observers {
            observer.on_hook_error(name, ctx, error);
        }
    }

    fn on_hook_skip(&self, name: &str, ctx: &HookContext, reason: &str) {
        for observer in &self.observers {
            observer.on_hook_skip(name, ctx, reason);
        }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HookEvent;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl HookObserver for Recorder {
        fn on_hook_start(&self, name: &str, _ctx: &HookContext) {
            self.calls.lock().push(format!("start:{name}"));
        }

        fn on_hook_skip(&self, name: &str, _ctx: &HookContext, reason: &str) {
            self.calls.lock().push(format!("skip:{name}:{reason}"));
        }
    }

    #[test]
    fn test_skip_reason_strings() {
        assert_eq!(SkipReason::Disabled.as_str(), "hook disabled");
        assert_eq!(SkipReason::ConditionNotMet.to_string(), "condition not met");
        assert_eq!(SkipReason::Cancelled.as_str(), "dispatch cancelled");
    }

    #[test]
    fn test_composite_fans_out() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let composite = CompositeObserver::new()
            .with(first.clone())
            .with(second.clone());
        assert_eq!(composite.len(), 2);

        let ctx = HookContext::new(HookEvent::RequestStart, "test");
        composite.on_hook_start("a", &ctx);
        composite.on_hook_skip("b", &ctx, SkipReason::Disabled.as_str());
        composite.on_hook_error("a", &ctx, &HookError::msg("ignored by recorder"));

        for recorder in [&first, &second] {
            assert_eq!(
                *recorder.calls.lock(),
                vec!["start:a".to_string(), "skip:b:hook disabled".to_string()]
            );
        }
    }
}
