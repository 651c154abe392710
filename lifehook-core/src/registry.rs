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

//! Hook registry: the event index and name table.
//!
//! # Concurrency Model
//!
//! The event index and the name table live behind a single `RwLock`.
//! Every read copies what it needs (an `Arc` per hook) and releases the lock
//! before any hook body runs, so a slow or re-entrant hook never blocks
//! registration. The metrics collector and the observer slot each have their
//! own lock. A hook's enabled flag is owned by the hook.
//!
//! Execution strategies are implemented in the dispatcher module.

use crate::config::RegistryConfig;
use crate::error::{HookError, HookResult};
use crate::event::HookEvent;
use crate::hook::SharedHook;
use crate::metrics::{HookMetrics, HookMetricsCollector};
use crate::observer::{HookObserver, NoopObserver};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Default)]
struct RegistryState {
    /// Per-event lists, sorted by ascending priority (stable).
    by_event: HashMap<HookEvent, Vec<SharedHook>>,
    /// Hook and the events it was registered for.
    by_name: HashMap<String, (SharedHook, Vec<HookEvent>)>,
}

pub(crate) struct RegistryInner {
    state: RwLock<RegistryState>,
    pub(crate) metrics: HookMetricsCollector,
    observer: RwLock<Arc<dyn HookObserver>>,
    pub(crate) config: RegistryConfig,
    /// Background dispatches started by `execute_async` and not yet finished.
    pub(crate) in_flight: AtomicUsize,
    pub(crate) drained: Notify,
}

/// Priority-ordered hook registry.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct HookRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                state: RwLock::new(RegistryState::default()),
                metrics: HookMetricsCollector::new(),
                observer: RwLock::new(Arc::new(NoopObserver)),
                config,
                in_flight: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Register a hook for the events it declares.
    pub fn register(&self, hook: SharedHook) -> HookResult<()> {
        self.register_for(hook, Vec::new())
    }

    /// Register a hook for an explicit set of events.
    ///
    /// An empty `events` falls back to `hook.events()`. Registration is
    /// atomic: on error nothing is changed.
    pub fn register_for(&self, hook: SharedHook, events: Vec<HookEvent>) -> HookResult<()> {
        let name = hook.name().to_string();
        if name.trim().is_empty() {
            return Err(HookError::InvalidArgument(
                "hook name must not be empty".to_string(),
            ));
        }

        let requested = if events.is_empty() { hook.events() } else { events };
        let mut events: Vec<HookEvent> = Vec::with_capacity(requested.len());
        for event in requested.into_iter().map(HookEvent::canonical) {
            if !events.contains(&event) {
                events.push(event);
            }
        }
        if events.is_empty() {
            return Err(HookError::InvalidArgument(format!(
                "hook {name} has no events to register for"
            )));
        }

        let mut state = self.inner.state.write();
        if state.by_name.contains_key(&name) {
            return Err(HookError::Duplicate(name));
        }

        for event in &events {
            let hooks = state.by_event.entry(event.clone()).or_default();
            hooks.push(hook.clone());
            hooks.sort_by_key(|h| h.priority());
        }
        debug!(hook = %name, priority = hook.priority(), events = ?events, "Registered hook");
        state.by_name.insert(name, (hook, events));

        Ok(())
    }

    /// Remove a hook from every event it was registered for.
    pub fn unregister(&self, name: &str) -> HookResult<()> {
        let mut state = self.inner.state.write();
        let (_, events) = state
            .by_name
            .remove(name)
            .ok_or_else(|| HookError::NotFound(name.to_string()))?;

        for event in &events {
            let now_empty = match state.by_event.get_mut(event) {
                Some(hooks) => {
                    hooks.retain(|h| h.name() != name);
                    hooks.is_empty()
                }
                None => false,
            };
            if now_empty {
                state.by_event.remove(event);
            }
        }
        debug!(hook = %name, "Unregistered hook");

        Ok(())
    }

    pub fn enable_hook(&self, name: &str) -> HookResult<()> {
        self.set_hook_enabled(name, true)
    }

    pub fn disable_hook(&self, name: &str) -> HookResult<()> {
        self.set_hook_enabled(name, false)
    }

    fn set_hook_enabled(&self, name: &str, enabled: bool) -> HookResult<()> {
        let hook = self
            .get_hook(name)
            .ok_or_else(|| HookError::NotFound(name.to_string()))?;
        let operation = if enabled { "enable" } else { "disable" };
        let toggle = hook
            .as_toggle()
            .ok_or_else(|| HookError::unsupported(name, operation))?;
        toggle.set_enabled(enabled);
        debug!(hook = %name, enabled, "Toggled hook");
        Ok(())
    }

    /// Apply the configured per-name overrides to hooks registered so far.
    ///
    /// Returns how many overrides took effect. Unknown names and hooks
    /// without a mutable enabled flag are logged and skipped.
    pub fn apply_overrides(&self) -> usize {
        let mut applied = 0;
        for entry in &self.inner.config.overrides {
            match self.set_hook_enabled(&entry.name, entry.enabled) {
                Ok(()) => applied += 1,
                Err(e) => warn!(hook = %entry.name, error = %e, "Skipping hook override"),
            }
        }
        applied
    }

    pub fn get_hook(&self, name: &str) -> Option<SharedHook> {
        self.inner
            .state
            .read()
            .by_name
            .get(name)
            .map(|(hook, _)| hook.clone())
    }

    /// Hooks registered for `event`, in execution order.
    pub fn get_hooks(&self, event: &HookEvent) -> Vec<SharedHook> {
        self.inner
            .state
            .read()
            .by_event
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    /// All hooks by name.
    pub fn list_hooks(&self) -> HashMap<String, SharedHook> {
        self.inner
            .state
            .read()
            .by_name
            .iter()
            .map(|(name, (hook, _))| (name.clone(), hook.clone()))
            .collect()
    }

    /// Events a hook was registered for.
    pub fn hook_events(&self, name: &str) -> Option<Vec<HookEvent>> {
        self.inner
            .state
            .read()
            .by_name
            .get(name)
            .map(|(_, events)| events.clone())
    }

    pub fn hook_count(&self) -> usize {
        self.inner.state.read().by_name.len()
    }

    /// Events with at least one registered hook.
    pub fn events(&self) -> Vec<HookEvent> {
        self.inner.state.read().by_event.keys().cloned().collect()
    }

    pub fn has_hooks(&self, event: &HookEvent) -> bool {
        self.inner.state.read().by_event.contains_key(event)
    }

    /// Drop every hook and reset the metrics.
    pub fn clear(&self) {
        {
            let mut state = self.inner.state.write();
            state.by_event.clear();
            state.by_name.clear();
        }
        self.inner.metrics.reset();
        debug!("Cleared hook registry");
    }

    pub fn set_observer(&self, observer: Arc<dyn HookObserver>) {
        *self.inner.observer.write() = observer;
    }

    pub fn observer(&self) -> Arc<dyn HookObserver> {
        self.inner.observer.read().clone()
    }

    /// Snapshot of the execution metrics.
    pub fn metrics(&self) -> HookMetrics {
        self.inner.metrics.metrics()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("HookRegistry")
            .field("hooks", &state.by_name.keys().collect::<Vec<_>>())
            .field("events", &state.by_event.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HookOverride;
    use crate::hook::{BaseHook, FnHook, Hook};

    fn base(name: &str, priority: i32) -> SharedHook {
        Arc::new(BaseHook::new(name, vec![HookEvent::RequestStart], |_| Ok(())).with_priority(priority))
    }

    fn names(hooks: &[SharedHook]) -> Vec<String> {
        hooks.iter().map(|h| h.name().to_string()).collect()
    }

    #[test]
    fn test_register_sorts_by_priority() {
        let registry = HookRegistry::new();
        registry.register(base("ten", 10)).unwrap();
        registry.register(base("one", 1)).unwrap();
        registry.register(base("five", 5)).unwrap();

        let hooks = registry.get_hooks(&HookEvent::RequestStart);
        assert_eq!(names(&hooks), vec!["one", "five", "ten"]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let registry = HookRegistry::new();
        for name in ["a", "b", "c"] {
            registry.register(base(name, 0)).unwrap();
        }
        registry.register(base("first", -1)).unwrap();

        let hooks = registry.get_hooks(&HookEvent::RequestStart);
        assert_eq!(names(&hooks), vec!["first", "a", "b", "c"]);
    }

    #[test]
    fn test_register_for_explicit_events() {
        let registry = HookRegistry::new();
        registry
            .register_for(base("multi", 0), vec![HookEvent::ServerStart, HookEvent::ServerStop])
            .unwrap();

        assert!(!registry.has_hooks(&HookEvent::RequestStart));
        assert!(registry.has_hooks(&HookEvent::ServerStart));
        assert!(registry.has_hooks(&HookEvent::ServerStop));
        assert_eq!(
            registry.hook_events("multi"),
            Some(vec![HookEvent::ServerStart, HookEvent::ServerStop])
        );
    }

    #[test]
    fn test_duplicate_leaves_first_intact() {
        let registry = HookRegistry::new();
        registry
            .register_for(base("dup", 0), vec![HookEvent::RequestStart, HookEvent::RequestEnd])
            .unwrap();

        let err = registry
            .register_for(base("dup", 0), vec![HookEvent::ServerStart])
            .unwrap_err();
        assert!(matches!(err, HookError::Duplicate(ref n) if n == "dup"));

        assert_eq!(registry.hook_count(), 1);
        assert_eq!(registry.get_hooks(&HookEvent::RequestStart).len(), 1);
        assert_eq!(registry.get_hooks(&HookEvent::RequestEnd).len(), 1);
        assert!(!registry.has_hooks(&HookEvent::ServerStart));
    }

    #[test]
    fn test_register_rejects_empty_name_and_events() {
        let registry = HookRegistry::new();
        let unnamed: SharedHook = Arc::new(FnHook::new("", vec![HookEvent::RequestStart], |_| Ok(())));
        assert!(matches!(
            registry.register(unnamed),
            Err(HookError::InvalidArgument(_))
        ));

        let no_events: SharedHook = Arc::new(FnHook::new("idle", Vec::new(), |_| Ok(())));
        assert!(matches!(
            registry.register(no_events),
            Err(HookError::InvalidArgument(_))
        ));
        assert_eq!(registry.hook_count(), 0);
    }

    #[test]
    fn test_custom_event_with_builtin_key_registers_as_builtin() {
        let registry = HookRegistry::new();
        registry
            .register_for(
                base("clash", 0),
                vec![HookEvent::Custom("request_start".to_string()), HookEvent::RequestStart],
            )
            .unwrap();

        let events = registry.hook_events("clash").unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], HookEvent::RequestStart));
        assert_eq!(names(&registry.get_hooks(&HookEvent::RequestStart)), vec!["clash"]);
        assert!(registry.has_hooks(&HookEvent::custom("request_start")));
    }

    #[test]
    fn test_unregister_prunes_events() {
        let registry = HookRegistry::new();
        registry.register(base("a", 0)).unwrap();
        registry
            .register_for(base("b", 0), vec![HookEvent::RequestStart, HookEvent::ServerStart])
            .unwrap();

        registry.unregister("b").unwrap();
        assert!(!registry.has_hooks(&HookEvent::ServerStart));
        assert_eq!(names(&registry.get_hooks(&HookEvent::RequestStart)), vec!["a"]);

        registry.unregister("a").unwrap();
        assert!(registry.events().is_empty());

        assert!(matches!(registry.unregister("a"), Err(HookError::NotFound(_))));
    }

    #[test]
    fn test_name_reuse_after_unregister() {
        let registry = HookRegistry::new();
        registry.register(base("reuse", 0)).unwrap();
        registry.unregister("reuse").unwrap();

        let replacement: SharedHook =
            Arc::new(FnHook::new("reuse", vec![HookEvent::ServerReady], |_| Ok(())));
        registry.register(replacement).unwrap();
        assert!(registry.has_hooks(&HookEvent::ServerReady));
        assert!(!registry.has_hooks(&HookEvent::RequestStart));
    }

    #[test]
    fn test_enable_disable() {
        let registry = HookRegistry::new();
        registry.register(base("toggle", 0)).unwrap();
        registry
            .register(Arc::new(FnHook::new("fixed", vec![HookEvent::RequestStart], |_| Ok(()))))
            .unwrap();

        registry.disable_hook("toggle").unwrap();
        assert!(!registry.get_hook("toggle").unwrap().is_enabled());
        registry.enable_hook("toggle").unwrap();
        assert!(registry.get_hook("toggle").unwrap().is_enabled());

        assert!(matches!(
            registry.disable_hook("fixed"),
            Err(HookError::UnsupportedOperation { .. })
        ));
        assert!(matches!(registry.enable_hook("missing"), Err(HookError::NotFound(_))));
    }

    #[test]
    fn test_list_hooks_is_a_copy() {
        let registry = HookRegistry::new();
        registry.register(base("a", 0)).unwrap();

        let mut listed = registry.list_hooks();
        listed.clear();
        assert_eq!(registry.list_hooks().len(), 1);
    }

    #[test]
    fn test_apply_overrides() {
        let config = RegistryConfig {
            overrides: vec![
                HookOverride::new("audit", false),
                HookOverride::new("missing", false),
            ],
            ..RegistryConfig::default()
        };
        let registry = HookRegistry::with_config(config);
        registry.register(base("audit", 0)).unwrap();

        assert_eq!(registry.apply_overrides(), 1);
        assert!(!registry.get_hook("audit").unwrap().is_enabled());
    }

    #[test]
    fn test_clear() {
        let registry = HookRegistry::new();
        registry.register(base("a", 0)).unwrap();
        registry.clear();
        assert_eq!(registry.hook_count(), 0);
        assert!(registry.get_hooks(&HookEvent::RequestStart).is_empty());
    }
}
