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

//! Lifecycle Hook Engine
//!
//! An embeddable event/hook dispatch engine. Server adapters build a
//! [`HookContext`] for each lifecycle point (server start, request end, auth
//! failure, ...) and hand it to a [`HookRegistry`], which runs every hook
//! subscribed to that event.
//!
//! # Architecture
//!
//! - Hooks are ordered by ascending priority; ties keep registration order
//! - Conditions, request filters and async dispatch are optional
//!   capabilities a hook exposes, not a type hierarchy
//! - A failing hook never stops its siblings; callers see the last error,
//!   observers and metrics see all of them
//! - Hook bodies run outside the registry lock
//!
//! # Example
//!
//! ```rust,ignore
//! use lifehook_core::{HookBuilder, HookContext, HookEvent, HookRegistry, RequestInfo};
//! use std::sync::Arc;
//!
//! let registry = HookRegistry::new();
//! registry.register(Arc::new(
//!     HookBuilder::new()
//!         .name("audit")
//!         .event(HookEvent::RequestEnd)
//!         .path_filter(|p| p.starts_with("/admin"))
//!         .execute(|ctx| {
//!             ctx.set_metadata("audited", true);
//!             Ok(())
//!         })
//!         .build()?,
//! ))?;
//!
//! let ctx = HookContext::new(HookEvent::RequestEnd, "api")
//!     .with_request(RequestInfo::new("POST", "/admin/users"))
//!     .with_status(201);
//! registry.execute(&ctx)?;
//! ```

pub mod builder;
pub mod builtin;
pub mod chain;
pub mod config;
pub mod context;
mod dispatcher;
pub mod error;
pub mod event;
pub mod filter;
pub mod hook;
pub mod logger;
pub mod metrics;
pub mod observer;
pub mod registry;
pub mod variants;

pub use builder::{CustomHook, HookBuilder};
pub use builtin::{register_builtin_hooks, ErrorTrackingHook, LifecycleHook, LoggingHook};
pub use chain::HookChain;
pub use config::{BuiltinHooksConfig, HookOverride, RegistryConfig};
pub use context::{HookContext, RequestInfo, ResponseInfo};
pub use error::{HookError, HookResult};
pub use event::HookEvent;
pub use filter::{
    header_equals, header_present, HookFilters, MethodFilterBuilder, PathFilterBuilder,
};
pub use hook::{
    priority, BaseHook, EnableToggle, FnHook, HasAsyncExecution, HasCondition, HasFilters, Hook,
    HookFn, SharedHook,
};
pub use logger::{Logger, TracingLogger};
pub use metrics::{HookMetrics, HookMetricsCollector};
pub use observer::{CompositeObserver, HookObserver, NoopObserver, SkipReason};
pub use registry::HookRegistry;
pub use variants::{AsyncHook, ConditionalHook, FilteredHook};
