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

//! Lifecycle events that hooks can subscribe to.
//!
//! Events are flat identifiers matched exactly; there is no hierarchy
//! between e.g. `RequestStart` and `RequestEnd`.
//!
//! An event's identity is its string key. A custom event whose name is a
//! built-in key is the built-in event: it compares and hashes equal to it
//! and [`HookEvent::canonical`] folds it into the built-in variant.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Lifecycle point a hook can subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HookEvent {
    // Server lifecycle
    ServerStart,
    ServerStop,
    ServerRestart,
    ServerError,
    ServerReady,
    ServerShutdown,

    // Request lifecycle
    RequestStart,
    RequestEnd,
    RequestError,
    RequestTimeout,
    RequestPanic,
    RequestRetry,

    // Middleware
    MiddlewareStart,
    MiddlewareEnd,
    MiddlewareError,
    MiddlewareSkip,

    // Routing
    RouteEnter,
    RouteExit,

    // Health checks
    HealthCheck,
    HealthCheckPass,
    HealthCheckFail,

    // Rate limiting
    RateLimitHit,
    RateLimitAllow,
    RateLimitDeny,

    // Compression
    CompressionStart,
    CompressionEnd,
    CompressionSkip,

    // Authentication
    AuthStart,
    AuthSuccess,
    AuthFailure,
    AuthSkip,

    /// User-defined event, matched by name.
    Custom(String),
}

const BUILTIN_EVENTS: &[HookEvent] = &[
    HookEvent::ServerStart,
    HookEvent::ServerStop,
    HookEvent::ServerRestart,
    HookEvent::ServerError,
    HookEvent::ServerReady,
    HookEvent::ServerShutdown,
    HookEvent::RequestStart,
    HookEvent::RequestEnd,
    HookEvent::RequestError,
    HookEvent::RequestTimeout,
    HookEvent::RequestPanic,
    HookEvent::RequestRetry,
    HookEvent::MiddlewareStart,
    HookEvent::MiddlewareEnd,
    HookEvent::MiddlewareError,
    HookEvent::MiddlewareSkip,
    HookEvent::RouteEnter,
    HookEvent::RouteExit,
    HookEvent::HealthCheck,
    HookEvent::HealthCheckPass,
    HookEvent::HealthCheckFail,
    HookEvent::RateLimitHit,
    HookEvent::RateLimitAllow,
    HookEvent::RateLimitDeny,
    HookEvent::CompressionStart,
    HookEvent::CompressionEnd,
    HookEvent::CompressionSkip,
    HookEvent::AuthStart,
    HookEvent::AuthSuccess,
    HookEvent::AuthFailure,
    HookEvent::AuthSkip,
];

fn builtin(key: &str) -> Option<&'static HookEvent> {
    BUILTIN_EVENTS.iter().find(|event| event.as_str() == key)
}

impl HookEvent {
    /// Create a custom event. Built-in keys yield the built-in event.
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        match builtin(&name) {
            Some(event) => event.clone(),
            None => HookEvent::Custom(name),
        }
    }

    /// Fold a `Custom` carrying a built-in key into the built-in variant.
    pub fn canonical(self) -> Self {
        match self {
            HookEvent::Custom(name) => HookEvent::custom(name),
            event => event,
        }
    }

    /// Stable key used in configuration and metrics breakdowns.
    pub fn as_str(&self) -> &str {
        match self {
            HookEvent::ServerStart => "server_start",
            HookEvent::ServerStop => "server_stop",
            HookEvent::ServerRestart => "server_restart",
            HookEvent::ServerError => "server_error",
            HookEvent::ServerReady => "server_ready",
            HookEvent::ServerShutdown => "server_shutdown",
            HookEvent::RequestStart => "request_start",
            HookEvent::RequestEnd => "request_end",
            HookEvent::RequestError => "request_error",
            HookEvent::RequestTimeout => "request_timeout",
            HookEvent::RequestPanic => "request_panic",
            HookEvent::RequestRetry => "request_retry",
            HookEvent::MiddlewareStart => "middleware_start",
            HookEvent::MiddlewareEnd => "middleware_end",
            HookEvent::MiddlewareError => "middleware_error",
            HookEvent::MiddlewareSkip => "middleware_skip",
            HookEvent::RouteEnter => "route_enter",
            HookEvent::RouteExit => "route_exit",
            HookEvent::HealthCheck => "health_check",
            HookEvent::HealthCheckPass => "health_check_pass",
            HookEvent::HealthCheckFail => "health_check_fail",
            HookEvent::RateLimitHit => "rate_limit_hit",
            HookEvent::RateLimitAllow => "rate_limit_allow",
            HookEvent::RateLimitDeny => "rate_limit_deny",
            HookEvent::CompressionStart => "compression_start",
            HookEvent::CompressionEnd => "compression_end",
            HookEvent::CompressionSkip => "compression_skip",
            HookEvent::AuthStart => "auth_start",
            HookEvent::AuthSuccess => "auth_success",
            HookEvent::AuthFailure => "auth_failure",
            HookEvent::AuthSkip => "auth_skip",
            HookEvent::Custom(name) => name,
        }
    }

    /// All built-in events (custom events excluded).
    pub fn all() -> &'static [HookEvent] {
        BUILTIN_EVENTS
    }

    /// Whether this event reports a failure of some kind.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            HookEvent::ServerError
                | HookEvent::RequestError
                | HookEvent::RequestTimeout
                | HookEvent::RequestPanic
                | HookEvent::MiddlewareError
                | HookEvent::HealthCheckFail
                | HookEvent::AuthFailure
        )
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, HookEvent::Custom(name) if builtin(name).is_none())
    }
}

impl PartialEq for HookEvent {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for HookEvent {}

impl Hash for HookEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = Infallible;

    /// Unknown keys become [`HookEvent::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HookEvent::custom(s))
    }
}

impl From<String> for HookEvent {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(event) => event,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for HookEvent {
    fn from(value: &str) -> Self {
        HookEvent::from(value.to_string())
    }
}

impl From<HookEvent> for String {
    fn from(event: HookEvent) -> Self {
        event.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str() {
        assert_eq!(HookEvent::ServerStart.as_str(), "server_start");
        assert_eq!(HookEvent::RequestEnd.as_str(), "request_end");
        assert_eq!(HookEvent::HealthCheckFail.as_str(), "health_check_fail");
        assert_eq!(HookEvent::custom("cache_warm").as_str(), "cache_warm");
    }

    #[test]
    fn test_parse_builtin_and_custom() {
        assert_eq!(
            "rate_limit_deny".parse::<HookEvent>().unwrap(),
            HookEvent::RateLimitDeny
        );
        assert_eq!(
            "something_else".parse::<HookEvent>().unwrap(),
            HookEvent::Custom("something_else".to_string())
        );
    }

    #[test]
    fn test_all_events_have_unique_keys() {
        let mut keys: Vec<_> = HookEvent::all().iter().map(|e| e.as_str()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert!(HookEvent::all().iter().all(|e| !e.is_custom()));
    }

    #[test]
    fn test_error_classification() {
        assert!(HookEvent::RequestError.is_error());
        assert!(HookEvent::AuthFailure.is_error());
        assert!(!HookEvent::RequestStart.is_error());
        assert!(!HookEvent::custom("request_error_like").is_error());
    }

    #[test]
    fn test_custom_with_builtin_key_is_the_builtin() {
        let clash = HookEvent::Custom("request_start".to_string());
        assert_eq!(clash, HookEvent::RequestStart);
        assert!(!clash.is_custom());
        assert!(matches!(clash.clone().canonical(), HookEvent::RequestStart));
        assert!(matches!(HookEvent::custom("request_start"), HookEvent::RequestStart));

        let mut counts = std::collections::HashMap::new();
        *counts.entry(HookEvent::RequestStart).or_insert(0) += 1;
        *counts.entry(clash.clone()).or_insert(0) += 1;
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&HookEvent::RequestStart], 2);

        let json = serde_json::to_string(&clash).unwrap();
        let back: HookEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clash);
        assert!(matches!(back, HookEvent::RequestStart));
    }

    #[test]
    fn test_distinct_custom_events_differ() {
        assert_ne!(HookEvent::custom("cache_warm"), HookEvent::custom("cache_cold"));
        assert_ne!(HookEvent::custom("cache_warm"), HookEvent::RequestStart);
        assert!(HookEvent::custom("cache_warm").is_custom());
    }

    #[test]
    fn test_serde_uses_string_key() {
        let json = serde_json::to_string(&HookEvent::RouteEnter).unwrap();
        assert_eq!(json, "\"route_enter\"");

        let event: HookEvent = serde_json::from_str("\"auth_success\"").unwrap();
        assert_eq!(event, HookEvent::AuthSuccess);
    }
}
