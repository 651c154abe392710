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

//! Per-dispatch context passed to every hook.
//!
//! A [`HookContext`] is built by the caller for one event occurrence and
//! handed by reference through the whole pipeline. Everything except the
//! metadata scratch pad is fixed once the dispatch starts; hooks talk to each
//! other by writing metadata that later hooks in the same dispatch can read.

use crate::event::HookEvent;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Request data a server adapter attaches to the context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response data a server adapter attaches to the context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ResponseInfo {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
        }
    }
}

/// Data for a single event dispatch.
#[derive(Debug)]
pub struct HookContext {
    /// The event being dispatched.
    pub event: HookEvent,
    /// Name of the server instance producing the event.
    pub server_name: String,
    pub timestamp: DateTime<Utc>,
    pub request: Option<RequestInfo>,
    pub response: Option<ResponseInfo>,
    pub status_code: Option<u16>,
    pub duration: Option<Duration>,
    pub error: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub correlation_id: Option<String>,
    metadata: RwLock<HashMap<String, Value>>,
    cancel: CancellationToken,
}

impl HookContext {
    /// Create a context stamped with the current time.
    pub fn new(event: HookEvent, server_name: impl Into<String>) -> Self {
        Self {
            event,
            server_name: server_name.into(),
            timestamp: Utc::now(),
            request: None,
            response: None,
            status_code: None,
            duration: None,
            error: None,
            trace_id: None,
            span_id: None,
            correlation_id: None,
            metadata: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    /// Attach a response; also fills `status_code` when it is not set yet.
    pub fn with_response(mut self, response: ResponseInfo) -> Self {
        if self.status_code.is_none() {
            self.status_code = Some(response.status);
        }
        self.response = Some(response);
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_trace(mut self, trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self.span_id = Some(span_id.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_metadata(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.write().insert(key.into(), value.into());
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Return the correlation id, generating a UUID v4 when none was set.
    pub fn ensure_correlation_id(&mut self) -> &str {
        self.correlation_id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
    }

    pub fn request_path(&self) -> Option<&str> {
        self.request.as_ref().map(|r| r.path.as_str())
    }

    pub fn request_method(&self) -> Option<&str> {
        self.request.as_ref().map(|r| r.method.as_str())
    }

    // Metadata scratch pad

    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.write().insert(key.into(), value.into());
    }

    pub fn metadata(&self, key: &str) -> Option<Value> {
        self.metadata.read().get(key).cloned()
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.read().contains_key(key)
    }

    pub fn remove_metadata(&self, key: &str) -> Option<Value> {
        self.metadata.write().remove(key)
    }

    /// Copy of the whole metadata map.
    pub fn metadata_snapshot(&self) -> HashMap<String, Value> {
        self.metadata.read().clone()
    }

    // Cancellation

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Clone for HookContext {
    /// Metadata is deep-copied; the clone shares the cancellation token.
    fn clone(&self) -> Self {
        Self {
            event: self.event.clone(),
            server_name: self.server_name.clone(),
            timestamp: self.timestamp,
            request: self.request.clone(),
            response: self.response.clone(),
            status_code: self.status_code,
            duration: self.duration,
            error: self.error.clone(),
            trace_id: self.trace_id.clone(),
            span_id: self.span_id.clone(),
            correlation_id: self.correlation_id.clone(),
            metadata: RwLock::new(self.metadata_snapshot()),
            cancel: self.cancel.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_builder() {
        let ctx = HookContext::new(HookEvent::RequestEnd, "api")
            .with_request(RequestInfo::new("GET", "/users").with_header("X-Id", "7"))
            .with_response(ResponseInfo::new(201))
            .with_duration(Duration::from_millis(12));

        assert_eq!(ctx.server_name, "api");
        assert_eq!(ctx.request_path(), Some("/users"));
        assert_eq!(ctx.request_method(), Some("GET"));
        assert_eq!(ctx.status_code, Some(201));
        assert_eq!(ctx.duration, Some(Duration::from_millis(12)));
        assert_eq!(ctx.request.as_ref().unwrap().header("x-id"), Some("7"));
    }

    #[test]
    fn test_explicit_status_wins_over_response() {
        let ctx = HookContext::new(HookEvent::RequestEnd, "api")
            .with_status(500)
            .with_response(ResponseInfo::new(200));
        assert_eq!(ctx.status_code, Some(500));
    }

    #[test]
    fn test_metadata_scratch_pad() {
        let ctx = HookContext::new(HookEvent::RequestStart, "api").with_metadata("a", 1);
        ctx.set_metadata("cache_hit", true);

        assert_eq!(ctx.metadata("a"), Some(json!(1)));
        assert_eq!(ctx.metadata("cache_hit"), Some(json!(true)));
        assert!(ctx.has_metadata("cache_hit"));
        assert_eq!(ctx.remove_metadata("a"), Some(json!(1)));
        assert!(!ctx.has_metadata("a"));
    }

    #[test]
    fn test_clone_copies_metadata() {
        let ctx = HookContext::new(HookEvent::RequestStart, "api").with_metadata("k", "v");
        let copy = ctx.clone();
        copy.set_metadata("k", "changed");

        assert_eq!(ctx.metadata("k"), Some(json!("v")));
        assert_eq!(copy.metadata("k"), Some(json!("changed")));
    }

    #[test]
    fn test_ensure_correlation_id_is_stable() {
        let mut ctx = HookContext::new(HookEvent::RequestStart, "api");
        let first = ctx.ensure_correlation_id().to_string();
        let second = ctx.ensure_correlation_id().to_string();
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_cancellation() {
        let ctx = HookContext::new(HookEvent::RequestStart, "api");
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }
}
