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

//! Request filters for filtered hooks.

use crate::context::RequestInfo;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type PathFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type MethodFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type HeaderFilter = Arc<dyn Fn(&HashMap<String, String>) -> bool + Send + Sync>;

/// Optional path, method and header predicates. All present filters must pass.
#[derive(Clone, Default)]
pub struct HookFilters {
    pub path: Option<PathFilter>,
    pub method: Option<MethodFilter>,
    pub headers: Option<HeaderFilter>,
}

impl HookFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.path = Some(Arc::new(filter));
        self
    }

    pub fn with_method<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.method = Some(Arc::new(filter));
        self
    }

    pub fn with_headers<F>(mut self, filter: F) -> Self
    where
        F: Fn(&HashMap<String, String>) -> bool + Send + Sync + 'static,
    {
        self.headers = Some(Arc::new(filter));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.method.is_none() && self.headers.is_none()
    }

    /// Evaluate the filters against a request.
    ///
    /// Without a request there is nothing to filter on, so every filter passes.
    pub fn matches(&self, request: Option<&RequestInfo>) -> bool {
        let Some(request) = request else {
            return true;
        };
        self.path.as_ref().map_or(true, |f| f(&request.path))
            && self.method.as_ref().map_or(true, |f| f(&request.method))
            && self.headers.as_ref().map_or(true, |f| f(&request.headers))
    }
}

impl fmt::Debug for HookFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookFilters")
            .field("path", &self.path.is_some())
            .field("method", &self.method.is_some())
            .field("headers", &self.headers.is_some())
            .finish()
    }
}

/// Builds a path filter from exclude and include lists.
///
/// Evaluation order: exact excludes, prefix excludes, suffix excludes, then
/// exact includes if any were given. Anything not excluded passes when no
/// include list exists.
#[derive(Debug, Clone, Default)]
pub struct PathFilterBuilder {
    exclude: Vec<String>,
    exclude_prefixes: Vec<String>,
    exclude_suffixes: Vec<String>,
    include: Option<Vec<String>>,
}

impl PathFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        self.exclude.push(path.into());
        self
    }

    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefixes.push(prefix.into());
        self
    }

    pub fn exclude_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.exclude_suffixes.push(suffix.into());
        self
    }

    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.include.get_or_insert_with(Vec::new).push(path.into());
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.exclude.iter().any(|p| p == path) {
            return false;
        }
        if self.exclude_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return false;
        }
        if self.exclude_suffixes.iter().any(|s| path.ends_with(s.as_str())) {
            return false;
        }
        match &self.include {
            Some(include) => include.iter().any(|p| p == path),
            None => true,
        }
    }

    pub fn build(self) -> PathFilter {
        Arc::new(move |path: &str| self.matches(path))
    }
}

/// Builds a method filter from allow and deny lists (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct MethodFilterBuilder {
    allow: Option<Vec<String>>,
    deny: Vec<String>,
}

impl MethodFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, method: impl AsRef<str>) -> Self {
        self.allow
            .get_or_insert_with(Vec::new)
            .push(method.as_ref().to_ascii_uppercase());
        self
    }

    pub fn deny(mut self, method: impl AsRef<str>) -> Self {
        self.deny.push(method.as_ref().to_ascii_uppercase());
        self
    }

    pub fn matches(&self, method: &str) -> bool {
        let method = method.to_ascii_uppercase();
        if self.deny.contains(&method) {
            return false;
        }
        match &self.allow {
            Some(allow) => allow.contains(&method),
            None => true,
        }
    }

    pub fn build(self) -> MethodFilter {
        Arc::new(move |method: &str| self.matches(method))
    }
}

/// Passes when the header is present (name compared case-insensitively).
pub fn header_present(name: impl Into<String>) -> HeaderFilter {
    let name = name.into();
    Arc::new(move |headers: &HashMap<String, String>| {
        headers.keys().any(|k| k.eq_ignore_ascii_case(&name))
    })
}

/// Passes when the header is present with exactly this value.
pub fn header_equals(name: impl Into<String>, value: impl Into<String>) -> HeaderFilter {
    let name = name.into();
    let value = value.into();
    Arc::new(move |headers: &HashMap<String, String>| {
        headers
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case(&name) && *v == value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_filter_excludes() {
        let filter = PathFilterBuilder::new()
            .exclude("/health")
            .exclude_prefix("/static/")
            .exclude_suffix(".ico")
            .build();

        assert!(!filter("/health"));
        assert!(!filter("/static/app.js"));
        assert!(!filter("/favicon.ico"));
        assert!(filter("/api/users"));
        assert!(filter("/healthz"));
    }

    #[test]
    fn test_path_filter_include_list() {
        let builder = PathFilterBuilder::new().include("/login").include("/logout");
        assert!(builder.matches("/login"));
        assert!(builder.matches("/logout"));
        assert!(!builder.matches("/users"));
    }

    #[test]
    fn test_path_filter_exclude_beats_include() {
        let builder = PathFilterBuilder::new()
            .include("/admin")
            .exclude("/admin");
        assert!(!builder.matches("/admin"));
    }

    #[test]
    fn test_method_filter() {
        let deny_only = MethodFilterBuilder::new().deny("options").build();
        assert!(!deny_only("OPTIONS"));
        assert!(deny_only("get"));

        let allow = MethodFilterBuilder::new().allow("GET").allow("post").deny("POST");
        assert!(allow.matches("get"));
        assert!(!allow.matches("POST"));
        assert!(!allow.matches("DELETE"));
    }

    #[test]
    fn test_header_filters() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        assert!(header_present("content-type")(&headers));
        assert!(!header_present("authorization")(&headers));
        assert!(header_equals("CONTENT-TYPE", "application/json")(&headers));
        assert!(!header_equals("content-type", "text/plain")(&headers));
    }

    #[test]
    fn test_filters_and_semantics() {
        let filters = HookFilters::new()
            .with_path(|p| p != "/x")
            .with_method(|m| m == "GET");

        let get_y = RequestInfo::new("GET", "/y");
        let post_y = RequestInfo::new("POST", "/y");
        let get_x = RequestInfo::new("GET", "/x");

        assert!(filters.matches(Some(&get_y)));
        assert!(!filters.matches(Some(&post_y)));
        assert!(!filters.matches(Some(&get_x)));
    }

    #[test]
    fn test_filters_without_request_pass() {
        let filters = HookFilters::new().with_path(|_| false);
        assert!(filters.matches(None));
        assert!(HookFilters::new().is_empty());
        assert!(!filters.is_empty());
    }
}
