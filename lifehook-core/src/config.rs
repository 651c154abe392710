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

//! Registry configuration.

use crate::error::{HookError, HookResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Tunables for a [`HookRegistry`](crate::HookRegistry).
///
/// # Example TOML Configuration
///
/// ```toml
/// default_timeout_ms = 2000
/// retry_backoff_ms = 50
///
/// [builtin]
/// logging = true
/// error_tracking = true
/// lifecycle = false
///
/// [[overrides]]
/// name = "audit"
/// enabled = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Deadline for `execute_with_default_timeout`.
    #[serde(default = "default_timeout")]
    pub default_timeout_ms: u64,

    /// Unit of the linear backoff between retry attempts.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Retry count for `execute_with_default_retry`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How long `shutdown` waits for background dispatches.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,

    /// Per-hook enabled state applied by `apply_overrides`.
    #[serde(default)]
    pub overrides: Vec<HookOverride>,

    /// Which built-in hooks `register_builtin_hooks` installs.
    #[serde(default)]
    pub builtin: BuiltinHooksConfig,
}

fn default_timeout() -> u64 {
    5000
}

fn default_retry_backoff() -> u64 {
    100
}

fn default_max_retries() -> u32 {
    3
}

fn default_shutdown_grace() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout(),
            retry_backoff_ms: default_retry_backoff(),
            max_retries: default_max_retries(),
            shutdown_grace_ms: default_shutdown_grace(),
            overrides: Vec::new(),
            builtin: BuiltinHooksConfig::default(),
        }
    }
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> HookResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| HookError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> HookResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| HookError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> HookResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            Some("json") => Self::from_json(&contents),
            other => Err(HookError::Config(format!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn validate(&self) -> HookResult<()> {
        if self.default_timeout_ms == 0 {
            return Err(HookError::Config(
                "default_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, entry) in self.overrides.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(HookError::Config(format!(
                    "override at index {i} has an empty hook name"
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(HookError::Config(format!(
                    "hook {} is overridden more than once",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

/// Enabled state forced onto a hook by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookOverride {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl HookOverride {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

/// Switches for the fixed-purpose hooks in [`crate::builtin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinHooksConfig {
    #[serde(default = "default_true")]
    pub logging: bool,
    #[serde(default = "default_true")]
    pub error_tracking: bool,
    #[serde(default = "default_true")]
    pub lifecycle: bool,
}

impl Default for BuiltinHooksConfig {
    fn default() -> Self {
        Self {
            logging: true,
            error_tracking: true,
            lifecycle: true,
        }
    }
}
