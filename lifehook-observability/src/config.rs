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

//! Logging configuration from environment variables.
//!
//! | variable | meaning |
//! |---|---|
//! | `LIFEHOOK_LOG` | `EnvFilter` directives, falls back to `RUST_LOG` |
//! | `LIFEHOOK_LOG_FORMAT` | `json` for JSON lines, anything else for text |
//! | `LIFEHOOK_METRICS_INTERVAL_SECS` | metrics reporter period |

use std::env;
use std::time::Duration;

pub const DEFAULT_FILTER: &str = "lifehook=info,lifehook_core=info,lifehook_observability=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub filter: String,
    pub format: LogFormat,
    pub metrics_interval: Duration,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            filter: lookup("LIFEHOOK_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.filter),

            format: match lookup("LIFEHOOK_LOG_FORMAT").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },

            metrics_interval: lookup("LIFEHOOK_METRICS_INTERVAL_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.metrics_interval),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Text,
            metrics_interval: Duration::from_secs(60),
        }
    }
}
