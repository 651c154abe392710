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

//! Logger contract used by the built-in hooks.

use std::fmt::Write;

/// Key/value pairs attached to a log line.
pub type LogFields<'a> = &'a [(&'a str, String)];

/// Minimal logging sink the built-in hooks write to.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str, fields: LogFields<'_>);
    fn error(&self, message: &str, fields: LogFields<'_>);
    fn debug(&self, message: &str, fields: LogFields<'_>);
    fn warn(&self, message: &str, fields: LogFields<'_>);
}

/// Forwards to `tracing` under the `lifehook` target.
///
/// Fields are rendered into a single `fields` value since `tracing` needs
/// field names at compile time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

fn render(fields: LogFields<'_>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{key}={value}");
    }
    out
}

impl Logger for TracingLogger {
    fn info(&self, message: &str, fields: LogFields<'_>) {
        tracing::info!(target: "lifehook", fields = %render(fields), "{}", message);
    }

    fn error(&self, message: &str, fields: LogFields<'_>) {
        tracing::error!(target: "lifehook", fields = %render(fields), "{}", message);
    }

    fn debug(&self, message: &str, fields: LogFields<'_>) {
        tracing::debug!(target: "lifehook", fields = %render(fields), "{}", message);
    }

    fn warn(&self, message: &str, fields: LogFields<'_>) {
        tracing::warn!(target: "lifehook", fields = %render(fields), "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fields() {
        let fields = [("method", "GET".to_string()), ("status", "200".to_string())];
        assert_eq!(render(&fields), "method=GET status=200");
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        // No subscriber installed: calls must be harmless.
        TracingLogger.info("hello", &[("k", "v".to_string())]);
        TracingLogger.error("boom", &[]);
    }
}
