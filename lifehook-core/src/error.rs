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

//! Hook error types

use std::time::Duration;
use thiserror::Error;

/// Result type for hook operations
pub type HookResult<T> = Result<T, HookError>;

/// Errors produced by the registry, the execution strategies and hook bodies.
#[derive(Debug, Error)]
pub enum HookError {
    // Registry errors
    #[error("Hook already registered: {0}")]
    Duplicate(String),

    #[error("Hook not found: {0}")]
    NotFound(String),

    #[error("Hook {hook} does not support {operation}")]
    UnsupportedOperation { hook: String, operation: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid hook definition: {0}")]
    InvalidHook(String),

    // Execution errors
    #[error("Hook execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Hook execution failed after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<HookError>,
    },

    #[error("Hook {hook} failed: {message}")]
    Failed { hook: String, message: String },

    #[error("{0}")]
    Message(String),

    #[error("Dispatch cancelled with {skipped} hooks not run")]
    Cancelled { skipped: usize },

    #[error("Hook task panicked: {0}")]
    Panicked(String),

    #[error("Shutdown did not drain within {0:?}")]
    ShutdownTimeout(Duration),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HookError {
    /// Error attributed to a named hook.
    pub fn failed(hook: impl Into<String>, message: impl Into<String>) -> Self {
        HookError::Failed {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Free-form error returned from a hook body.
    pub fn msg(message: impl Into<String>) -> Self {
        HookError::Message(message.into())
    }

    pub(crate) fn unsupported(hook: &str, operation: &str) -> Self {
        HookError::UnsupportedOperation {
            hook: hook.to_string(),
            operation: operation.to_string(),
        }
    }

    /// True for errors raised by the registry itself rather than by a hook body.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HookError::Duplicate(_)
                | HookError::NotFound(_)
                | HookError::UnsupportedOperation { .. }
                | HookError::InvalidArgument(_)
                | HookError::InvalidHook(_)
        )
    }
}
