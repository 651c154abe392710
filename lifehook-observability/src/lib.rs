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

//! Observability for the lifecycle hook engine.
//!
//! - `init_tracing`: global `tracing` subscriber configured from the environment
//! - `TracingObserver`: hook notifications as structured log events
//! - `spawn_metrics_reporter`: periodic metrics snapshots in the log

pub mod config;
pub mod metrics;
pub mod observer;

pub use config::{LogFormat, ObservabilityConfig};
pub use metrics::{log_metrics, spawn_metrics_reporter};
pub use observer::TracingObserver;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Fails if the filter directives do not parse or a global subscriber is
/// already set.
pub fn init_tracing(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter {:?}", config.filter))?;

    let (json, text) = match config.format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            ),
            None,
        ),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer().with_target(true))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!(filter = %config.filter, format = ?config.format, "Tracing initialized");
    Ok(())
}

/// [`init_tracing`] with [`ObservabilityConfig::from_env`].
pub fn init_tracing_from_env() -> anyhow::Result<()> {
    init_tracing(&ObservabilityConfig::from_env())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_rejects_bad_filter() {
        let config = ObservabilityConfig {
            filter: "lifehook=notalevel[".to_string(),
            ..ObservabilityConfig::default()
        };
        assert!(init_tracing(&config).is_err());
    }
}
