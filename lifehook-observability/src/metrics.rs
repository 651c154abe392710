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

//! Periodic metrics reporting.

use lifehook_core::{HookMetrics, HookRegistry};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Log one metrics snapshot at `INFO`.
pub fn log_metrics(metrics: &HookMetrics) {
    let by_hook = serde_json::to_string(&metrics.executions_by_hook).unwrap_or_default();
    let errors_by_hook = serde_json::to_string(&metrics.errors_by_hook).unwrap_or_default();
    info!(
        target: "lifehook::metrics",
        total = metrics.total_executions,
        successful = metrics.successful_executions,
        failed = metrics.failed_executions,
        success_rate = metrics.success_rate(),
        avg_latency_us = metrics.average_latency.as_micros() as u64,
        max_latency_us = metrics.max_latency.as_micros() as u64,
        by_hook = %by_hook,
        errors_by_hook = %errors_by_hook,
        "hook metrics"
    );
}

/// Log the registry's metrics every `interval` until `shutdown` is cancelled.
///
/// The first report is emitted one interval after start, and a final report
/// is emitted on shutdown.
pub fn spawn_metrics_reporter(
    registry: HookRegistry,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log_metrics(&registry.metrics());
                    break;
                }
                _ = ticker.tick() => log_metrics(&registry.metrics()),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture_logs, SharedBuffer};
    use lifehook_core::{FnHook, HookContext, HookEvent};
    use std::sync::Arc;
    use tracing::subscriber::set_default;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_log_metrics_fields() {
        let registry = HookRegistry::new();
        registry
            .register(Arc::new(FnHook::new("counted", vec![HookEvent::ServerReady], |_| Ok(()))))
            .unwrap();
        registry.execute(&HookContext::new(HookEvent::ServerReady, "api")).unwrap();

        let output = capture_logs("lifehook=info", || log_metrics(&registry.metrics()));
        assert!(output.contains("hook metrics"));
        assert!(output.contains("total=1"));
        assert!(output.contains("counted"));
    }

    #[tokio::test]
    async fn test_reporter_stops_on_cancel() {
        let buffer = SharedBuffer::default();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("lifehook=info"))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(buffer.clone()),
            );
        let _guard = set_default(subscriber);

        let token = CancellationToken::new();
        let handle = spawn_metrics_reporter(HookRegistry::new(), Duration::from_millis(10), token.clone());

        tokio::time::sleep(Duration::from_millis(35)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter should stop")
            .unwrap();

        assert!(buffer.contents().matches("hook metrics").count() >= 2);
    }
}
