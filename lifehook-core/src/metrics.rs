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

//! Execution metrics for hooks.

use crate::error::HookError;
use crate::event::HookEvent;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Point-in-time copy of the collector state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HookMetrics {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub average_latency: Duration,
    pub min_latency: Duration,
    pub max_latency: Duration,
    /// Keyed by [`HookEvent::as_str`].
    pub executions_by_event: HashMap<String, u64>,
    pub executions_by_hook: HashMap<String, u64>,
    pub errors_by_hook: HashMap<String, u64>,
    pub last_latency_by_hook: HashMap<String, Duration>,
}

impl HookMetrics {
    /// Fraction of executions that succeeded, 0.0 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.successful_executions as f64 / self.total_executions as f64
        }
    }
}

#[derive(Debug, Default)]
struct MetricsState {
    total: u64,
    successful: u64,
    failed: u64,
    durations: Vec<Duration>,
    by_event: HashMap<String, u64>,
    by_hook: HashMap<String, u64>,
    errors_by_hook: HashMap<String, u64>,
    last_latency: HashMap<String, Duration>,
}

/// Thread-safe accumulator fed by the registry after each hook invocation.
///
/// Latencies are kept as a list and folded into min/max/average when a
/// snapshot is taken.
#[derive(Debug, Default)]
pub struct HookMetricsCollector {
    state: RwLock<MetricsState>,
}

impl HookMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_execution(
        &self,
        name: &str,
        event: &HookEvent,
        duration: Duration,
        error: Option<&HookError>,
    ) {
        let mut state = self.state.write();
        state.total += 1;
        if error.is_some() {
            state.failed += 1;
            *state.errors_by_hook.entry(name.to_string()).or_insert(0) += 1;
        } else {
            state.successful += 1;
        }
        state.durations.push(duration);
        *state.by_event.entry(event.as_str().to_string()).or_insert(0) += 1;
        *state.by_hook.entry(name.to_string()).or_insert(0) += 1;
        state.last_latency.insert(name.to_string(), duration);
    }

    /// Deep copy of the current counters.
    pub fn metrics(&self) -> HookMetrics {
        let state = self.state.read();

        let (average, min, max) = if state.durations.is_empty() {
            (Duration::ZERO, Duration::ZERO, Duration::ZERO)
        } else {
            let total: u128 = state.durations.iter().map(Duration::as_nanos).sum();
            // the mean never exceeds the largest sample, so the seconds fit in u64
            let mean = total / state.durations.len() as u128;
            let average = Duration::new((mean / 1_000_000_000) as u64, (mean % 1_000_000_000) as u32);
            let min = state.durations.iter().min().copied().unwrap_or_default();
            let max = state.durations.iter().max().copied().unwrap_or_default();
            (average, min, max)
        };

        HookMetrics {
            total_executions: state.total,
            successful_executions: state.successful,
            failed_executions: state.failed,
            average_latency: average,
            min_latency: min,
            max_latency: max,
            executions_by_event: state.by_event.clone(),
            executions_by_hook: state.by_hook.clone(),
            errors_by_hook: state.errors_by_hook.clone(),
            last_latency_by_hook: state.last_latency.clone(),
        }
    }

    pub fn reset(&self) {
        *self.state.write() = MetricsState::default();
    }
}
