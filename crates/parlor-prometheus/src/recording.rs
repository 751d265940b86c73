// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Parlor metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("parlor_rooms_created_total", "Rooms inserted into the queue");
    describe_counter!("parlor_assignments_total", "Rooms assigned to agents");
    describe_counter!("parlor_rescans_total", "Queue re-scan passes executed");
    describe_counter!(
        "parlor_debounce_skips_total",
        "Re-scan triggers absorbed by the coalescing guard"
    );
    describe_gauge!("parlor_agent_load", "Locally tracked sessions per agent");
    describe_histogram!(
        "parlor_directory_latency_seconds",
        "Agent directory call latency in seconds"
    );
}

/// Record a room entering the queue.
pub fn record_room_created(channel_id: i64) {
    metrics::counter!("parlor_rooms_created_total", "channel" => channel_id.to_string())
        .increment(1);
}

/// Record a completed assignment.
pub fn record_assignment(agent_id: i64) {
    metrics::counter!("parlor_assignments_total", "agent" => agent_id.to_string()).increment(1);
}

/// Record one executed queue re-scan pass.
pub fn record_rescan() {
    metrics::counter!("parlor_rescans_total").increment(1);
}

/// Record a re-scan trigger absorbed by the coalescing guard.
pub fn record_debounce_skip() {
    metrics::counter!("parlor_debounce_skips_total").increment(1);
}

/// Set the locally tracked load for an agent.
pub fn set_agent_load(agent_id: i64, value: f64) {
    metrics::gauge!("parlor_agent_load", "agent" => agent_id.to_string()).set(value);
}

/// Record latency of one directory call.
pub fn record_directory_latency(seconds: f64) {
    metrics::histogram!("parlor_directory_latency_seconds").record(seconds);
}
