// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the Parlor allocation service.
//!
//! Installs a process-global Prometheus recorder and exposes recording
//! helpers used by the engine and gateway. The rendered exposition text is
//! served by the gateway's public `/metrics` endpoint.

pub mod recording;

pub use metrics_exporter_prometheus::PrometheusHandle;
pub use recording::*;

/// Install the global Prometheus recorder and register metric
/// descriptions.
///
/// Returns a handle whose `render()` produces the exposition text. Must be
/// called at most once per process; a second install fails.
pub fn install_recorder() -> Result<PrometheusHandle, String> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("failed to install Prometheus recorder: {e}"))?;
    recording::register_metrics();
    tracing::debug!("prometheus recorder installed");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The recorder is process-global; keep everything that touches it in
    // one test.
    #[test]
    #[serial_test::serial]
    fn recorder_renders_recorded_metrics() {
        let handle = install_recorder().expect("first install succeeds");

        recording::record_room_created(1);
        recording::record_assignment(500);
        recording::record_rescan();
        recording::record_debounce_skip();
        recording::set_agent_load(500, 2.0);
        recording::record_directory_latency(0.05);

        let rendered = handle.render();
        assert!(rendered.contains("parlor_rooms_created_total"));
        assert!(rendered.contains("parlor_assignments_total"));
        assert!(rendered.contains("parlor_agent_load"));

        // Second install must fail rather than silently replace the recorder.
        assert!(install_recorder().is_err());
    }
}
