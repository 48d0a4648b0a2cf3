//! Prometheus metrics setup.

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and describe the pipeline metrics.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    describe_counter!(
        "sleuth_analyses_started_total",
        "Analyses started since process start"
    );
    describe_counter!(
        "sleuth_analyses_completed_total",
        "Analyses completed successfully"
    );
    describe_counter!("sleuth_analyses_failed_total", "Analyses ending in failure");
    describe_counter!(
        "sleuth_frames_processed_total",
        "Sampled frames sent past the quality gate"
    );
    describe_counter!(
        "sleuth_frames_skipped_total",
        "Sampled frames dropped by the quality gate"
    );

    handle
}
