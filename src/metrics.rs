//! Prometheus metrics for store latency and item lifecycle counts.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use crate::error::AppError;

// === Metric Name Constants ===

/// Store call latency metric name.
pub const METRIC_STORE_LATENCY: &str = "store_request_latency_ms";
/// Store failures counter metric name.
pub const METRIC_STORE_ERRORS: &str = "store_errors_total";
/// Items created counter metric name.
pub const METRIC_ITEMS_CREATED: &str = "items_created_total";
/// Items updated counter metric name.
pub const METRIC_ITEMS_UPDATED: &str = "items_updated_total";
/// Items deleted counter metric name.
pub const METRIC_ITEMS_DELETED: &str = "items_deleted_total";
/// Rejected requests counter metric name.
pub const METRIC_VALIDATION_FAILURES: &str = "validation_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_STORE_LATENCY,
        "Item store call latency in milliseconds"
    );
    describe_counter!(METRIC_STORE_ERRORS, "Total number of failed store calls");
    describe_counter!(METRIC_ITEMS_CREATED, "Total number of items created");
    describe_counter!(METRIC_ITEMS_UPDATED, "Total number of items updated");
    describe_counter!(METRIC_ITEMS_DELETED, "Total number of items deleted");
    describe_counter!(
        METRIC_VALIDATION_FAILURES,
        "Total number of requests rejected by validation"
    );

    debug!("Metrics initialized");
}

/// Start the Prometheus scrape endpoint on its own listener.
pub fn install_exporter(port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| AppError::Metrics(e.to_string()))?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Record the outcome and latency of a store call.
pub fn record_store_call(op: &'static str, start: Instant, ok: bool) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_STORE_LATENCY, "op" => op).record(latency_ms);
    if !ok {
        counter!(METRIC_STORE_ERRORS, "op" => op).increment(1);
    }
}

/// Increment items created counter.
pub fn inc_items_created() {
    counter!(METRIC_ITEMS_CREATED).increment(1);
}

/// Increment items updated counter.
pub fn inc_items_updated() {
    counter!(METRIC_ITEMS_UPDATED).increment(1);
}

/// Increment items deleted counter.
pub fn inc_items_deleted() {
    counter!(METRIC_ITEMS_DELETED).increment(1);
}

/// Increment validation failures counter.
pub fn inc_validation_failures() {
    counter!(METRIC_VALIDATION_FAILURES).increment(1);
}

/// Timer that records store latency on completion.
pub struct StoreTimer {
    op: &'static str,
    start: Instant,
}

impl StoreTimer {
    /// Start timing a store operation.
    pub fn start(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
        }
    }

    /// Record the result of the timed call and pass it through.
    pub fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        record_store_call(self.op, self.start, result.is_ok());
        result
    }
}
