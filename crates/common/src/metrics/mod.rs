//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all AlumNet metrics
pub const METRICS_PREFIX: &str = "alumnet";

/// Histogram buckets for request and recommendation latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Recommendation metrics
    describe_counter!(
        format!("{}_recommendations_total", METRICS_PREFIX),
        Unit::Count,
        "Total recommendation requests by kind"
    );

    describe_histogram!(
        format!("{}_recommendation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Recommendation latency in seconds"
    );

    describe_gauge!(
        format!("{}_recommendation_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of ranked results returned"
    );

    // Discovery metrics
    describe_counter!(
        format!("{}_discovery_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Connection discovery runs by outcome"
    );

    describe_counter!(
        format!("{}_discovery_pages_fetched_total", METRICS_PREFIX),
        Unit::Count,
        "Follow-edge pages read during connection discovery"
    );

    describe_histogram!(
        format!("{}_discovery_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Connection discovery latency in seconds"
    );

    // IDF cache metrics
    describe_counter!(
        format!("{}_idf_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "IDF table cache hits"
    );

    describe_counter!(
        format!("{}_idf_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "IDF table cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one completed recommendation request
pub fn record_recommendation(kind: &str, duration_secs: f64, result_count: usize) {
    counter!(
        format!("{}_recommendations_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_recommendation_duration_seconds", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_recommendation_results_count", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .set(result_count as f64);
}

/// Record one connection discovery run
pub fn record_discovery(duration_secs: f64, pages_fetched: u64, success: bool) {
    let outcome = if success { "success" } else { "error" };

    counter!(
        format!("{}_discovery_runs_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    counter!(format!("{}_discovery_pages_fetched_total", METRICS_PREFIX))
        .increment(pages_fetched);

    if success {
        histogram!(format!("{}_discovery_duration_seconds", METRICS_PREFIX))
            .record(duration_secs);
    }
}

/// Helper to record cache metrics
pub fn record_idf_cache(hit: bool) {
    if hit {
        counter!(format!("{}_idf_cache_hits_total", METRICS_PREFIX)).increment(1);
    } else {
        counter!(format!("{}_idf_cache_misses_total", METRICS_PREFIX)).increment(1);
    }
}
