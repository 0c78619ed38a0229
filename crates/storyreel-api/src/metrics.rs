//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "storyreel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "storyreel_http_request_duration_seconds";

    pub const GENERATIONS_STARTED_TOTAL: &str = "storyreel_generations_started_total";
    pub const GENERATIONS_COMPLETED_TOTAL: &str = "storyreel_generations_completed_total";
    pub const GENERATIONS_FAILED_TOTAL: &str = "storyreel_generations_failed_total";
    pub const VIDEOS_STARTED_TOTAL: &str = "storyreel_videos_started_total";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "storyreel_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a generation run starting.
pub fn record_generation_started() {
    counter!(names::GENERATIONS_STARTED_TOTAL).increment(1);
}

/// Record a generation run reaching `completed`.
pub fn record_generation_completed() {
    counter!(names::GENERATIONS_COMPLETED_TOTAL).increment(1);
}

/// Record a generation run reaching `failed`.
pub fn record_generation_failed() {
    counter!(names::GENERATIONS_FAILED_TOTAL).increment(1);
}

/// Record a video render submission.
pub fn record_video_started() {
    counter!(names::VIDEOS_STARTED_TOTAL).increment(1);
}

/// Record a rate limit rejection.
pub fn record_rate_limit_hit(path: &str) {
    let labels = [("path", path.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// HTTP metrics middleware.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
