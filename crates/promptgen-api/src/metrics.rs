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
    pub const HTTP_REQUESTS_TOTAL: &str = "promptgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "promptgen_http_request_duration_seconds";

    pub const CREDITS_SPENT_TOTAL: &str = "promptgen_credits_spent_total";
    pub const CREDITS_GRANTED_TOTAL: &str = "promptgen_credits_granted_total";
    pub const PURCHASES_CONFIRMED_TOTAL: &str = "promptgen_purchases_confirmed_total";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "promptgen_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record credits spent on generation.
pub fn record_credits_spent(amount: u32) {
    counter!(names::CREDITS_SPENT_TOTAL).increment(amount as u64);
}

/// Record credits granted (purchases, admin grants).
pub fn record_credits_granted(amount: u32) {
    counter!(names::CREDITS_GRANTED_TOTAL).increment(amount as u64);
}

/// Record a confirmed purchase.
pub fn record_purchase_confirmed(credits: u32) {
    let labels = [("credits", credits.to_string())];
    counter!(names::PURCHASES_CONFIRMED_TOTAL, &labels).increment(1);
}

/// Record a rate-limit rejection.
pub fn record_rate_limit_hit(path: &str) {
    let labels = [("path", sanitize_path(path))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse id-bearing path segments to keep label cardinality bounded.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("pix_")
                || segment.starts_with("card_")
                || segment.starts_with("user-")
            {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware recording request counts and latency.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/payments/pix_abc123/status"),
            "/api/payments/:id/status"
        );
        assert_eq!(sanitize_path("/api/credits"), "/api/credits");
    }
}
