//! Firestore client metrics.

use metrics::counter;

pub mod names {
    pub const REQUESTS_TOTAL: &str = "promptgen_firestore_requests_total";
    pub const RETRIES_TOTAL: &str = "promptgen_firestore_retries_total";
}

/// Record one completed request against a collection.
pub fn record_request(operation: &'static str, collection: &str, ok: bool) {
    let labels = [
        ("operation", operation.to_string()),
        ("collection", collection.to_string()),
        ("outcome", if ok { "ok" } else { "error" }.to_string()),
    ];
    counter!(names::REQUESTS_TOTAL, &labels).increment(1);
}

/// Record one retry attempt.
pub fn record_retry(operation: &str) {
    let labels = [("operation", operation.to_string())];
    counter!(names::RETRIES_TOTAL, &labels).increment(1);
}
