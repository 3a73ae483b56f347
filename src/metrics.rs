// Metrics and observability module
// Store round-trip latency, store errors and responses by status,
// exported in Prometheus text format on /metrics
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

pub static STORE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "counter_store_latency_seconds",
        "latency for document store calls",
        &["op"]
    )
    .unwrap()
});

pub static STORE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "counter_store_errors_total",
        "failed document store calls",
        &["op"]
    )
    .unwrap()
});

pub static RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "counter_requests_total",
        "counter endpoint responses by status",
        &["status"]
    )
    .unwrap()
});

pub fn render() -> String {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&prometheus::gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
