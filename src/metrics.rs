//! Recommendation counters.
//!
//! The library only emits through the `metrics` facade; installing a recorder
//! (Prometheus, StatsD, a test recorder, ...) is left to the host process.

use metrics::counter;

pub const REQUESTS_TOTAL: &str = "recommender_requests_total";
pub const EXCLUSIONS_TOTAL: &str = "recommender_exclusions_total";
pub const GATEWAY_FALLBACKS_TOTAL: &str = "recommender_gateway_fallbacks_total";
pub const RESULT_FALLBACKS_TOTAL: &str = "recommender_result_fallbacks_total";

pub fn record_request() {
    counter!(REQUESTS_TOTAL).increment(1);
}

pub fn record_exclusion(rule: &str) {
    counter!(EXCLUSIONS_TOTAL, "rule" => rule.to_string()).increment(1);
}

pub fn record_gateway_fallback(model: &'static str) {
    counter!(GATEWAY_FALLBACKS_TOTAL, "model" => model).increment(1);
}

pub fn record_result_fallback() {
    counter!(RESULT_FALLBACKS_TOTAL).increment(1);
}
