//! Prometheus metrics for the directory service.
//!
//! HTTP request metrics come from `actix_middleware::MetricsMiddleware`;
//! this module adds domain counters and the `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Review mutations by action (created, updated, deleted).
    pub static ref REVIEWS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_reviews_total",
        "Review mutations segmented by action",
        &["action"]
    )
    .expect("failed to register directory_reviews_total");

    /// Helpfulness votes by action (cast, changed, retracted).
    pub static ref VOTES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_votes_total",
        "Review votes segmented by action",
        &["action"]
    )
    .expect("failed to register directory_votes_total");

    /// Moderation reports by action (filed, dismissed, resolved).
    pub static ref REPORTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_reports_total",
        "Review reports segmented by action",
        &["action"]
    )
    .expect("failed to register directory_reports_total");

    /// Company rating aggregate recomputations.
    pub static ref AGGREGATE_RECOMPUTATIONS_TOTAL: IntCounter = register_int_counter!(
        "directory_aggregate_recomputations_total",
        "Company rating aggregate recomputations"
    )
    .expect("failed to register directory_aggregate_recomputations_total");

    /// Bulk import rows by entity and outcome (created, failed).
    pub static ref BULK_IMPORT_ROWS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "directory_bulk_import_rows_total",
        "Bulk import rows segmented by entity and outcome",
        &["entity", "outcome"]
    )
    .expect("failed to register directory_bulk_import_rows_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
