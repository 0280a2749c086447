use actix_web::HttpResponse;
use serde_json::json;

/// Liveness check
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "directory-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
