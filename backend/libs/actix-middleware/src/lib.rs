//! # Actix Middleware Library
//!
//! Shared middleware for the directory's Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer-token identity (optional per request, enforced by the `AuthUser` extractor)
//! - `metrics`: Prometheus HTTP metrics middleware
//! - `correlation_id`: `X-Correlation-ID` propagation

pub mod correlation_id;
pub mod jwt_auth;
pub mod metrics;

pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use jwt_auth::{decode_token, encode_token, AuthUser, Claims, JwtAuthMiddleware, Role};
pub use metrics::MetricsMiddleware;
