use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, Ready};
use prometheus::{HistogramVec, IntCounterVec, IntGauge};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Instant;

use crate::jwt_auth::{AuthUser, Role};

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests by route, status and caller role",
        &["method", "route", "status", "caller"]
    ).unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency",
        &["method", "route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).unwrap();

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGauge = prometheus::register_int_gauge!(
        "http_requests_in_flight",
        "Requests currently being served"
    ).unwrap();
}

fn caller_label(user: Option<&AuthUser>) -> &'static str {
    match user.map(|u| u.role) {
        None => "anonymous",
        Some(Role::User) => "user",
        Some(Role::Company) => "company",
        Some(Role::Admin) => "admin",
    }
}

/// Decrements the in-flight gauge when the request future finishes or is dropped.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        HTTP_REQUESTS_IN_FLIGHT.inc();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        HTTP_REQUESTS_IN_FLIGHT.dec();
    }
}

/// Prometheus HTTP metrics
///
/// Requests are labelled with the matched route pattern
/// (`/api/v1/companies/{id}`), never the raw path. The caller label reads the
/// [`AuthUser`] left in request extensions by [`crate::JwtAuthMiddleware`], so
/// this middleware must wrap outside it.
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());

        Box::pin(async move {
            let _in_flight = InFlight::enter();
            let start = Instant::now();
            let res = service.call(req).await;

            let (status, caller) = match &res {
                Ok(res) => (
                    res.status().as_u16(),
                    caller_label(res.request().extensions().get::<AuthUser>()),
                ),
                // rejected before a caller was attached
                Err(err) => (err.as_response_error().status_code().as_u16(), "anonymous"),
            };

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &route, &status.to_string(), caller])
                .inc();
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &route])
                .observe(start.elapsed().as_secs_f64());

            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt_auth::{encode_token, Claims, JwtAuthMiddleware};
    use actix_web::{test, web, App, HttpResponse};

    const SECRET: &str = "metrics-secret";

    #[std::prelude::v1::test]
    fn test_caller_label() {
        assert_eq!(caller_label(None), "anonymous");
        let admin = AuthUser {
            id: "a".into(),
            role: Role::Admin,
            company_id: None,
            name: None,
        };
        assert_eq!(caller_label(Some(&admin)), "admin");
    }

    #[actix_rt::test]
    async fn test_counts_by_route_and_caller() {
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(SECRET))
                .wrap(MetricsMiddleware)
                .route(
                    "/metrics-test/{id}",
                    web::get().to(|| async { HttpResponse::Ok().finish() }),
                ),
        )
        .await;

        let token = encode_token(
            SECRET,
            &Claims {
                sub: "rep-1".into(),
                role: Role::Company,
                company_id: Some("c1".into()),
                name: None,
                exp: 4_102_444_800, // 2100-01-01
            },
        )
        .unwrap();

        let labels = ["GET", "/metrics-test/{id}", "200", "company"];
        let before = HTTP_REQUESTS_TOTAL.with_label_values(&labels).get();

        let req = test::TestRequest::get()
            .uri("/metrics-test/42")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        test::call_service(&app, req).await;

        assert_eq!(HTTP_REQUESTS_TOTAL.with_label_values(&labels).get(), before + 1);
    }
}
