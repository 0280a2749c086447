//! Shared fixtures for the HTTP integration tests.
#![allow(dead_code)]

use actix_http::Request;
use actix_middleware::{encode_token, Claims, JwtAuthMiddleware, Role};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use directory_service::config::PaginationConfig;
use directory_service::{configure, AppState};
use doc_store::MemoryDocumentStore;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret";

/// Fresh state over an empty in-memory store. The returned store shares its
/// data with the state.
pub fn state() -> (AppState, MemoryDocumentStore) {
    let store = MemoryDocumentStore::new();
    let state = AppState::new(Arc::new(store.clone()), PaginationConfig::default());
    (state, store)
}

/// Build the service with the same routes and auth middleware as `main`.
pub async fn init_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(JwtAuthMiddleware::new(SECRET))
            .configure(configure),
    )
    .await
}

pub fn token(sub: &str, role: Role, company_id: Option<&str>) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        role,
        company_id: company_id.map(String::from),
        name: Some(format!("{} name", sub)),
        exp: 4_102_444_800, // 2100-01-01
    };
    encode_token(SECRET, &claims).expect("sign test token")
}

pub fn user(sub: &str) -> String {
    token(sub, Role::User, None)
}

pub fn admin() -> String {
    token("admin-1", Role::Admin, None)
}

pub fn rep(sub: &str, company_id: &str) -> String {
    token(sub, Role::Company, Some(company_id))
}

/// Send a request with an optional bearer token and JSON body; returns the
/// status and the parsed body (`Null` when empty).
pub async fn send<S>(
    app: &S,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut req = match method {
        "GET" => test::TestRequest::get(),
        "POST" => test::TestRequest::post(),
        "PUT" => test::TestRequest::put(),
        "PATCH" => test::TestRequest::patch(),
        "DELETE" => test::TestRequest::delete(),
        other => panic!("unsupported method {}", other),
    }
    .uri(uri);

    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {}", token)));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }

    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

pub async fn create_category<S>(app: &S, name: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/admin/categories",
        Some(&admin()),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

pub async fn create_company<S>(app: &S, category_id: &str, name: &str, city: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/admin/companies",
        Some(&admin()),
        Some(json!({ "name": name, "category_id": category_id, "city": city })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

pub async fn post_review<S>(
    app: &S,
    company_id: &str,
    author: &str,
    rating: u8,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(
        app,
        "POST",
        &format!("/api/v1/companies/{}/reviews", company_id),
        Some(&user(author)),
        Some(json!({
            "rating": rating,
            "title": "Experience with the developer",
            "content": "The unit was delivered with decent finishing quality."
        })),
    )
    .await
}
