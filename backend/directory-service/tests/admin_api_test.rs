//! Admin surface: categories, company management, bulk tooling and
//! aggregate repair.

mod common;

use actix_web::http::StatusCode;
use common::{admin, create_category, create_company, init_app, post_review, send, user};
use doc_store::DocumentStore;
use serde_json::{json, Map};

#[actix_rt::test]
async fn test_admin_endpoints_require_admin() {
    let (state, _store) = common::state();
    let app = init_app(state).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/categories",
        None,
        Some(json!({"name": "Developers"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/categories",
        Some(&user("u1")),
        Some(json!({"name": "Developers"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[actix_rt::test]
async fn test_category_lifecycle() {
    let (state, _store) = common::state();
    let app = init_app(state).await;

    let developers = create_category(&app, "Developers").await;
    create_category(&app, "Brokers").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/categories",
        Some(&admin()),
        Some(json!({"name": "  developers "})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/api/v1/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Brokers", "Developers"]);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/admin/categories/{}", developers),
        Some(&admin()),
        Some(json!({"name": "Real Estate Developers", "description": "Build and sell units"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], developers.as_str());

    // renaming onto another category's name
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/admin/categories/{}", developers),
        Some(&admin()),
        Some(json!({"name": "BROKERS"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let company = create_company(&app, &developers, "Palm Hills", "Giza").await;
    let uri = format!("/api/v1/admin/categories/{}", developers);
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, "DELETE", &format!("/api/v1/admin/companies/{}", company), Some(&admin()), None).await;
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/v1/categories/{}", developers), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_company_requires_existing_category() {
    let (state, _store) = common::state();
    let app = init_app(state).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/companies",
        Some(&admin()),
        Some(json!({"name": "Orphan", "category_id": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[actix_rt::test]
async fn test_admin_update_keeps_aggregate() {
    let (state, _store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Developers").await;
    let company = create_company(&app, &category, "Hyde Park", "Cairo").await;
    post_review(&app, &company, "u1", 5).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/admin/companies/{}", company),
        Some(&admin()),
        Some(json!({"name": "Hyde Park Developments", "category_id": category, "verified": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["name"], "Hyde Park Developments");
    assert_eq!(body["verified"], true);
    assert_eq!(body["total_reviews"], 1);
    assert_eq!(body["total_rating"], 5.0);
}

#[actix_rt::test]
async fn test_bulk_import_companies() {
    let (state, _store) = common::state();
    let app = init_app(state).await;
    let developers = create_category(&app, "Developers").await;

    let (status, report) = send(
        &app,
        "POST",
        "/api/v1/admin/companies/bulk",
        Some(&admin()),
        Some(json!([
            {"name": "Emaar Misr", "category_name": "developers", "city": "Cairo"},
            {"name": "Sodic", "category_id": developers, "established_year": 1996},
            {"name": "Nowhere", "category_name": "Hotels"},
            {"name": "Bad Site", "category_id": developers, "website": "not a url"},
            {"name": "No Category"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", report);
    assert_eq!(report["total"], 5);
    assert_eq!(report["created"], 2);
    assert_eq!(report["failed"], 3);

    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows[0]["status"], "created");
    assert!(rows[0]["id"].is_string());
    assert_eq!(rows[2]["status"], "failed");
    assert!(rows[2]["error"].as_str().unwrap().contains("Hotels"));
    assert_eq!(rows[3]["status"], "failed");
    assert_eq!(rows[4]["status"], "failed");

    let (_, page) = send(&app, "GET", "/api/v1/companies?sort=name", None, None).await;
    let names: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Emaar Misr", "Sodic"]);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/companies/bulk",
        Some(&admin()),
        Some(json!([])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_bulk_import_categories_skips_duplicates() {
    let (state, _store) = common::state();
    let app = init_app(state).await;
    create_category(&app, "Developers").await;

    let (status, report) = send(
        &app,
        "POST",
        "/api/v1/admin/categories/bulk",
        Some(&admin()),
        Some(json!([
            {"name": "Brokers"},
            {"name": "DEVELOPERS"},
            {"name": "brokers"},
            {"name": "Finishing Contractors"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["created"], 2);
    assert_eq!(report["failed"], 2);

    let (status, exported) = send(&app, "GET", "/api/v1/admin/categories/export", Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exported.as_array().unwrap().len(), 3);
}

#[actix_rt::test]
async fn test_delete_company_cascades() {
    let (state, store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Developers").await;
    let doomed = create_company(&app, &category, "Doomed", "Cairo").await;
    let kept = create_company(&app, &category, "Kept", "Cairo").await;

    let (_, review) = post_review(&app, &doomed, "u1", 2).await;
    post_review(&app, &kept, "u1", 5).await;
    send(
        &app,
        "PUT",
        &format!("/api/v1/reviews/{}/vote", review["id"].as_str().unwrap()),
        Some(&user("u2")),
        Some(json!({"helpful": true})),
    )
    .await;
    send(
        &app,
        "POST",
        &format!("/api/v1/companies/{}/properties", doomed),
        Some(&admin()),
        Some(json!({"title": "Studio", "property_type": "apartment"})),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/companies/bulk-delete",
        Some(&admin()),
        Some(json!({"ids": [doomed, "missing"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["deleted"], true);
    assert_eq!(results[1]["deleted"], false);
    assert_eq!(results[1]["error"], "not found");

    assert_eq!(store.len("companies").await, 1);
    assert_eq!(store.len("reviews").await, 1);
    assert_eq!(store.len("votes").await, 0);
    assert_eq!(store.len("properties").await, 0);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/companies/bulk-delete",
        Some(&admin()),
        Some(json!({"ids": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_export_companies_includes_category_name() {
    let (state, _store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Developers").await;
    create_company(&app, &category, "Zed Towers", "Cairo").await;
    create_company(&app, &category, "Azha", "Ain Sokhna").await;

    let (status, body) = send(&app, "GET", "/api/v1/admin/companies/export", Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "Azha");
    assert_eq!(rows[0]["category_name"], "Developers");
    assert_eq!(rows[1]["name"], "Zed Towers");
}

#[actix_rt::test]
async fn test_recompute_repairs_aggregates() {
    let (state, store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Developers").await;
    let company = create_company(&app, &category, "Mountain View", "Cairo").await;
    post_review(&app, &company, "u1", 3).await;
    post_review(&app, &company, "u2", 4).await;

    let mut drift = Map::new();
    drift.insert("total_rating".into(), json!(1.0));
    drift.insert("total_reviews".into(), json!(40));
    store.update("companies", &company, drift).await.unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/admin/companies/{}/recompute", company),
        Some(&admin()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["total_rating"], 3.5);
    assert_eq!(body["total_reviews"], 2);

    let mut drift = Map::new();
    drift.insert("total_reviews".into(), json!(7));
    store.update("companies", &company, drift).await.unwrap();

    let (status, body) = send(&app, "POST", "/api/v1/admin/recompute", Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companies"], 1);

    let (_, stored) = send(&app, "GET", &format!("/api/v1/companies/{}", company), None, None).await;
    assert_eq!(stored["total_reviews"], 2);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/companies/missing/recompute",
        Some(&admin()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
