//! Helpfulness votes and report moderation over HTTP.

mod common;

use actix_web::http::StatusCode;
use common::{admin, create_category, create_company, init_app, post_review, send, user};
use doc_store::DocumentStore;
use serde_json::json;

#[actix_rt::test]
async fn test_vote_lifecycle() {
    let (state, _store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Brokers").await;
    let company = create_company(&app, &category, "Nawy", "Cairo").await;

    let (_, review) = post_review(&app, &company, "author", 4).await;
    let review_id = review["id"].as_str().unwrap().to_string();
    let vote_uri = format!("/api/v1/reviews/{}/vote", review_id);
    let review_uri = format!("/api/v1/reviews/{}", review_id);

    // own review
    let (status, _) = send(&app, "PUT", &vote_uri, Some(&user("author")), Some(json!({"helpful": true}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "PUT", &vote_uri, Some(&user("v1")), Some(json!({"helpful": true}))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["helpful_count"], 1);
    assert_eq!(body["not_helpful_count"], 0);
    assert_eq!(body["vote"], true);

    // repeating the same vote changes nothing
    let (_, body) = send(&app, "PUT", &vote_uri, Some(&user("v1")), Some(json!({"helpful": true}))).await;
    assert_eq!(body["helpful_count"], 1);

    send(&app, "PUT", &vote_uri, Some(&user("v2")), Some(json!({"helpful": false}))).await;

    // switching moves the vote between counters
    let (_, body) = send(&app, "PUT", &vote_uri, Some(&user("v1")), Some(json!({"helpful": false}))).await;
    assert_eq!(body["helpful_count"], 0);
    assert_eq!(body["not_helpful_count"], 2);

    let (_, stored) = send(&app, "GET", &review_uri, None, None).await;
    assert_eq!(stored["helpful_count"], 0);
    assert_eq!(stored["not_helpful_count"], 2);

    let (status, body) = send(&app, "DELETE", &vote_uri, Some(&user("v1")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["not_helpful_count"], 1);
    assert!(body["vote"].is_null());

    let (status, _) = send(&app, "DELETE", &vote_uri, Some(&user("v1")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PUT", &vote_uri, None, Some(json!({"helpful": true}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_deleting_review_removes_votes_and_reports() {
    let (state, store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Brokers").await;
    let company = create_company(&app, &category, "Nawy", "Cairo").await;

    let (_, review) = post_review(&app, &company, "author", 2).await;
    let review_id = review["id"].as_str().unwrap().to_string();

    send(
        &app,
        "PUT",
        &format!("/api/v1/reviews/{}/vote", review_id),
        Some(&user("v1")),
        Some(json!({"helpful": true})),
    )
    .await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/reviews/{}/reports", review_id),
        Some(&user("v2")),
        Some(json!({"reason": "spam"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.len("votes").await, 1);
    assert_eq!(store.len("reports").await, 1);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/reviews/{}", review_id),
        Some(&user("author")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(store.len("votes").await, 0);
    assert_eq!(store.len("reports").await, 0);
    assert!(store.get("reviews", &review_id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_report_rules() {
    let (state, _store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Brokers").await;
    let company = create_company(&app, &category, "Nawy", "Cairo").await;

    let (_, review) = post_review(&app, &company, "author", 1).await;
    let reports_uri = format!("/api/v1/reviews/{}/reports", review["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "POST",
        &reports_uri,
        Some(&user("r1")),
        Some(json!({"reason": "conflict_of_interest", "details": "Posted by a competitor."})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["company_id"], company.as_str());

    let (status, _) = send(&app, "POST", &reports_uri, Some(&user("r1")), Some(json!({"reason": "spam"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "POST", &reports_uri, Some(&user("author")), Some(json!({"reason": "spam"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", &reports_uri, Some(&user("r2")), Some(json!({"reason": "boring"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_moderation_dismiss_and_remove() {
    let (state, _store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Brokers").await;
    let company = create_company(&app, &category, "Nawy", "Cairo").await;

    let (_, kept) = post_review(&app, &company, "honest", 4).await;
    let (_, fake) = post_review(&app, &company, "shill", 1).await;
    let kept_id = kept["id"].as_str().unwrap().to_string();
    let fake_id = fake["id"].as_str().unwrap().to_string();

    let (_, dismissible) = send(
        &app,
        "POST",
        &format!("/api/v1/reviews/{}/reports", kept_id),
        Some(&user("r1")),
        Some(json!({"reason": "offensive"})),
    )
    .await;
    let (_, valid) = send(
        &app,
        "POST",
        &format!("/api/v1/reviews/{}/reports", fake_id),
        Some(&user("r1")),
        Some(json!({"reason": "fake"})),
    )
    .await;
    let (_, second) = send(
        &app,
        "POST",
        &format!("/api/v1/reviews/{}/reports", fake_id),
        Some(&user("r2")),
        Some(json!({"reason": "spam"})),
    )
    .await;

    // only admins see the queue
    let (status, _) = send(&app, "GET", "/api/v1/admin/reports", Some(&user("r1")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, queue) = send(&app, "GET", "/api/v1/admin/reports", Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue["items"].as_array().unwrap().len(), 3);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/admin/reports/{}/resolve", dismissible["id"].as_str().unwrap()),
        Some(&admin()),
        Some(json!({"action": "dismiss"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "dismissed");
    assert_eq!(body["resolved_by"], "admin-1");
    assert!(body["resolved_at"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/admin/reports/{}/resolve", valid["id"].as_str().unwrap()),
        Some(&admin()),
        Some(json!({"action": "remove_review"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "resolved");

    let (status, _) = send(&app, "GET", &format!("/api/v1/reviews/{}", fake_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, company_body) = send(&app, "GET", &format!("/api/v1/companies/{}", company), None, None).await;
    assert_eq!(company_body["total_reviews"], 1);
    assert_eq!(company_body["total_rating"], 4.0);

    // the other report on the removed review is closed too
    let (_, queue) = send(&app, "GET", "/api/v1/admin/reports", Some(&admin()), None).await;
    assert!(queue["items"].as_array().unwrap().is_empty());

    let (_, resolved) = send(&app, "GET", "/api/v1/admin/reports?status=resolved", Some(&admin()), None).await;
    let ids: Vec<&str> = resolved["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&second["id"].as_str().unwrap()));

    // already handled
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/admin/reports/{}/resolve", dismissible["id"].as_str().unwrap()),
        Some(&admin()),
        Some(json!({"action": "remove_review"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_review_written_after_moderation_is_independent() {
    let (state, store) = common::state();
    let app = init_app(state).await;
    let category = create_category(&app, "Brokers").await;
    let company = create_company(&app, &category, "Nawy", "Cairo").await;

    let (_, removed) = post_review(&app, &company, "author", 1).await;
    let removed_id = removed["id"].as_str().unwrap().to_string();
    let (_, report) = send(
        &app,
        "POST",
        &format!("/api/v1/reviews/{}/reports", removed_id),
        Some(&user("reporter")),
        Some(json!({"reason": "fake"})),
    )
    .await;
    send(
        &app,
        "POST",
        &format!("/api/v1/admin/reports/{}/resolve", report["id"].as_str().unwrap()),
        Some(&admin()),
        Some(json!({"action": "remove_review"})),
    )
    .await;

    // the author may review again, under a new id
    let (status, fresh) = post_review(&app, &company, "author", 3).await;
    assert_eq!(status, StatusCode::CREATED, "{}", fresh);
    let fresh_id = fresh["id"].as_str().unwrap().to_string();
    assert_ne!(fresh_id, removed_id);

    let (status, second) = send(
        &app,
        "POST",
        &format!("/api/v1/reviews/{}/reports", fresh_id),
        Some(&user("reporter")),
        Some(json!({"reason": "spam"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", second);
    assert_ne!(second["id"], report["id"]);

    let (status, _) = post_review(&app, &company, "author", 5).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // deleting the new review leaves the earlier moderation record alone
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/reviews/{}", fresh_id),
        Some(&user("author")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let kept = store
        .get("reports", report["id"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept["status"], "resolved");
    assert_eq!(kept["review_id"], removed_id.as_str());
    assert_eq!(store.len("reports").await, 1);
}
