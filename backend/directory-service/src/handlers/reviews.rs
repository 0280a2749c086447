/// Review handlers - reviews, company replies, votes and reports
use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};

use super::require_user;
use crate::domain::{
    PageQuery, ReplyRequest, ReportRequest, ReviewListQuery, ReviewRequest, VoteRequest,
};
use crate::error::Result;
use crate::AppState;

/// List a company's reviews
pub async fn list_company_reviews(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    query: web::Query<ReviewListQuery>,
) -> Result<HttpResponse> {
    let params = query.into_inner();
    let limit = state.pagination.resolve(params.limit);
    let page = state
        .reviews
        .list_for_company(&company_id, params, limit)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Write a review of a company
pub async fn create_review(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let review = state
        .reviews
        .create(&company_id, &user, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(review))
}

/// Get a single review
pub async fn get_review(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
) -> Result<HttpResponse> {
    let review = state.reviews.get(&review_id).await?;
    Ok(HttpResponse::Ok().json(review))
}

/// Edit a review (author only)
pub async fn update_review(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let review = state
        .reviews
        .update(&review_id, &user, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(review))
}

/// Delete a review (author or admin)
pub async fn delete_review(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    state.reviews.delete(&review_id, &user).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Create or replace the company reply
pub async fn set_reply(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<ReplyRequest>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let review = state
        .reviews
        .set_reply(&review_id, &user, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(review))
}

/// Remove the company reply
pub async fn delete_reply(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    state.reviews.delete_reply(&review_id, &user).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Vote a review helpful or not helpful
pub async fn cast_vote(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<VoteRequest>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let outcome = state.votes.cast(&review_id, &user, req.helpful).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Retract the caller's vote
pub async fn retract_vote(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let outcome = state.votes.retract(&review_id, &user).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Report a review to moderators
pub async fn report_review(
    state: web::Data<AppState>,
    review_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<ReportRequest>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let report = state
        .reports
        .create(&review_id, &user, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(report))
}

/// The caller's own reviews, newest first
pub async fn my_reviews(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let params = query.into_inner();
    let limit = state.pagination.resolve(params.limit);
    let page = state.reviews.list_for_user(&user.id, params, limit).await?;
    Ok(HttpResponse::Ok().json(page))
}
