/// Company handlers - listing, profile and rating summary
use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};

use super::require_user;
use crate::domain::{CompanyListQuery, CompanyProfileUpdate};
use crate::error::Result;
use crate::AppState;

/// List companies with filters, sort and cursor pagination
pub async fn list_companies(
    state: web::Data<AppState>,
    query: web::Query<CompanyListQuery>,
) -> Result<HttpResponse> {
    let params = query.into_inner();
    let limit = state.pagination.resolve(params.limit);
    let page = state.companies.list(params, limit).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Get a single company
pub async fn get_company(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
) -> Result<HttpResponse> {
    let company = state.companies.get(&company_id).await?;
    Ok(HttpResponse::Ok().json(company))
}

/// Update contact and presentation fields (company representative or admin)
pub async fn update_company_profile(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<CompanyProfileUpdate>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let company = state
        .companies
        .update_profile(&company_id, &user, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(company))
}

/// Star distribution and per-category averages
pub async fn rating_summary(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
) -> Result<HttpResponse> {
    let summary = state.aggregates.rating_summary(&company_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}
