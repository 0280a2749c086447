/// Admin handlers - category and company management, bulk tooling,
/// aggregate repair and report moderation. Every endpoint requires the
/// admin role.
use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use super::require_admin;
use crate::domain::{
    BulkDeleteRequest, CategoryRequest, CompanyImportRow, CompanyRequest, ReportListQuery,
    ResolveReportRequest,
};
use crate::error::{AppError, Result};
use crate::AppState;

/// Most rows accepted by one bulk import.
const MAX_IMPORT_ROWS: usize = 1000;

fn check_rows<T>(rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        return Err(AppError::BadRequest("import contains no rows".to_string()));
    }
    if rows.len() > MAX_IMPORT_ROWS {
        return Err(AppError::BadRequest(format!(
            "import is limited to {} rows, got {}",
            MAX_IMPORT_ROWS,
            rows.len()
        )));
    }
    Ok(())
}

pub async fn create_category(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let category = state.categories.create(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    state: web::Data<AppState>,
    category_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let category = state
        .categories
        .update(&category_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

pub async fn delete_category(
    state: web::Data<AppState>,
    category_id: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    state.categories.delete(&category_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Bulk-create categories from a JSON array
pub async fn import_categories(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    rows: web::Json<Vec<CategoryRequest>>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    check_rows(&rows)?;
    let report = state.categories.import(rows.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn export_categories(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let categories = state.categories.export().await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn create_company(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    req: web::Json<CompanyRequest>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let company = state.companies.create(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(company))
}

pub async fn update_company(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<CompanyRequest>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let company = state
        .companies
        .update(&company_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(company))
}

/// Delete a company with its reviews and properties
pub async fn delete_company(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let deletion = state.companies.delete(&company_id).await?;
    Ok(HttpResponse::Ok().json(deletion))
}

/// Bulk-create companies from a JSON array
pub async fn import_companies(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    rows: web::Json<Vec<CompanyImportRow>>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    check_rows(&rows)?;
    let report = state.companies.import(rows.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn bulk_delete_companies(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    req: web::Json<BulkDeleteRequest>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    req.validate()?;
    let outcomes = state.companies.bulk_delete(req.into_inner().ids).await?;
    Ok(HttpResponse::Ok().json(json!({ "results": outcomes })))
}

/// All companies with their category names
pub async fn export_companies(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let rows = state.companies.export().await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Recompute one company's rating aggregate
pub async fn recompute_company(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let aggregate = state.aggregates.recompute_company(&company_id).await?;
    Ok(HttpResponse::Ok().json(aggregate))
}

/// Recompute every company's rating aggregate
pub async fn recompute_all(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let companies = state.aggregates.recompute_all().await?;
    Ok(HttpResponse::Ok().json(json!({ "companies": companies })))
}

/// Reports by status, pending by default
pub async fn list_reports(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    query: web::Query<ReportListQuery>,
) -> Result<HttpResponse> {
    require_admin(user)?;
    let params = query.into_inner();
    let limit = state.pagination.resolve(params.limit);
    let page = state.reports.list(params, limit).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn resolve_report(
    state: web::Data<AppState>,
    report_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<ResolveReportRequest>,
) -> Result<HttpResponse> {
    let admin = require_admin(user)?;
    let report = state
        .reports
        .resolve(&report_id, &admin, req.action)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
