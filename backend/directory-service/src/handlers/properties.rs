/// Property handlers - listings owned by a company
use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};

use super::require_user;
use crate::domain::{PropertyListQuery, PropertyRequest};
use crate::error::Result;
use crate::AppState;

/// List a company's properties
pub async fn list_properties(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    query: web::Query<PropertyListQuery>,
) -> Result<HttpResponse> {
    let params = query.into_inner();
    let limit = state.pagination.resolve(params.limit);
    let page = state
        .properties
        .list_for_company(&company_id, params, limit)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Create a property for a company
pub async fn create_property(
    state: web::Data<AppState>,
    company_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<PropertyRequest>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let property = state
        .properties
        .create(&company_id, &user, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(property))
}

/// Get a single property
pub async fn get_property(
    state: web::Data<AppState>,
    property_id: web::Path<String>,
) -> Result<HttpResponse> {
    let property = state.properties.get(&property_id).await?;
    Ok(HttpResponse::Ok().json(property))
}

/// Replace a property's details
pub async fn update_property(
    state: web::Data<AppState>,
    property_id: web::Path<String>,
    user: Option<AuthUser>,
    req: web::Json<PropertyRequest>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    let property = state
        .properties
        .update(&property_id, &user, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(property))
}

/// Delete a property
pub async fn delete_property(
    state: web::Data<AppState>,
    property_id: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    let user = require_user(user)?;
    state.properties.delete(&property_id, &user).await?;
    Ok(HttpResponse::NoContent().finish())
}
