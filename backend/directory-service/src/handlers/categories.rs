/// Category handlers - public read endpoints
use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::AppState;

/// List all categories ordered by name
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse> {
    let categories = state.categories.list().await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// Get a single category
pub async fn get_category(
    state: web::Data<AppState>,
    category_id: web::Path<String>,
) -> Result<HttpResponse> {
    let category = state.categories.get(&category_id).await?;
    Ok(HttpResponse::Ok().json(category))
}
