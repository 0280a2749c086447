/// HTTP handlers and the route table
///
/// Handlers extract the caller and payload, check the role and delegate to
/// the services in [`AppState`](crate::AppState).
pub mod admin;
pub mod categories;
pub mod companies;
pub mod health;
pub mod properties;
pub mod reviews;

use actix_middleware::AuthUser;
use actix_web::web;

use crate::error::{AppError, Result};
use crate::metrics::serve_metrics;

/// Largest bulk-import request body.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// The caller, or 401 for anonymous requests.
pub(crate) fn require_user(user: Option<AuthUser>) -> Result<AuthUser> {
    user.ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
}

/// The caller when they are an admin; 401 or 403 otherwise.
pub(crate) fn require_admin(user: Option<AuthUser>) -> Result<AuthUser> {
    let user = require_user(user)?;
    if !user.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }
    Ok(user)
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| AppError::BadRequest(format!("invalid JSON body: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("invalid query: {}", err)).into())
}

/// Register every route. Used by `main` and by the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api/v1")
                .service(
                    web::resource("/categories").route(web::get().to(categories::list_categories)),
                )
                .service(
                    web::resource("/categories/{id}").route(web::get().to(categories::get_category)),
                )
                .service(
                    web::resource("/companies").route(web::get().to(companies::list_companies)),
                )
                .service(
                    web::resource("/companies/{id}")
                        .route(web::get().to(companies::get_company))
                        .route(web::patch().to(companies::update_company_profile)),
                )
                .service(
                    web::resource("/companies/{id}/rating-summary")
                        .route(web::get().to(companies::rating_summary)),
                )
                .service(
                    web::resource("/companies/{id}/properties")
                        .route(web::get().to(properties::list_properties))
                        .route(web::post().to(properties::create_property)),
                )
                .service(
                    web::resource("/companies/{id}/reviews")
                        .route(web::get().to(reviews::list_company_reviews))
                        .route(web::post().to(reviews::create_review)),
                )
                .service(
                    web::resource("/properties/{id}")
                        .route(web::get().to(properties::get_property))
                        .route(web::put().to(properties::update_property))
                        .route(web::delete().to(properties::delete_property)),
                )
                .service(
                    web::resource("/reviews/{id}")
                        .route(web::get().to(reviews::get_review))
                        .route(web::put().to(reviews::update_review))
                        .route(web::delete().to(reviews::delete_review)),
                )
                .service(
                    web::resource("/reviews/{id}/reply")
                        .route(web::put().to(reviews::set_reply))
                        .route(web::delete().to(reviews::delete_reply)),
                )
                .service(
                    web::resource("/reviews/{id}/vote")
                        .route(web::put().to(reviews::cast_vote))
                        .route(web::delete().to(reviews::retract_vote)),
                )
                .service(
                    web::resource("/reviews/{id}/reports")
                        .route(web::post().to(reviews::report_review)),
                )
                .service(web::resource("/me/reviews").route(web::get().to(reviews::my_reviews)))
                .service(
                    web::scope("/admin")
                        // static segments before `{id}` resources
                        .service(
                            web::resource("/categories")
                                .route(web::post().to(admin::create_category)),
                        )
                        .service(
                            web::resource("/categories/bulk")
                                .route(web::post().to(admin::import_categories)),
                        )
                        .service(
                            web::resource("/categories/export")
                                .route(web::get().to(admin::export_categories)),
                        )
                        .service(
                            web::resource("/categories/{id}")
                                .route(web::put().to(admin::update_category))
                                .route(web::delete().to(admin::delete_category)),
                        )
                        .service(
                            web::resource("/companies").route(web::post().to(admin::create_company)),
                        )
                        .service(
                            web::resource("/companies/bulk")
                                .route(web::post().to(admin::import_companies)),
                        )
                        .service(
                            web::resource("/companies/bulk-delete")
                                .route(web::post().to(admin::bulk_delete_companies)),
                        )
                        .service(
                            web::resource("/companies/export")
                                .route(web::get().to(admin::export_companies)),
                        )
                        .service(
                            web::resource("/companies/{id}")
                                .route(web::put().to(admin::update_company))
                                .route(web::delete().to(admin::delete_company)),
                        )
                        .service(
                            web::resource("/companies/{id}/recompute")
                                .route(web::post().to(admin::recompute_company)),
                        )
                        .service(
                            web::resource("/recompute").route(web::post().to(admin::recompute_all)),
                        )
                        .service(web::resource("/reports").route(web::get().to(admin::list_reports)))
                        .service(
                            web::resource("/reports/{id}/resolve")
                                .route(web::post().to(admin::resolve_report)),
                        ),
                ),
        );
}
