/// Directory Service Library
///
/// HTTP API for a directory of real-estate companies: categories, company
/// profiles, property listings, reviews with per-category ratings, company
/// replies, helpfulness votes, review reports, and admin bulk management.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `services`: business logic, including the rating aggregate
/// - `repository`: typed collections over the document store
/// - `domain`: entities, request payloads and list queries
/// - `error`: error types and their HTTP mapping
/// - `config`: configuration management
/// - `metrics`: domain counters and the Prometheus endpoint
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::configure;

use doc_store::DocumentStore;
use std::sync::Arc;

use config::PaginationConfig;
use repository::Repositories;
use services::{
    AggregateService, CategoryService, CompanyService, PropertyService, ReportService,
    ReviewService, VoteService,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pagination: PaginationConfig,
    pub aggregates: AggregateService,
    pub categories: CategoryService,
    pub companies: CompanyService,
    pub properties: PropertyService,
    pub reviews: ReviewService,
    pub votes: VoteService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, pagination: PaginationConfig) -> Self {
        let repos = Repositories::new(store);
        let aggregates = AggregateService::new(repos.clone());
        let reviews = ReviewService::new(repos.clone(), aggregates.clone());

        Self {
            pagination,
            categories: CategoryService::new(repos.clone()),
            companies: CompanyService::new(repos.clone(), reviews.clone()),
            properties: PropertyService::new(repos.clone()),
            votes: VoteService::new(repos.clone()),
            reports: ReportService::new(repos, reviews.clone()),
            reviews,
            aggregates,
        }
    }
}
