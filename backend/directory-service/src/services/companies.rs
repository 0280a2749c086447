//! Companies: public listing, admin management and bulk tooling.

use actix_middleware::AuthUser;
use chrono::Utc;
use doc_store::{Direction, FilterOp, Page};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::bulk::{BulkDeleteOutcome, BulkImportReport};
use super::reviews::ReviewService;
use super::{clean, decode_cursor, parse_sort};
use crate::domain::{
    timestamp, Category, Company, CompanyImportRow, CompanyListQuery, CompanyProfile,
    CompanyProfileUpdate, CompanyRequest, CompanySort,
};
use crate::error::{AppError, Result};
use crate::repository::Repositories;

/// What a company deletion removed along with it.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyDeletion {
    pub company_id: String,
    pub reviews_removed: usize,
    pub properties_removed: usize,
}

/// Company row for exports, with the category name resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyExport {
    #[serde(flatten)]
    pub company: Company,
    pub category_name: Option<String>,
}

/// Fields written from a profile; aggregates, id and created_at are never
/// part of it.
fn profile_patch(profile: CompanyProfile, category_id: &str) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("name".into(), Value::from(profile.name.trim()));
    patch.insert("category_id".into(), Value::from(category_id));
    for (key, value) in [
        ("description", profile.description),
        ("logo_url", profile.logo_url),
        ("cover_image_url", profile.cover_image_url),
        ("website", profile.website),
        ("phone", profile.phone),
        ("email", profile.email),
        ("city", profile.city),
        ("address", profile.address),
    ] {
        patch.insert(key.into(), clean(value).map(Value::from).unwrap_or(Value::Null));
    }
    patch.insert(
        "established_year".into(),
        profile.established_year.map(Value::from).unwrap_or(Value::Null),
    );
    patch.insert("verified".into(), Value::from(profile.verified));
    patch.insert("updated_at".into(), timestamp::to_value(&Utc::now()));
    patch
}

fn new_company(profile: CompanyProfile, category_id: String) -> Result<Company> {
    let name = profile.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("company name must not be blank".to_string()));
    }

    let now = Utc::now();
    Ok(Company {
        id: Uuid::new_v4().to_string(),
        name,
        description: clean(profile.description),
        category_id,
        logo_url: clean(profile.logo_url),
        cover_image_url: clean(profile.cover_image_url),
        website: clean(profile.website),
        phone: clean(profile.phone),
        email: clean(profile.email),
        city: clean(profile.city),
        address: clean(profile.address),
        established_year: profile.established_year,
        verified: profile.verified,
        total_rating: 0.0,
        total_reviews: 0,
        created_at: now,
        updated_at: now,
    })
}

#[derive(Clone)]
pub struct CompanyService {
    repos: Repositories,
    reviews: ReviewService,
}

impl CompanyService {
    pub fn new(repos: Repositories, reviews: ReviewService) -> Self {
        Self { repos, reviews }
    }

    pub async fn list(&self, params: CompanyListQuery, limit: usize) -> Result<Page<Company>> {
        let sort: CompanySort = parse_sort(params.sort.as_deref())?;
        let cursor = decode_cursor(params.cursor.as_deref())?;

        let mut query = self.repos.companies.query();
        if let Some(category_id) = clean(params.category_id) {
            query = query.where_eq("category_id", category_id);
        }
        if let Some(city) = clean(params.city) {
            query = query.where_eq("city", city);
        }
        if let Some(verified) = params.verified {
            query = query.where_eq("verified", verified);
        }
        if let Some(min_rating) = params.min_rating {
            if !(0.0..=5.0).contains(&min_rating) {
                return Err(AppError::BadRequest("min_rating must be between 0 and 5".to_string()));
            }
            query = query.filter("total_rating", FilterOp::Gte, min_rating);
        }
        if let Some(search) = clean(params.search) {
            query = query.filter("name", FilterOp::TextContains, search);
        }

        let (field, direction) = sort.order();
        let query = query.order_by(field, direction).start_after(cursor);
        Ok(self.repos.companies.find_page(query, limit).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Company> {
        self.repos
            .companies
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("company {}", id)))
    }

    async fn ensure_category(&self, category_id: &str) -> Result<()> {
        if self.repos.categories.get(category_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "category {} does not exist",
                category_id
            )));
        }
        Ok(())
    }

    pub async fn create(&self, req: CompanyRequest) -> Result<Company> {
        req.validate()?;
        let category_id = req.category_id.trim().to_string();
        self.ensure_category(&category_id).await?;

        let company = new_company(req.profile, category_id)?;
        self.repos.companies.insert(&company).await?;
        info!(company_id = %company.id, name = %company.name, "Company created");
        Ok(company)
    }

    /// Replace the profile of a company. Rating aggregates are kept.
    pub async fn update(&self, id: &str, req: CompanyRequest) -> Result<Company> {
        req.validate()?;
        if req.profile.name.trim().is_empty() {
            return Err(AppError::BadRequest("company name must not be blank".to_string()));
        }
        self.get(id).await?;
        let category_id = req.category_id.trim().to_string();
        self.ensure_category(&category_id).await?;

        self.repos
            .companies
            .patch(id, profile_patch(req.profile, &category_id))
            .await?;
        info!(company_id = %id, "Company updated");
        self.get(id).await
    }

    /// Representative edit of contact and presentation fields. Fields left
    /// out of the request are unchanged; blank strings clear a field.
    pub async fn update_profile(
        &self,
        id: &str,
        user: &AuthUser,
        req: CompanyProfileUpdate,
    ) -> Result<Company> {
        if !user.represents(id) {
            return Err(AppError::Forbidden(
                "only the company's representative can edit its profile".to_string(),
            ));
        }
        self.get(id).await?;

        let fields = [
            ("description", req.description),
            ("logo_url", req.logo_url),
            ("cover_image_url", req.cover_image_url),
            ("website", req.website),
            ("phone", req.phone),
            ("email", req.email),
            ("city", req.city),
            ("address", req.address),
        ];

        // blanks are clears, so only non-blank values are validated
        let non_blank = |key: &str| -> Option<String> {
            fields
                .iter()
                .find(|(k, _)| *k == key)
                .and_then(|(_, v)| clean(v.clone()))
        };
        CompanyProfileUpdate {
            description: non_blank("description"),
            logo_url: non_blank("logo_url"),
            cover_image_url: non_blank("cover_image_url"),
            website: non_blank("website"),
            phone: non_blank("phone"),
            email: non_blank("email"),
            city: non_blank("city"),
            address: non_blank("address"),
        }
        .validate()?;

        let mut patch = Map::new();
        for (key, value) in fields {
            if let Some(value) = value {
                let value = clean(Some(value)).map(Value::from).unwrap_or(Value::Null);
                patch.insert(key.to_string(), value);
            }
        }
        if patch.is_empty() {
            return self.get(id).await;
        }
        patch.insert("updated_at".into(), timestamp::to_value(&Utc::now()));

        self.repos.companies.patch(id, patch).await?;
        info!(company_id = %id, user_id = %user.id, "Company profile updated by representative");
        self.get(id).await
    }

    /// Delete a company with its reviews (and their votes and reports) and
    /// its properties.
    pub async fn delete(&self, id: &str) -> Result<CompanyDeletion> {
        self.get(id).await?;

        let reviews = self
            .repos
            .reviews
            .find(&self.repos.reviews.query().where_eq("company_id", id))
            .await?;
        for review in &reviews {
            self.reviews.purge(review, false).await?;
        }

        let properties = self
            .repos
            .properties
            .find(&self.repos.properties.query().where_eq("company_id", id))
            .await?;
        for property in &properties {
            self.repos.properties.remove(&property.id).await?;
        }

        self.repos.companies.remove(id).await?;
        info!(
            company_id = %id,
            reviews = reviews.len(),
            properties = properties.len(),
            "Company deleted"
        );
        Ok(CompanyDeletion {
            company_id: id.to_string(),
            reviews_removed: reviews.len(),
            properties_removed: properties.len(),
        })
    }

    /// Create many companies. Each row names its category by id or by
    /// case-insensitive name.
    pub async fn import(&self, rows: Vec<CompanyImportRow>) -> Result<BulkImportReport> {
        let categories = self.repos.categories.find(&self.repos.categories.query()).await?;
        let lookup = CategoryLookup::new(&categories);
        let mut report = BulkImportReport::new("companies", rows.len());

        for (row, import) in rows.into_iter().enumerate() {
            let built = import
                .validate()
                .map_err(AppError::from)
                .and_then(|_| lookup.resolve(&import))
                .and_then(|category_id| new_company(import.profile, category_id));

            let company = match built {
                Ok(company) => company,
                Err(e) => {
                    report.record_failed(row, &e);
                    continue;
                }
            };

            match self.repos.companies.insert(&company).await {
                Ok(()) => report.record_created(row, company.id),
                Err(e) => report.record_failed(row, &AppError::from(e)),
            }
        }

        info!(
            created = report.created,
            failed = report.failed,
            "Company import finished"
        );
        Ok(report)
    }

    /// Delete several companies; each id reports its own outcome.
    pub async fn bulk_delete(&self, ids: Vec<String>) -> Result<Vec<BulkDeleteOutcome>> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match self.delete(&id).await {
                Ok(_) => BulkDeleteOutcome {
                    id,
                    deleted: true,
                    error: None,
                },
                Err(AppError::NotFound(_)) => BulkDeleteOutcome {
                    id,
                    deleted: false,
                    error: Some("not found".to_string()),
                },
                Err(e) => {
                    warn!(company_id = %id, error = %e, "Bulk delete failed for company");
                    BulkDeleteOutcome {
                        id,
                        deleted: false,
                        error: Some(e.public_message()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Every company ordered by name, with its category name.
    pub async fn export(&self) -> Result<Vec<CompanyExport>> {
        let categories: HashMap<String, String> = self
            .repos
            .categories
            .find(&self.repos.categories.query())
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let query = self.repos.companies.query().order_by("name", Direction::Asc);
        let companies = self.repos.companies.find(&query).await?;

        Ok(companies
            .into_iter()
            .map(|company| CompanyExport {
                category_name: categories.get(&company.category_id).cloned(),
                company,
            })
            .collect())
    }
}

/// Resolves import rows to category ids.
struct CategoryLookup {
    ids: HashMap<String, String>,
    names: HashMap<String, String>,
}

impl CategoryLookup {
    fn new(categories: &[Category]) -> Self {
        Self {
            ids: categories
                .iter()
                .map(|c| (c.id.clone(), c.id.clone()))
                .collect(),
            names: categories
                .iter()
                .map(|c| (c.name.trim().to_lowercase(), c.id.clone()))
                .collect(),
        }
    }

    fn resolve(&self, row: &CompanyImportRow) -> Result<String> {
        if let Some(id) = clean(row.category_id.clone()) {
            return self
                .ids
                .get(&id)
                .cloned()
                .ok_or_else(|| AppError::BadRequest(format!("category {} does not exist", id)));
        }
        if let Some(name) = clean(row.category_name.clone()) {
            return self
                .names
                .get(&name.to_lowercase())
                .cloned()
                .ok_or_else(|| AppError::BadRequest(format!("category '{}' does not exist", name)));
        }
        Err(AppError::BadRequest(
            "row must reference category_id or category_name".to_string(),
        ))
    }
}
