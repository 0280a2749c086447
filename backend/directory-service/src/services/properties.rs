//! Property listings owned by companies.

use actix_middleware::AuthUser;
use chrono::Utc;
use doc_store::{Direction, Page};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidateUrl};

use super::{clean, decode_cursor};
use crate::domain::{Property, PropertyListQuery, PropertyRequest};
use crate::error::{AppError, Result};
use crate::repository::Repositories;

fn check_images(images: &[String]) -> Result<Vec<String>> {
    images
        .iter()
        .map(|url| url.trim().to_string())
        .map(|url| {
            if url.validate_url() {
                Ok(url)
            } else {
                Err(AppError::BadRequest(format!("invalid image url: {}", url)))
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct PropertyService {
    repos: Repositories,
}

impl PropertyService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn get(&self, id: &str) -> Result<Property> {
        self.repos
            .properties
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("property {}", id)))
    }

    /// A company's listings, newest first.
    pub async fn list_for_company(
        &self,
        company_id: &str,
        params: PropertyListQuery,
        limit: usize,
    ) -> Result<Page<Property>> {
        if self.repos.companies.get(company_id).await?.is_none() {
            return Err(AppError::NotFound(format!("company {}", company_id)));
        }

        let cursor = decode_cursor(params.cursor.as_deref())?;
        let mut query = self.repos.properties.query().where_eq("company_id", company_id);
        if let Some(property_type) = params.property_type {
            query = query.where_eq("property_type", serde_json::to_value(property_type)?);
        }
        if let Some(status) = params.status {
            query = query.where_eq("status", serde_json::to_value(status)?);
        }
        let query = query
            .order_by("created_at", Direction::Desc)
            .start_after(cursor);

        Ok(self.repos.properties.find_page(query, limit).await?)
    }

    fn authorize(user: &AuthUser, company_id: &str) -> Result<()> {
        if !user.represents(company_id) {
            return Err(AppError::Forbidden(
                "only the owning company can manage its listings".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        company_id: &str,
        user: &AuthUser,
        req: PropertyRequest,
    ) -> Result<Property> {
        if self.repos.companies.get(company_id).await?.is_none() {
            return Err(AppError::NotFound(format!("company {}", company_id)));
        }
        Self::authorize(user, company_id)?;
        req.validate()?;

        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            title: req.title.trim().to_string(),
            description: clean(req.description),
            property_type: req.property_type,
            status: req.status,
            price: req.price,
            area_sqm: req.area_sqm,
            bedrooms: req.bedrooms,
            bathrooms: req.bathrooms,
            city: clean(req.city),
            images: check_images(&req.images)?,
            created_at: now,
            updated_at: now,
        };

        self.repos.properties.insert(&property).await?;
        info!(property_id = %property.id, company_id = %company_id, "Property created");
        Ok(property)
    }

    pub async fn update(&self, id: &str, user: &AuthUser, req: PropertyRequest) -> Result<Property> {
        let current = self.get(id).await?;
        Self::authorize(user, &current.company_id)?;
        req.validate()?;

        let property = Property {
            title: req.title.trim().to_string(),
            description: clean(req.description),
            property_type: req.property_type,
            status: req.status,
            price: req.price,
            area_sqm: req.area_sqm,
            bedrooms: req.bedrooms,
            bathrooms: req.bathrooms,
            city: clean(req.city),
            images: check_images(&req.images)?,
            updated_at: Utc::now(),
            ..current
        };

        self.repos.properties.put(&property).await?;
        info!(property_id = %id, "Property updated");
        Ok(property)
    }

    pub async fn delete(&self, id: &str, user: &AuthUser) -> Result<()> {
        let current = self.get(id).await?;
        Self::authorize(user, &current.company_id)?;

        self.repos.properties.remove(id).await?;
        info!(property_id = %id, company_id = %current.company_id, "Property deleted");
        Ok(())
    }
}
