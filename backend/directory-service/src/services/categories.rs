//! Company categories. Names are unique ignoring case.

use chrono::Utc;
use doc_store::{Direction, Filter, FilterOp};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::bulk::BulkImportReport;
use super::clean;
use crate::domain::{Category, CategoryRequest};
use crate::error::{AppError, Result};
use crate::repository::Repositories;

#[derive(Clone)]
pub struct CategoryService {
    repos: Repositories,
}

impl CategoryService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> Result<Vec<Category>> {
        let query = self.repos.categories.query().order_by("name", Direction::Asc);
        Ok(self.repos.categories.find(&query).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Category> {
        self.repos
            .categories
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {}", id)))
    }

    fn ensure_unique(existing: &[Category], name: &str, except_id: Option<&str>) -> Result<()> {
        let wanted = name.to_lowercase();
        let taken = existing
            .iter()
            .filter(|c| Some(c.id.as_str()) != except_id)
            .any(|c| c.name.to_lowercase() == wanted);
        if taken {
            return Err(AppError::Conflict(format!("category '{}' already exists", name)));
        }
        Ok(())
    }

    fn build(req: CategoryRequest) -> Result<Category> {
        req.validate()?;
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("category name must not be blank".to_string()));
        }

        let now = Utc::now();
        Ok(Category {
            id: Uuid::new_v4().to_string(),
            name,
            description: clean(req.description),
            icon_url: clean(req.icon_url),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn create(&self, req: CategoryRequest) -> Result<Category> {
        let category = Self::build(req)?;
        let existing = self.list().await?;
        Self::ensure_unique(&existing, &category.name, None)?;

        self.repos.categories.insert(&category).await?;
        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn update(&self, id: &str, req: CategoryRequest) -> Result<Category> {
        let current = self.get(id).await?;
        let built = Self::build(req)?;
        let existing = self.list().await?;
        Self::ensure_unique(&existing, &built.name, Some(id))?;

        let category = Category {
            id: current.id,
            created_at: current.created_at,
            ..built
        };
        self.repos.categories.put(&category).await?;
        info!(category_id = %id, name = %category.name, "Category updated");
        Ok(category)
    }

    /// Delete a category no company refers to.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.get(id).await?;

        let in_use = self
            .repos
            .companies
            .count(&[Filter::new("category_id", FilterOp::Eq, id)])
            .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "category {} is used by {} companies",
                id, in_use
            )));
        }

        self.repos.categories.remove(id).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Create many categories; each row succeeds or fails on its own.
    pub async fn import(&self, rows: Vec<CategoryRequest>) -> Result<BulkImportReport> {
        let mut existing = self.list().await?;
        let mut report = BulkImportReport::new("categories", rows.len());

        for (row, req) in rows.into_iter().enumerate() {
            let outcome = Self::build(req).and_then(|category| {
                Self::ensure_unique(&existing, &category.name, None)?;
                Ok(category)
            });

            let category = match outcome {
                Ok(category) => category,
                Err(e) => {
                    report.record_failed(row, &e);
                    continue;
                }
            };

            match self.repos.categories.insert(&category).await {
                Ok(()) => {
                    report.record_created(row, category.id.clone());
                    existing.push(category);
                }
                Err(e) => report.record_failed(row, &AppError::from(e)),
            }
        }

        info!(
            created = report.created,
            failed = report.failed,
            "Category import finished"
        );
        Ok(report)
    }

    pub async fn export(&self) -> Result<Vec<Category>> {
        self.list().await
    }
}
