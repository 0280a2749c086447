//! Review reports and their moderation.

use actix_middleware::AuthUser;
use chrono::Utc;
use doc_store::{DocStoreError, Page};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::reviews::ReviewService;
use super::{clean, decode_cursor};
use crate::domain::{
    timestamp, Report, ReportListQuery, ReportRequest, ReportStatus, ResolveAction,
};
use crate::error::{AppError, Result};
use crate::metrics::REPORTS_TOTAL;
use crate::repository::Repositories;

/// One report per user per review.
fn report_id(review_id: &str, reporter_id: &str) -> String {
    let name = format!("report:{}:{}", review_id, reporter_id);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

#[derive(Clone)]
pub struct ReportService {
    repos: Repositories,
    reviews: ReviewService,
}

impl ReportService {
    pub fn new(repos: Repositories, reviews: ReviewService) -> Self {
        Self { repos, reviews }
    }

    pub async fn create(
        &self,
        review_id: &str,
        user: &AuthUser,
        req: ReportRequest,
    ) -> Result<Report> {
        req.validate()?;
        let review = self.reviews.get(review_id).await?;
        if review.user_id == user.id {
            return Err(AppError::BadRequest(
                "you cannot report your own review".to_string(),
            ));
        }

        let report = Report {
            id: report_id(review_id, &user.id),
            review_id: review_id.to_string(),
            company_id: review.company_id.clone(),
            reporter_id: user.id.clone(),
            reason: req.reason,
            details: clean(req.details),
            status: ReportStatus::Pending,
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        };

        match self.repos.reports.insert(&report).await {
            Ok(()) => {}
            Err(DocStoreError::AlreadyExists { .. }) => {
                return Err(AppError::Conflict(
                    "you have already reported this review".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        }

        REPORTS_TOTAL.with_label_values(&["filed"]).inc();
        info!(report_id = %report.id, review_id = %review_id, reason = ?report.reason, "Review reported");
        Ok(report)
    }

    /// Reports in one status (pending by default), newest first.
    pub async fn list(&self, params: ReportListQuery, limit: usize) -> Result<Page<Report>> {
        let status = params.status.unwrap_or_default();
        let cursor = decode_cursor(params.cursor.as_deref())?;
        let query = self
            .repos
            .reports
            .query()
            .where_eq("status", status.as_str())
            .order_by("created_at", doc_store::Direction::Desc)
            .start_after(cursor);

        Ok(self.repos.reports.find_page(query, limit).await?)
    }

    /// Dismiss a report, or remove the reported review. Removing a review
    /// resolves every pending report against it.
    pub async fn resolve(
        &self,
        report_id: &str,
        admin: &AuthUser,
        action: ResolveAction,
    ) -> Result<Report> {
        let report = self
            .repos
            .reports
            .get(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("report {}", report_id)))?;
        if report.status != ReportStatus::Pending {
            return Err(AppError::Conflict(format!(
                "report {} is already {}",
                report_id,
                report.status.as_str()
            )));
        }

        match action {
            ResolveAction::Dismiss => {
                self.close(&report.id, ReportStatus::Dismissed, admin).await?;
                REPORTS_TOTAL.with_label_values(&["dismissed"]).inc();
            }
            ResolveAction::RemoveReview => {
                if let Some(review) = self.repos.reviews.get(&report.review_id).await? {
                    self.reviews.remove_for_moderation(&review).await?;
                }

                let pending = self
                    .repos
                    .reports
                    .find(
                        &self
                            .repos
                            .reports
                            .query()
                            .where_eq("review_id", report.review_id.as_str())
                            .where_eq("status", ReportStatus::Pending.as_str()),
                    )
                    .await?;
                for other in &pending {
                    self.close(&other.id, ReportStatus::Resolved, admin).await?;
                }
                REPORTS_TOTAL.with_label_values(&["resolved"]).inc();
            }
        }

        info!(report_id = %report_id, action = ?action, admin_id = %admin.id, "Report resolved");
        self.repos
            .reports
            .get(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("report {}", report_id)))
    }

    async fn close(&self, report_id: &str, status: ReportStatus, admin: &AuthUser) -> Result<()> {
        let mut patch = Map::new();
        patch.insert("status".into(), Value::from(status.as_str()));
        patch.insert("resolved_by".into(), Value::from(admin.id.clone()));
        patch.insert("resolved_at".into(), timestamp::to_value(&Utc::now()));
        self.repos.reports.patch(report_id, patch).await?;
        Ok(())
    }
}
