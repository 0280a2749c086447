//! Reviews and company replies.

use actix_middleware::{AuthUser, Role};
use chrono::Utc;
use doc_store::{DocStoreError, Page};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::aggregates::AggregateService;
use super::{clean, decode_cursor, parse_sort};
use crate::domain::{
    timestamp, CompanyReply, PageQuery, ReplyRequest, Review, ReviewClaim, ReviewListQuery,
    ReviewRequest, ReviewSort,
};
use crate::error::{AppError, Result};
use crate::metrics::REVIEWS_TOTAL;
use crate::repository::Repositories;

/// Key of the claim a user holds on a company's single review slot.
pub fn claim_id(company_id: &str, user_id: &str) -> String {
    let name = format!("review:{}:{}", company_id, user_id);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Star rating for a request: explicit, or derived from the details.
fn resolve_rating(req: &ReviewRequest) -> Result<u8> {
    match (req.rating, req.rating_details.as_ref()) {
        (Some(rating), _) => Ok(rating),
        (None, Some(details)) => Ok(details.overall()),
        (None, None) => Err(AppError::BadRequest(
            "rating is required unless rating_details are provided".to_string(),
        )),
    }
}

#[derive(Clone)]
pub struct ReviewService {
    repos: Repositories,
    aggregates: AggregateService,
}

impl ReviewService {
    pub fn new(repos: Repositories, aggregates: AggregateService) -> Self {
        Self { repos, aggregates }
    }

    pub async fn get(&self, review_id: &str) -> Result<Review> {
        self.repos
            .reviews
            .get(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))
    }

    pub async fn list_for_company(
        &self,
        company_id: &str,
        params: ReviewListQuery,
        limit: usize,
    ) -> Result<Page<Review>> {
        if self.repos.companies.get(company_id).await?.is_none() {
            return Err(AppError::NotFound(format!("company {}", company_id)));
        }

        let sort: ReviewSort = parse_sort(params.sort.as_deref())?;
        let cursor = decode_cursor(params.cursor.as_deref())?;
        let (field, direction) = sort.order();

        let mut query = self.repos.reviews.query().where_eq("company_id", company_id);
        if let Some(rating) = params.rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::BadRequest("rating filter must be 1 to 5".to_string()));
            }
            query = query.where_eq("rating", rating);
        }
        let query = query.order_by(field, direction).start_after(cursor);

        Ok(self.repos.reviews.find_page(query, limit).await?)
    }

    /// Reviews written by one user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        params: PageQuery,
        limit: usize,
    ) -> Result<Page<Review>> {
        let cursor = decode_cursor(params.cursor.as_deref())?;
        let (field, direction) = ReviewSort::Newest.order();
        let query = self
            .repos
            .reviews
            .query()
            .where_eq("user_id", user_id)
            .order_by(field, direction)
            .start_after(cursor);

        Ok(self.repos.reviews.find_page(query, limit).await?)
    }

    pub async fn create(
        &self,
        company_id: &str,
        user: &AuthUser,
        req: ReviewRequest,
    ) -> Result<Review> {
        req.validate()?;
        let rating = resolve_rating(&req)?;

        if self.repos.companies.get(company_id).await?.is_none() {
            return Err(AppError::NotFound(format!("company {}", company_id)));
        }
        if user.role == Role::Company && user.company_id.as_deref() == Some(company_id) {
            return Err(AppError::Forbidden(
                "company representatives cannot review their own company".to_string(),
            ));
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            user_id: user.id.clone(),
            user_name: user.display_name(),
            rating,
            rating_details: req.rating_details,
            title: clean(req.title),
            content: req.content.trim().to_string(),
            helpful_count: 0,
            not_helpful_count: 0,
            company_reply: None,
            created_at: now,
            updated_at: now,
        };

        self.claim(&review).await?;
        if let Err(e) = self.repos.reviews.insert(&review).await {
            self.release_claim(&review).await?;
            return Err(e.into());
        }

        self.aggregates.recompute_company(company_id).await?;
        REVIEWS_TOTAL.with_label_values(&["created"]).inc();
        info!(
            review_id = %review.id,
            company_id = %company_id,
            user_id = %user.id,
            rating,
            "Review created"
        );
        Ok(review)
    }

    /// Edit rating, details, title and content. Author only.
    pub async fn update(
        &self,
        review_id: &str,
        user: &AuthUser,
        req: ReviewRequest,
    ) -> Result<Review> {
        req.validate()?;
        let rating = resolve_rating(&req)?;

        let mut review = self.get(review_id).await?;
        if review.user_id != user.id {
            return Err(AppError::Forbidden(
                "only the author can edit a review".to_string(),
            ));
        }

        review.rating = rating;
        review.rating_details = req.rating_details;
        review.title = clean(req.title);
        review.content = req.content.trim().to_string();
        review.updated_at = Utc::now();

        let mut patch = Map::new();
        patch.insert("rating".into(), Value::from(review.rating));
        patch.insert(
            "rating_details".into(),
            serde_json::to_value(review.rating_details)?,
        );
        patch.insert("title".into(), serde_json::to_value(&review.title)?);
        patch.insert("content".into(), Value::from(review.content.clone()));
        patch.insert("updated_at".into(), timestamp::to_value(&review.updated_at));
        self.repos.reviews.patch(review_id, patch).await?;

        self.aggregates.recompute_company(&review.company_id).await?;
        REVIEWS_TOTAL.with_label_values(&["updated"]).inc();
        info!(review_id = %review_id, rating, "Review updated");
        Ok(review)
    }

    /// Delete a review with its votes and reports. Author or admin.
    pub async fn delete(&self, review_id: &str, user: &AuthUser) -> Result<()> {
        let review = self.get(review_id).await?;
        if review.user_id != user.id && !user.is_admin() {
            return Err(AppError::Forbidden(
                "only the author or an admin can delete a review".to_string(),
            ));
        }

        self.purge(&review, false).await?;
        self.refresh_company(&review.company_id).await?;
        info!(review_id = %review_id, deleted_by = %user.id, "Review deleted");
        Ok(())
    }

    /// Remove a review after a moderation decision. Its reports are kept as
    /// the moderation record.
    pub(crate) async fn remove_for_moderation(&self, review: &Review) -> Result<()> {
        self.purge(review, true).await?;
        self.refresh_company(&review.company_id).await
    }

    /// Take the author's review slot for the company. A claim left behind by
    /// a review that no longer exists is replaced.
    async fn claim(&self, review: &Review) -> Result<()> {
        let claim = ReviewClaim {
            id: claim_id(&review.company_id, &review.user_id),
            review_id: review.id.clone(),
            company_id: review.company_id.clone(),
            user_id: review.user_id.clone(),
            created_at: review.created_at,
        };

        match self.repos.review_claims.insert(&claim).await {
            Ok(()) => Ok(()),
            Err(DocStoreError::AlreadyExists { .. }) => {
                let held = self.repos.review_claims.get(&claim.id).await?;
                let live = match held {
                    Some(held) => self.repos.reviews.get(&held.review_id).await?.is_some(),
                    None => false,
                };
                if live {
                    return Err(AppError::Conflict(
                        "you have already reviewed this company".to_string(),
                    ));
                }
                warn!(claim_id = %claim.id, "Replacing stale review claim");
                self.repos.review_claims.put(&claim).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Free the author's review slot if this review holds it.
    async fn release_claim(&self, review: &Review) -> Result<()> {
        let key = claim_id(&review.company_id, &review.user_id);
        if let Some(claim) = self.repos.review_claims.get(&key).await? {
            if claim.review_id == review.id {
                self.repos.review_claims.remove(&key).await?;
            }
        }
        Ok(())
    }

    /// Delete a review and its votes (and reports unless `keep_reports`).
    /// Does not touch the company aggregate.
    pub(crate) async fn purge(&self, review: &Review, keep_reports: bool) -> Result<()> {
        let votes = self
            .repos
            .votes
            .find(&self.repos.votes.query().where_eq("review_id", review.id.as_str()))
            .await?;
        for vote in &votes {
            self.repos.votes.remove(&vote.id).await?;
        }

        if !keep_reports {
            let reports = self
                .repos
                .reports
                .find(&self.repos.reports.query().where_eq("review_id", review.id.as_str()))
                .await?;
            for report in &reports {
                self.repos.reports.remove(&report.id).await?;
            }
        }

        self.repos.reviews.remove(&review.id).await?;
        self.release_claim(review).await?;
        REVIEWS_TOTAL.with_label_values(&["deleted"]).inc();
        Ok(())
    }

    /// Recompute after a removal; the company may already be gone.
    async fn refresh_company(&self, company_id: &str) -> Result<()> {
        match self.aggregates.recompute_company(company_id).await {
            Ok(_) => Ok(()),
            Err(AppError::NotFound(_)) => {
                warn!(company_id = %company_id, "Company missing while recomputing aggregate");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Create or replace the company reply. Representative of the review's
    /// company or admin.
    pub async fn set_reply(
        &self,
        review_id: &str,
        user: &AuthUser,
        req: ReplyRequest,
    ) -> Result<Review> {
        req.validate()?;
        let text = req.text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::BadRequest("reply text must not be blank".to_string()));
        }

        let mut review = self.get(review_id).await?;
        if !user.represents(&review.company_id) {
            return Err(AppError::Forbidden(
                "only the reviewed company can reply".to_string(),
            ));
        }

        let now = Utc::now();
        let created_at = review
            .company_reply
            .as_ref()
            .map(|reply| reply.created_at)
            .unwrap_or(now);
        let reply = CompanyReply {
            text,
            author_id: user.id.clone(),
            author_name: user.name.clone(),
            created_at,
            updated_at: now,
        };

        let mut patch = Map::new();
        patch.insert("company_reply".into(), serde_json::to_value(&reply)?);
        self.repos.reviews.patch(review_id, patch).await?;

        info!(review_id = %review_id, company_id = %review.company_id, "Company reply saved");
        review.company_reply = Some(reply);
        Ok(review)
    }

    pub async fn delete_reply(&self, review_id: &str, user: &AuthUser) -> Result<()> {
        let review = self.get(review_id).await?;
        if !user.represents(&review.company_id) {
            return Err(AppError::Forbidden(
                "only the reviewed company can remove its reply".to_string(),
            ));
        }
        if review.company_reply.is_none() {
            return Err(AppError::NotFound(format!("reply on review {}", review_id)));
        }

        let mut patch = Map::new();
        patch.insert("company_reply".into(), Value::Null);
        self.repos.reviews.patch(review_id, patch).await?;

        info!(review_id = %review_id, "Company reply removed");
        Ok(())
    }
}
