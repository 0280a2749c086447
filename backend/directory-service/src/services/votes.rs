//! Helpful / not-helpful votes on reviews.
//!
//! The counters on a review are recomputed from the vote documents after
//! every vote change, the same way company aggregates follow reviews.

use actix_middleware::AuthUser;
use chrono::Utc;
use doc_store::{Filter, FilterOp};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::Vote;
use crate::error::{AppError, Result};
use crate::metrics::VOTES_TOTAL;
use crate::repository::Repositories;

#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub review_id: String,
    pub helpful_count: u64,
    pub not_helpful_count: u64,
    /// The caller's current vote, if any
    pub vote: Option<bool>,
}

#[derive(Clone)]
pub struct VoteService {
    repos: Repositories,
}

impl VoteService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Cast or change the caller's vote. Repeating the same vote changes
    /// nothing.
    pub async fn cast(&self, review_id: &str, user: &AuthUser, helpful: bool) -> Result<VoteOutcome> {
        let review = self
            .repos
            .reviews
            .get(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))?;
        if review.user_id == user.id {
            return Err(AppError::BadRequest(
                "you cannot vote on your own review".to_string(),
            ));
        }

        let key = Vote::key(review_id, &user.id);
        match self.repos.votes.get(&key).await? {
            Some(existing) if existing.helpful == helpful => {
                return Ok(VoteOutcome {
                    review_id: review_id.to_string(),
                    helpful_count: review.helpful_count,
                    not_helpful_count: review.not_helpful_count,
                    vote: Some(helpful),
                });
            }
            Some(existing) => {
                let changed = Vote { helpful, ..existing };
                self.repos.votes.put(&changed).await?;
                VOTES_TOTAL.with_label_values(&["changed"]).inc();
            }
            None => {
                let vote = Vote {
                    id: key,
                    review_id: review_id.to_string(),
                    user_id: user.id.clone(),
                    helpful,
                    created_at: Utc::now(),
                };
                self.repos.votes.put(&vote).await?;
                VOTES_TOTAL.with_label_values(&["cast"]).inc();
            }
        }

        let (helpful_count, not_helpful_count) = self.recount(review_id).await?;
        info!(review_id = %review_id, user_id = %user.id, helpful, "Vote recorded");
        Ok(VoteOutcome {
            review_id: review_id.to_string(),
            helpful_count,
            not_helpful_count,
            vote: Some(helpful),
        })
    }

    /// Remove the caller's vote.
    pub async fn retract(&self, review_id: &str, user: &AuthUser) -> Result<VoteOutcome> {
        if self.repos.reviews.get(review_id).await?.is_none() {
            return Err(AppError::NotFound(format!("review {}", review_id)));
        }

        let key = Vote::key(review_id, &user.id);
        if !self.repos.votes.remove(&key).await? {
            return Err(AppError::NotFound("you have not voted on this review".to_string()));
        }
        VOTES_TOTAL.with_label_values(&["retracted"]).inc();

        let (helpful_count, not_helpful_count) = self.recount(review_id).await?;
        info!(review_id = %review_id, user_id = %user.id, "Vote retracted");
        Ok(VoteOutcome {
            review_id: review_id.to_string(),
            helpful_count,
            not_helpful_count,
            vote: None,
        })
    }

    /// Count votes by kind and store the counters on the review.
    async fn recount(&self, review_id: &str) -> Result<(u64, u64)> {
        let count = |helpful: bool| {
            [
                Filter::new("review_id", FilterOp::Eq, review_id),
                Filter::new("helpful", FilterOp::Eq, helpful),
            ]
        };
        let helpful = self.repos.votes.count(&count(true)).await?;
        let not_helpful = self.repos.votes.count(&count(false)).await?;

        let mut patch = Map::new();
        patch.insert("helpful_count".into(), Value::from(helpful));
        patch.insert("not_helpful_count".into(), Value::from(not_helpful));
        self.repos.reviews.patch(review_id, patch).await?;

        debug!(
            review_id = %review_id,
            helpful,
            not_helpful,
            "Vote counters recomputed"
        );
        Ok((helpful, not_helpful))
    }
}
