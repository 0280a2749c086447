//! Denormalized company rating aggregates.
//!
//! `total_rating` and `total_reviews` on a company are a cache over its
//! reviews. Every review mutation calls [`AggregateService::recompute_company`]
//! afterwards; there is no transaction around the pair, so concurrent writers
//! converge on the next recompute.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map};
use tracing::{debug, info};

use crate::domain::{timestamp, Review};
use crate::error::{AppError, Result};
use crate::metrics::AGGREGATE_RECOMPUTATIONS_TOTAL;
use crate::repository::Repositories;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompanyAggregate {
    pub total_rating: f64,
    pub total_reviews: u64,
}

/// `sum / count` rounded half away from zero to one decimal place.
///
/// Computed in integers, so exact halves such as 4.25 and 4.35 round up.
pub fn average_one_decimal(sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let tenths = (20 * sum + count) / (2 * count);
    tenths as f64 / 10.0
}

/// Average star rating (one decimal) and review count.
pub fn compute_aggregate(ratings: &[u8]) -> CompanyAggregate {
    let count = ratings.len() as u64;
    let sum: u64 = ratings.iter().map(|r| u64::from(*r)).sum();
    CompanyAggregate {
        total_rating: average_one_decimal(sum, count),
        total_reviews: count,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StarCount {
    pub stars: u8,
    pub count: u64,
    pub percentage: f64,
}

/// Average of each rating category over the reviews that carry details.
#[derive(Debug, Clone, Serialize)]
pub struct DetailAverages {
    pub construction_quality: f64,
    pub delivery_commitment: f64,
    pub customer_service: f64,
    pub value_for_money: f64,
    pub reviews_with_details: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    pub company_id: String,
    pub total_rating: f64,
    pub total_reviews: u64,
    /// Five stars first
    pub distribution: Vec<StarCount>,
    pub details: Option<DetailAverages>,
}

impl RatingSummary {
    pub fn from_reviews(company_id: &str, reviews: &[Review]) -> Self {
        let ratings: Vec<u8> = reviews.iter().map(|r| r.rating).collect();
        let aggregate = compute_aggregate(&ratings);

        let distribution = (1..=5u8)
            .rev()
            .map(|stars| {
                let count = ratings.iter().filter(|r| **r == stars).count() as u64;
                StarCount {
                    stars,
                    count,
                    percentage: average_one_decimal(count * 100, aggregate.total_reviews),
                }
            })
            .collect();

        let mut sums = [0u64; 4];
        let mut with_details = 0u64;
        for details in reviews.iter().filter_map(|r| r.rating_details.as_ref()) {
            with_details += 1;
            for (sum, score) in sums.iter_mut().zip(details.scores()) {
                *sum += u64::from(score);
            }
        }

        let details = (with_details > 0).then(|| DetailAverages {
            construction_quality: average_one_decimal(sums[0], with_details),
            delivery_commitment: average_one_decimal(sums[1], with_details),
            customer_service: average_one_decimal(sums[2], with_details),
            value_for_money: average_one_decimal(sums[3], with_details),
            reviews_with_details: with_details,
        });

        Self {
            company_id: company_id.to_string(),
            total_rating: aggregate.total_rating,
            total_reviews: aggregate.total_reviews,
            distribution,
            details,
        }
    }
}

#[derive(Clone)]
pub struct AggregateService {
    repos: Repositories,
}

impl AggregateService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn company_reviews(&self, company_id: &str) -> Result<Vec<Review>> {
        let query = self.repos.reviews.query().where_eq("company_id", company_id);
        Ok(self.repos.reviews.find(&query).await?)
    }

    /// Recompute and store the aggregate of one company from its reviews.
    pub async fn recompute_company(&self, company_id: &str) -> Result<CompanyAggregate> {
        let reviews = self.company_reviews(company_id).await?;
        let ratings: Vec<u8> = reviews.iter().map(|r| r.rating).collect();
        let aggregate = compute_aggregate(&ratings);

        let mut patch = Map::new();
        patch.insert("total_rating".into(), json!(aggregate.total_rating));
        patch.insert("total_reviews".into(), json!(aggregate.total_reviews));
        patch.insert("updated_at".into(), timestamp::to_value(&Utc::now()));
        self.repos.companies.patch(company_id, patch).await?;

        AGGREGATE_RECOMPUTATIONS_TOTAL.inc();
        debug!(
            company_id = %company_id,
            total_rating = aggregate.total_rating,
            total_reviews = aggregate.total_reviews,
            "Company aggregate recomputed"
        );
        Ok(aggregate)
    }

    /// Star distribution and per-category averages, computed from the
    /// company's current reviews.
    pub async fn rating_summary(&self, company_id: &str) -> Result<RatingSummary> {
        if self.repos.companies.get(company_id).await?.is_none() {
            return Err(AppError::NotFound(format!("company {}", company_id)));
        }
        let reviews = self.company_reviews(company_id).await?;
        Ok(RatingSummary::from_reviews(company_id, &reviews))
    }

    /// Recompute every company. Returns how many were updated.
    pub async fn recompute_all(&self) -> Result<usize> {
        let companies = self.repos.companies.find(&self.repos.companies.query()).await?;
        let mut updated = 0;
        for company in &companies {
            self.recompute_company(&company.id).await?;
            updated += 1;
        }
        info!(companies = updated, "Recomputed all company aggregates");
        Ok(updated)
    }
}
