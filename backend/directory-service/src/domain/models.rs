use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::timestamp;

/// A document type stored in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

macro_rules! entity {
    ($ty:ty, $collection:literal) => {
        impl Entity for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

/// Company category (developer, brokerage, finishing contractor...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

entity!(Category, "categories");

/// Real-estate company being reviewed.
///
/// `total_rating` and `total_reviews` are derived from the company's reviews
/// and only ever written by the aggregate service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub established_year: Option<i32>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub total_rating: f64,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

entity!(Company, "companies");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    Villa,
    Townhouse,
    Duplex,
    Penthouse,
    Chalet,
    Office,
    Retail,
    Land,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Available,
    Reserved,
    Sold,
    Rented,
}

/// Unit listing owned by a company. Prices are in EGP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub company_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub area_sqm: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

entity!(Property, "properties");

/// Per-category scores, each 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RatingDetails {
    #[validate(range(min = 1, max = 5))]
    pub construction_quality: u8,
    #[validate(range(min = 1, max = 5))]
    pub delivery_commitment: u8,
    #[validate(range(min = 1, max = 5))]
    pub customer_service: u8,
    #[validate(range(min = 1, max = 5))]
    pub value_for_money: u8,
}

impl RatingDetails {
    pub fn scores(&self) -> [u8; 4] {
        [
            self.construction_quality,
            self.delivery_commitment,
            self.customer_service,
            self.value_for_money,
        ]
    }

    pub fn mean(&self) -> f64 {
        self.scores().iter().map(|s| f64::from(*s)).sum::<f64>() / 4.0
    }

    /// Overall star rating implied by the details (half rounds up).
    pub fn overall(&self) -> u8 {
        self.mean().round().clamp(1.0, 5.0) as u8
    }
}

/// The single response a company may attach to a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReply {
    pub text: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub company_id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub rating_details: Option<RatingDetails>,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub helpful_count: u64,
    #[serde(default)]
    pub not_helpful_count: u64,
    #[serde(default)]
    pub company_reply: Option<CompanyReply>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

entity!(Review, "reviews");

/// A user's helpful / not-helpful vote on a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub review_id: String,
    pub user_id: String,
    pub helpful: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

entity!(Vote, "votes");

impl Vote {
    /// One vote per user per review.
    pub fn key(review_id: &str, user_id: &str) -> String {
        format!("{}:{}", review_id, user_id)
    }
}

/// Marks that a user holds the one review allowed per company. Its id is
/// derived from (company, user), so a second claim is rejected by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewClaim {
    pub id: String,
    pub review_id: String,
    pub company_id: String,
    pub user_id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

entity!(ReviewClaim, "review_claims");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Offensive,
    Fake,
    ConflictOfInterest,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

/// A user's moderation report against a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub review_id: String,
    pub company_id: String,
    pub reporter_id: String,
    pub reason: ReportReason,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

entity!(Report, "reports");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_rating_rounds_half_up() {
        let details = RatingDetails {
            construction_quality: 4,
            delivery_commitment: 3,
            customer_service: 4,
            value_for_money: 3,
        };
        assert_eq!(details.mean(), 3.5);
        assert_eq!(details.overall(), 4);

        let low = RatingDetails {
            construction_quality: 1,
            delivery_commitment: 1,
            customer_service: 2,
            value_for_money: 1,
        };
        assert_eq!(low.overall(), 1);
    }

    #[test]
    fn test_enums_use_snake_case() {
        assert_eq!(
            serde_json::to_value(ReportReason::ConflictOfInterest).unwrap(),
            "conflict_of_interest"
        );
        assert_eq!(serde_json::to_value(PropertyType::Penthouse).unwrap(), "penthouse");
        assert_eq!(PropertyStatus::default(), PropertyStatus::Available);
    }

    #[test]
    fn test_company_aggregates_default_when_absent() {
        let company: Company = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Palm Hills",
            "category_id": "dev",
            "created_at": "2025-01-01T00:00:00.000000Z",
            "updated_at": "2025-01-01T00:00:00.000000Z"
        }))
        .unwrap();

        assert_eq!(company.total_rating, 0.0);
        assert_eq!(company.total_reviews, 0);
        assert!(!company.verified);
        assert_eq!(company.id(), "c1");
    }
}
