//! Request payloads. Aggregates, ids and timestamps are never accepted from
//! clients; they are assigned by the services.

use serde::Deserialize;
use validator::Validate;

use super::models::{PropertyStatus, PropertyType, RatingDetails, ReportReason};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(url)]
    pub icon_url: Option<String>,
}

/// Public profile fields of a company, shared by admin create/update and
/// bulk import rows.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompanyProfile {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    #[validate(url)]
    pub cover_image_url: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(range(min = 1800, max = 2100))]
    pub established_year: Option<i32>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompanyRequest {
    #[validate(length(min = 1))]
    pub category_id: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: CompanyProfile,
}

/// One row of a company bulk import. The category is referenced either by
/// id or by (case-insensitive) name.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompanyImportRow {
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: CompanyProfile,
}

/// Fields a company representative may change on their own company.
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompanyProfileUpdate {
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    #[validate(url)]
    pub cover_image_url: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub status: PropertyStatus,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub area_sqm: Option<f64>,
    #[validate(range(max = 100))]
    pub bedrooms: Option<u32>,
    #[validate(range(max = 100))]
    pub bathrooms: Option<u32>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub images: Vec<String>,
}

/// Create or edit a review. `rating` may be omitted when `rating_details`
/// is given; it is then derived from the details.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,
    #[validate(nested)]
    pub rating_details: Option<RatingDetails>,
    #[validate(length(max = 150))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VoteRequest {
    pub helpful: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportRequest {
    pub reason: ReportReason,
    #[validate(length(max = 1000))]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveAction {
    Dismiss,
    RemoveReview,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResolveReportRequest {
    pub action: ResolveAction,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<String>,
}
