//! Query-string parameters for list endpoints and the sort orders they map to.

use doc_store::Direction;
use serde::Deserialize;
use std::str::FromStr;

use super::models::{PropertyStatus, PropertyType, ReportStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyListQuery {
    pub category_id: Option<String>,
    pub city: Option<String>,
    pub verified: Option<bool>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewListQuery {
    pub rating: Option<u8>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyListQuery {
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompanySort {
    #[default]
    Rating,
    Reviews,
    Newest,
    Name,
}

impl CompanySort {
    pub fn order(self) -> (&'static str, Direction) {
        match self {
            CompanySort::Rating => ("total_rating", Direction::Desc),
            CompanySort::Reviews => ("total_reviews", Direction::Desc),
            CompanySort::Newest => ("created_at", Direction::Desc),
            CompanySort::Name => ("name", Direction::Asc),
        }
    }
}

impl FromStr for CompanySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(CompanySort::Rating),
            "reviews" => Ok(CompanySort::Reviews),
            "newest" => Ok(CompanySort::Newest),
            "name" => Ok(CompanySort::Name),
            other => Err(format!(
                "unknown sort '{}' (expected rating, reviews, newest or name)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
    Helpful,
}

impl ReviewSort {
    pub fn order(self) -> (&'static str, Direction) {
        match self {
            ReviewSort::Newest => ("created_at", Direction::Desc),
            ReviewSort::Oldest => ("created_at", Direction::Asc),
            ReviewSort::Highest => ("rating", Direction::Desc),
            ReviewSort::Lowest => ("rating", Direction::Asc),
            ReviewSort::Helpful => ("helpful_count", Direction::Desc),
        }
    }
}

impl FromStr for ReviewSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(ReviewSort::Newest),
            "oldest" => Ok(ReviewSort::Oldest),
            "highest" => Ok(ReviewSort::Highest),
            "lowest" => Ok(ReviewSort::Lowest),
            "helpful" => Ok(ReviewSort::Helpful),
            other => Err(format!(
                "unknown sort '{}' (expected newest, oldest, highest, lowest or helpful)",
                other
            )),
        }
    }
}
