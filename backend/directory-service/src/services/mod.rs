//! Business logic. Handlers stay thin: they extract the caller and payload
//! and delegate here.

pub mod aggregates;
pub mod bulk;
pub mod categories;
pub mod companies;
pub mod properties;
pub mod reports;
pub mod reviews;
pub mod votes;

pub use aggregates::{compute_aggregate, AggregateService, CompanyAggregate, RatingSummary};
pub use bulk::{BulkDeleteOutcome, BulkImportReport, RowOutcome, RowStatus};
pub use categories::CategoryService;
pub use companies::{CompanyDeletion, CompanyExport, CompanyService};
pub use properties::PropertyService;
pub use reports::ReportService;
pub use reviews::ReviewService;
pub use votes::{VoteOutcome, VoteService};

use doc_store::Cursor;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Decode an optional client-supplied cursor.
pub(crate) fn decode_cursor(raw: Option<&str>) -> Result<Option<Cursor>> {
    match raw {
        Some(raw) if !raw.is_empty() => Ok(Some(Cursor::decode(raw)?)),
        _ => Ok(None),
    }
}

/// Parse an optional sort key, falling back to the default order.
pub(crate) fn parse_sort<T>(raw: Option<&str>) -> Result<T>
where
    T: FromStr<Err = String> + Default,
{
    match raw {
        Some(raw) if !raw.is_empty() => raw.parse().map_err(AppError::BadRequest),
        _ => Ok(T::default()),
    }
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CompanySort;

    #[test]
    fn test_parse_sort_defaults_and_rejects_unknown() {
        assert_eq!(parse_sort::<CompanySort>(None).unwrap(), CompanySort::Rating);
        assert_eq!(parse_sort::<CompanySort>(Some("")).unwrap(), CompanySort::Rating);
        assert!(matches!(
            parse_sort::<CompanySort>(Some("trending")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_decode_cursor_rejects_garbage() {
        assert!(decode_cursor(None).unwrap().is_none());
        assert!(matches!(
            decode_cursor(Some("!!not-a-cursor!!")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Some("  Cairo ".into())), Some("Cairo".into()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }
}
