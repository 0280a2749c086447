//! Per-row results of admin bulk operations.

use serde::Serialize;

use crate::error::AppError;
use crate::metrics::BULK_IMPORT_ROWS_TOTAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Created,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    /// Zero-based position of the row in the submitted array
    pub row: usize,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a bulk import. Valid rows are stored even when others fail.
#[derive(Debug, Clone, Serialize)]
pub struct BulkImportReport {
    pub total: usize,
    pub created: usize,
    pub failed: usize,
    pub rows: Vec<RowOutcome>,
    #[serde(skip)]
    entity: &'static str,
}

impl BulkImportReport {
    pub fn new(entity: &'static str, total: usize) -> Self {
        Self {
            total,
            created: 0,
            failed: 0,
            rows: Vec::with_capacity(total),
            entity,
        }
    }

    pub fn record_created(&mut self, row: usize, id: String) {
        self.created += 1;
        BULK_IMPORT_ROWS_TOTAL
            .with_label_values(&[self.entity, "created"])
            .inc();
        self.rows.push(RowOutcome {
            row,
            status: RowStatus::Created,
            id: Some(id),
            error: None,
        });
    }

    pub fn record_failed(&mut self, row: usize, error: &AppError) {
        self.failed += 1;
        BULK_IMPORT_ROWS_TOTAL
            .with_label_values(&[self.entity, "failed"])
            .inc();
        self.rows.push(RowOutcome {
            row,
            status: RowStatus::Failed,
            id: None,
            error: Some(error.public_message()),
        });
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleteOutcome {
    pub id: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_rows() {
        let mut report = BulkImportReport::new("categories", 2);
        report.record_created(0, "cat-1".into());
        report.record_failed(1, &AppError::Conflict("duplicate name".into()));

        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"][0]["status"], "created");
        assert_eq!(json["rows"][1]["error"], "Conflict: duplicate name");
        assert!(json["rows"][1].get("id").is_none());
        assert!(json.get("entity").is_none());
    }

    #[test]
    fn test_storage_failures_are_redacted() {
        let mut report = BulkImportReport::new("companies", 1);
        let err = AppError::Store(doc_store::DocStoreError::Database(sqlx::Error::PoolTimedOut));
        report.record_failed(0, &err);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"][0]["error"], "Storage error occurred");
    }
}
