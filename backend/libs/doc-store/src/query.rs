//! Query model shared by every back end.
//!
//! Ordering follows JSONB semantics so that the in-memory store and the
//! PostgreSQL store return documents in the same order:
//! `null < string < number < bool < array < object`, ties broken by id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::cursor::Cursor;
use crate::error::{DocStoreError, DocStoreResult};
use crate::Document;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Field equals one element of the filter's array value
    In,
    /// Case-insensitive substring match on string fields
    TextContains,
}

/// A single predicate on a top-level document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate the predicate against a document body.
    pub fn matches(&self, data: &Value) -> bool {
        let field = field_value(data, &self.field);

        match self.op {
            FilterOp::Eq => compare_values(field, &self.value) == Ordering::Equal,
            FilterOp::Gt => compare_values(field, &self.value) == Ordering::Greater,
            FilterOp::Gte => compare_values(field, &self.value) != Ordering::Less,
            FilterOp::Lt => compare_values(field, &self.value) == Ordering::Less,
            FilterOp::Lte => compare_values(field, &self.value) != Ordering::Greater,
            FilterOp::In => match &self.value {
                Value::Array(candidates) => candidates
                    .iter()
                    .any(|candidate| compare_values(field, candidate) == Ordering::Equal),
                _ => false,
            },
            FilterOp::TextContains => match (field, &self.value) {
                (Value::String(haystack), Value::String(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub start_after: Option<Cursor>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            start_after: None,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::new(field, op, value));
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reject field names that are not plain identifiers.
    pub fn validate(&self) -> DocStoreResult<()> {
        for filter in &self.filters {
            validate_field(&filter.field)?;
        }
        if let Some(order) = &self.order_by {
            validate_field(&order.field)?;
        }
        Ok(())
    }

    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }

    /// Total order of two documents under this query's ordering.
    pub fn compare_documents(&self, a: &Document, b: &Document) -> Ordering {
        match &self.order_by {
            Some(order) => {
                let ord = compare_values(
                    field_value(&a.data, &order.field),
                    field_value(&b.data, &order.field),
                )
                .then_with(|| a.id.cmp(&b.id));
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            }
            None => a.id.cmp(&b.id),
        }
    }

    /// Whether `doc` sorts strictly after `cursor`.
    pub fn is_after(&self, doc: &Document, cursor: &Cursor) -> bool {
        match &self.order_by {
            Some(order) => {
                let ord = compare_values(field_value(&doc.data, &order.field), &cursor.value)
                    .then_with(|| doc.id.as_str().cmp(cursor.id.as_str()));
                match order.direction {
                    Direction::Asc => ord == Ordering::Greater,
                    Direction::Desc => ord == Ordering::Less,
                }
            }
            None => doc.id.as_str() > cursor.id.as_str(),
        }
    }

    /// Cursor positioned on `doc`.
    pub fn cursor_for(&self, doc: &Document) -> Cursor {
        let value = match &self.order_by {
            Some(order) => field_value(&doc.data, &order.field).clone(),
            None => Value::Null,
        };
        Cursor::new(value, doc.id.clone())
    }
}

pub(crate) fn validate_field(field: &str) -> DocStoreResult<()> {
    let mut chars = field.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DocStoreError::InvalidField(field.to_string()))
    }
}

fn field_value<'a>(data: &'a Value, field: &str) -> &'a Value {
    data.get(field).unwrap_or(&Value::Null)
}

pub(crate) fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// JSONB-compatible ordering of two JSON values.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.iter()
                .zip(y.iter())
                .map(|(l, r)| compare_values(l, r))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
