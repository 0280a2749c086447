//! PostgreSQL back end: every collection lives in one `documents` table with a
//! JSONB body. Field names are validated identifiers before they are spliced
//! into SQL; all values are bound parameters.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::Postgres;
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder};
use tracing::{debug, info};

use crate::error::{DocStoreError, DocStoreResult};
use crate::query::{type_rank, validate_field, Direction, Filter, FilterOp, Query};
use crate::{into_object, Document, DocumentStore};

/// [`DocumentStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    pub async fn run_migrations(&self) -> DocStoreResult<()> {
        info!("Running document store migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Document store migrations completed");
        Ok(())
    }
}

/// `data -> 'field'`, or `'null'` when the key is absent.
fn push_field(qb: &mut QueryBuilder<'_, Postgres>, field: &str) {
    qb.push("COALESCE(data -> '");
    qb.push(field);
    qb.push("', 'null'::jsonb)");
}

/// Sort key for an order field: type rank, string text in byte order, then
/// the JSONB value itself. Matches `compare_values` whatever the database
/// collation is.
fn sort_key(field: &str) -> [String; 3] {
    let value = format!("COALESCE(data -> '{}', 'null'::jsonb)", field);
    [
        format!(
            "(CASE jsonb_typeof({v}) WHEN 'null' THEN 0 WHEN 'string' THEN 1 \
             WHEN 'number' THEN 2 WHEN 'boolean' THEN 3 WHEN 'array' THEN 4 ELSE 5 END)",
            v = value
        ),
        format!(
            "(CASE WHEN jsonb_typeof({v}) = 'string' THEN {v} #>> '{{}}' ELSE '' END) COLLATE \"C\"",
            v = value
        ),
        value,
    ]
}

fn string_key(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, field: &str, keyword: &str) {
    qb.push(" ORDER BY ");
    for key in sort_key(field) {
        qb.push(key);
        qb.push(keyword);
        qb.push(", ");
    }
    qb.push("id COLLATE \"C\"");
    qb.push(keyword);
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    let comparison = match filter.op {
        FilterOp::Eq => " = ",
        FilterOp::Gt => " > ",
        FilterOp::Gte => " >= ",
        FilterOp::Lt => " < ",
        FilterOp::Lte => " <= ",
        FilterOp::In => {
            qb.push_bind(Json(filter.value.clone()));
            qb.push(" @> jsonb_build_array(");
            push_field(qb, &filter.field);
            qb.push(")");
            return;
        }
        FilterOp::TextContains => {
            let needle = filter.value.as_str().unwrap_or_default();
            qb.push("(jsonb_typeof(data -> '");
            qb.push(&filter.field);
            qb.push("') = 'string' AND data ->> '");
            qb.push(&filter.field);
            qb.push("' ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(needle)));
            qb.push(")");
            return;
        }
    };

    if filter.op == FilterOp::Eq && !filter.value.is_null() {
        // plain expression so the (collection, data -> 'field') indexes apply
        qb.push("data -> '");
        qb.push(&filter.field);
        qb.push("'");
    } else {
        push_field(qb, &filter.field);
    }
    qb.push(comparison);
    qb.push_bind(Json(filter.value.clone()));
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filters: &[Filter]) {
    qb.push(" WHERE collection = ");
    qb.push_bind(collection.to_string());
    for filter in filters {
        qb.push(" AND ");
        push_filter(qb, filter);
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> DocStoreResult<Option<Value>> {
        let data: Option<Json<Value>> = sqlx::query_scalar(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(data.map(|Json(value)| value))
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> DocStoreResult<()> {
        let map = into_object(collection, id, data)?;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(map)))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocStoreError::already_exists(collection, id));
        }
        Ok(())
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> DocStoreResult<()> {
        let map = into_object(collection, id, data)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(map)))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> DocStoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(patch)))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> DocStoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, query: &Query) -> DocStoreResult<Vec<Document>> {
        query.validate()?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT id, data FROM documents");
        push_where(&mut qb, &query.collection, &query.filters);

        match (&query.order_by, &query.start_after) {
            (Some(order), Some(cursor)) => {
                let (cmp, _) = direction_sql(order.direction);
                let [rank, text, value] = sort_key(&order.field);
                qb.push(" AND (");
                qb.push(rank);
                qb.push(", ");
                qb.push(text);
                qb.push(", ");
                qb.push(value);
                qb.push(", id COLLATE \"C\")");
                qb.push(cmp);
                qb.push("(");
                qb.push_bind(type_rank(&cursor.value) as i32);
                qb.push(", ");
                qb.push_bind(string_key(&cursor.value));
                qb.push(", ");
                qb.push_bind(Json(cursor.value.clone()));
                qb.push(", ");
                qb.push_bind(cursor.id.clone());
                qb.push(")");
            }
            (None, Some(cursor)) => {
                qb.push(" AND id COLLATE \"C\" > ");
                qb.push_bind(cursor.id.clone());
            }
            _ => {}
        }

        match &query.order_by {
            Some(order) => {
                let (_, keyword) = direction_sql(order.direction);
                push_order_by(&mut qb, &order.field, keyword);
            }
            None => {
                qb.push(" ORDER BY id COLLATE \"C\" ASC");
            }
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        debug!(collection = %query.collection, sql = %qb.sql(), "Running document query");

        let rows: Vec<(String, Json<Value>)> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(data))| Document { id, data })
            .collect())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> DocStoreResult<u64> {
        for filter in filters {
            validate_field(&filter.field)?;
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        push_where(&mut qb, collection, filters);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}

/// Keyset comparison operator and ORDER BY keyword for a direction.
fn direction_sql(direction: Direction) -> (&'static str, &'static str) {
    match direction {
        Direction::Asc => (" > ", " ASC"),
        Direction::Desc => (" < ", " DESC"),
    }
}
