use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, PgPool, Postgres, Row};
use tracing::debug;

use crate::database::collection::Collection;
use crate::database::manager::DatabaseManager;
use crate::database::store::{ensure_object_id, Store, StoreError};
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData, FilterWhere};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_NOT_NULL_VIOLATION: &str = "23502";
const PG_CHECK_VIOLATION: &str = "23514";
const PG_STRING_TOO_LONG: &str = "22001";
const PG_INVALID_TEXT: &str = "22P02";

/// Postgres-backed store. Every statement returns rows through
/// `row_to_json`, so documents look the same as the in-memory backend's.
pub struct PgStore {
    pool: PgPool,
    log_queries: bool,
}

impl PgStore {
    pub fn new(pool: PgPool, log_queries: bool) -> Self {
        Self { pool, log_queries }
    }

    fn filter_for(collection: &Collection, data: FilterData) -> Result<Filter, StoreError> {
        let mut filter = Filter::new(collection.name)?;
        for field in collection.timestamp_fields {
            filter.cast(field, "timestamptz")?;
        }
        filter.assign(data)?;
        Ok(filter)
    }

    fn trace(&self, sql: &SqlResult) {
        if self.log_queries {
            debug!(query = %sql.query, params = sql.params.len(), "executing query");
        }
    }

    async fn fetch_rows(&self, sql: SqlResult) -> Result<Vec<Value>, StoreError> {
        self.trace(&sql);
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_value(query, param);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        rows.iter().map(|row| Ok(row.try_get::<Value, _>("row")?)).collect()
    }

    async fn fetch_row(&self, sql: SqlResult) -> Result<Option<Value>, StoreError> {
        Ok(self.fetch_rows(sql).await?.into_iter().next())
    }

    /// Column list + VALUES placeholders for a document. Nulls are written
    /// literally so they need no type hint.
    fn render_values(doc: &Map<String, Value>) -> Result<(Vec<String>, Vec<String>, Vec<Value>), StoreError> {
        let mut columns = vec![];
        let mut placeholders = vec![];
        let mut params = vec![];
        for (key, value) in doc {
            // createdAt is always stamped by the database
            if key == "createdAt" {
                continue;
            }
            FilterWhere::validate_column(key)?;
            columns.push(format!("\"{}\"", key));
            if value.is_null() {
                placeholders.push("NULL".to_string());
            } else {
                params.push(value.clone());
                placeholders.push(format!("${}", params.len()));
            }
        }
        Ok((columns, placeholders, params))
    }

    fn insert_sql(collection: &Collection, doc: &Map<String, Value>) -> Result<SqlResult, StoreError> {
        let (columns, placeholders, params) = Self::render_values(doc)?;
        Ok(SqlResult {
            query: format!(
                "WITH ins AS (INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *) SELECT row_to_json(ins) AS row FROM ins",
                collection.name,
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        })
    }

    fn update_sql(collection: &Collection, id: &str, patch: &Map<String, Value>) -> Result<SqlResult, StoreError> {
        let mut patch = patch.clone();
        patch.remove("id");
        let (columns, placeholders, mut params) = Self::render_values(&patch)?;

        params.push(Value::String(id.to_string()));
        let id_param = params.len();

        // Empty patch still has to return the current row
        let assignments = if columns.is_empty() {
            "\"id\" = \"id\"".to_string()
        } else {
            columns
                .iter()
                .zip(placeholders.iter())
                .map(|(column, placeholder)| format!("{} = {}", column, placeholder))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Ok(SqlResult {
            query: format!(
                "WITH upd AS (UPDATE \"{}\" SET {} WHERE \"id\" = ${} RETURNING *) SELECT row_to_json(upd) AS row FROM upd",
                collection.name, assignments, id_param
            ),
            params,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert(&self, collection: &Collection, doc: Map<String, Value>) -> Result<Value, StoreError> {
        let id = doc.get("id").and_then(Value::as_str).unwrap_or_default();
        ensure_object_id(id)?;
        let sql = Self::insert_sql(collection, &doc)?;
        self.fetch_row(sql)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("insert into {} returned no row", collection.name)))
    }

    async fn find(&self, collection: &Collection, filter: FilterData) -> Result<Vec<Value>, StoreError> {
        let sql = Self::filter_for(collection, filter)?.to_sql()?;
        self.fetch_rows(sql).await
    }

    async fn find_by_id(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError> {
        ensure_object_id(id)?;
        let sql = Self::filter_for(collection, FilterData::by_field("id", id))?.to_sql()?;
        self.fetch_row(sql).await
    }

    async fn count(&self, collection: &Collection, filter: FilterData) -> Result<u64, StoreError> {
        let sql = Self::filter_for(collection, filter)?.to_count_sql()?;
        self.trace(&sql);
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_value(query, param);
        }
        let row = query.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn update(&self, collection: &Collection, id: &str, patch: Map<String, Value>) -> Result<Option<Value>, StoreError> {
        ensure_object_id(id)?;
        let sql = Self::update_sql(collection, id, &patch)?;
        self.fetch_row(sql).await
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError> {
        ensure_object_id(id)?;
        let sql = SqlResult {
            query: format!(
                "WITH del AS (DELETE FROM \"{}\" WHERE \"id\" = $1 RETURNING *) SELECT row_to_json(del) AS row FROM del",
                collection.name
            ),
            params: vec![Value::String(id.to_string())],
        };
        self.fetch_row(sql).await
    }

    async fn delete_all(&self, collection: &Collection) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM \"{}\"", collection.name))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn average(&self, collection: &Collection, field: &str, filter: FilterData) -> Result<Option<f64>, StoreError> {
        let sql = Self::filter_for(collection, filter)?.to_average_sql(field)?;
        self.trace(&sql);
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_value(query, param);
        }
        let row = query.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(row.try_get::<Option<f64>, _>("average")?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

fn bind_value<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // Only TEXT[] columns hold lists
        Value::Array(items) => {
            let texts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            query.bind(texts)
        }
        Value::Object(_) => query.bind(sqlx::types::Json(value.clone())),
    }
}

/// Translate Postgres constraint failures into the store's own vocabulary
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        match db.code().as_deref() {
            Some(PG_UNIQUE_VIOLATION) => {
                return StoreError::Duplicate(db.constraint().unwrap_or("unique").to_string());
            }
            Some(PG_NOT_NULL_VIOLATION) | Some(PG_CHECK_VIOLATION) | Some(PG_STRING_TOO_LONG) | Some(PG_INVALID_TEXT) => {
                return StoreError::Validation(vec![db.message().to_string()]);
            }
            _ => {}
        }
    }
    StoreError::Sqlx(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::collection::{BOOTCAMPS, COURSES};
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_skips_created_at_and_inlines_nulls() {
        let doc = map(json!({ "id": "x", "name": "Devworks", "website": null, "createdAt": "2020-01-01" }));
        let sql = PgStore::insert_sql(&BOOTCAMPS, &doc).unwrap();
        assert_eq!(
            sql.query,
            "WITH ins AS (INSERT INTO \"bootcamps\" (\"id\", \"name\", \"website\") VALUES ($1, $2, NULL) RETURNING *) SELECT row_to_json(ins) AS row FROM ins"
        );
        assert_eq!(sql.params, vec![json!("x"), json!("Devworks")]);
    }

    #[test]
    fn update_binds_id_last() {
        let sql = PgStore::update_sql(&COURSES, "abc", &map(json!({ "tuition": 1200, "id": "ignored" }))).unwrap();
        assert_eq!(
            sql.query,
            "WITH upd AS (UPDATE \"courses\" SET \"tuition\" = $1 WHERE \"id\" = $2 RETURNING *) SELECT row_to_json(upd) AS row FROM upd"
        );
        assert_eq!(sql.params, vec![json!(1200), json!("abc")]);
    }

    #[test]
    fn timestamp_filters_bind_as_timestamptz() {
        let filter = FilterData {
            where_clause: Some(json!({ "createdAt": { "$gte": "2024-01-01T00:00:00.000000Z" } })),
            ..Default::default()
        };
        let sql = PgStore::filter_for(&COURSES, filter).unwrap().to_count_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) AS count FROM \"courses\" WHERE \"createdAt\" >= $1::timestamptz"
        );
    }

    #[test]
    fn rejects_unsafe_column_names() {
        let doc = map(json!({ "id": "x", "name\" = 1; --": "oops" }));
        assert!(matches!(PgStore::insert_sql(&BOOTCAMPS, &doc), Err(StoreError::Query(_))));
    }
}
