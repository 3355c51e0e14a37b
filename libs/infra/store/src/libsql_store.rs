// [libs/infra/store/src/libsql_store.rs]
/*!
 * =================================================================
 * APARATO: LIBSQL STORE ADAPTER (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: IMPLEMENTACIÓN CONCRETA DE `StoreAdapter` SOBRE libSQL
 * =================================================================
 */

use crate::adapter::{CollectionStats, DocumentStream, ScannedDocument, StoreAdapter};
use crate::client::StoreClient;
use crate::errors::StoreError;
use async_stream::try_stream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetscan_domain_models::WorkTable;
use libsql::{params, Row, Value as SqlValue};
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub struct LibsqlStore {
    client: StoreClient,
}

impl LibsqlStore {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

fn sql_value_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(n) => Value::from(n),
        SqlValue::Real(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

fn units_to_sql(units: &Option<Vec<fleetscan_domain_models::Unit>>) -> Result<SqlValue, StoreError> {
    match units {
        None => Ok(SqlValue::Null),
        Some(units) => {
            let encoded = serde_json::to_string(units)
                .map_err(|e| StoreError::MappingError(format!("unit list encoding failed: {}", e)))?;
            Ok(SqlValue::Text(encoded))
        }
    }
}

fn row_to_work_table(collection: &str, field: &str, row: &Row) -> Result<WorkTable, StoreError> {
    let lock: i64 = row.get(0)?;
    let ts_raw: String = row.get(1)?;
    let units_raw: Option<String> = row.get(2)?;

    let ts = DateTime::parse_from_rfc3339(&ts_raw)
        .map_err(|e| StoreError::MappingError(format!("malformed ts '{}': {}", ts_raw, e)))?
        .with_timezone(&Utc);

    let units = units_raw
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| StoreError::MappingError(format!("malformed units payload: {}", e)))?;

    Ok(WorkTable {
        collection: collection.to_string(),
        field: field.to_string(),
        lock: lock != 0,
        ts,
        units,
    })
}

/// `UNIQUE`/`PRIMARY KEY` violations surface from libSQL as a generic
/// execution error; we recognize them by message since the crate does not
/// expose a typed constraint-violation variant.
fn is_duplicate_key_error(error: &libsql::Error) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("unique") || message.contains("constraint")
}

#[async_trait]
impl StoreAdapter for LibsqlStore {
    #[instrument(skip(self, table))]
    async fn insert_work_table(&self, table: &WorkTable) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        let units_value = units_to_sql(&table.units)?;

        let outcome = connection
            .execute(
                "INSERT INTO work_tables (collection, field, lock, ts, units) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    table.collection.clone(),
                    table.field.clone(),
                    table.lock as i64,
                    table.ts.to_rfc3339(),
                    units_value,
                ],
            )
            .await;

        match outcome {
            Ok(_) => {
                debug!("🆕 [WORK_TABLE]: bootstrapped ({}, {})", table.collection, table.field);
                Ok(())
            }
            Err(e) if is_duplicate_key_error(&e) => Err(StoreError::DuplicateKey),
            Err(e) => Err(StoreError::QueryError(e)),
        }
    }

    #[instrument(skip(self))]
    async fn peek_work_table(&self, collection: &str, field: &str) -> Result<Option<WorkTable>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT lock, ts, units FROM work_tables WHERE collection = ?1 AND field = ?2",
                params![collection, field],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_work_table(collection, field, &row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn try_acquire_lease(&self, collection: &str, field: &str) -> Result<Option<WorkTable>, StoreError> {
        let connection = self.client.get_connection()?;
        let now = Utc::now().to_rfc3339();

        let rows_affected = connection
            .execute(
                "UPDATE work_tables SET lock = 1, ts = ?3 WHERE collection = ?1 AND field = ?2 AND lock = 0",
                params![collection, field, now],
            )
            .await?;

        if rows_affected == 0 {
            return Ok(None);
        }

        self.peek_work_table(collection, field).await
    }

    #[instrument(skip(self))]
    async fn force_clear_stuck_lease(
        &self,
        collection: &str,
        field: &str,
        observed_ts: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let connection = self.client.get_connection()?;
        let now = Utc::now().to_rfc3339();

        let rows_affected = connection
            .execute(
                "UPDATE work_tables SET lock = 0, ts = ?4
                 WHERE collection = ?1 AND field = ?2 AND lock = 1 AND ts = ?3",
                params![collection, field, observed_ts.to_rfc3339(), now],
            )
            .await?;

        if rows_affected > 0 {
            warn!(
                "🔓 [STUCK_LEASE_RECOVERED]: ({}, {}) reclaimed from observed ts {}",
                collection, field, observed_ts
            );
        }

        Ok(rows_affected > 0)
    }

    #[instrument(skip(self, table))]
    async fn replace_work_table(&self, table: &WorkTable) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        let units_value = units_to_sql(&table.units)?;

        connection
            .execute(
                "INSERT INTO work_tables (collection, field, lock, ts, units) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(collection, field) DO UPDATE SET
                   lock = excluded.lock, ts = excluded.ts, units = excluded.units",
                params![
                    table.collection.clone(),
                    table.field.clone(),
                    table.lock as i64,
                    table.ts.to_rfc3339(),
                    units_value,
                ],
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self, payload))]
    async fn insert_document(&self, collection: &str, id: &str, payload: Value) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        let encoded = serde_json::to_string(&payload)
            .map_err(|e| StoreError::MappingError(format!("document payload encoding failed: {}", e)))?;

        connection
            .execute(
                "INSERT INTO documents (collection, id, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT(collection, id) DO UPDATE SET payload = excluded.payload",
                params![collection, id, encoded],
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*), COALESCE(AVG(LENGTH(payload)), 0.0) FROM documents WHERE collection = ?1",
                params![collection],
            )
            .await?;

        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        let count: i64 = row.get(0)?;
        let avg_doc_size_bytes: f64 = row.get(1)?;

        Ok(CollectionStats {
            count: count.max(0) as u64,
            avg_doc_size_bytes,
        })
    }

    #[instrument(skip(self))]
    async fn split_vector(
        &self,
        collection: &str,
        field: &str,
        chunk_size_docs: u64,
    ) -> Result<Vec<Value>, StoreError> {
        if chunk_size_docs == 0 {
            return Ok(Vec::new());
        }

        let connection = self.client.get_connection()?;
        let key_path = format!("$.{}", field);
        let sql = "
            WITH ordered AS (
                SELECT json_extract(payload, ?2) AS key_value,
                       ROW_NUMBER() OVER (ORDER BY json_extract(payload, ?2) ASC) AS row_num
                FROM documents
                WHERE collection = ?1 AND json_extract(payload, ?2) IS NOT NULL
            )
            SELECT key_value FROM ordered WHERE row_num % ?3 = 0 ORDER BY row_num ASC
        ";

        let mut rows = connection
            .query(sql, params![collection, key_path, chunk_size_docs as i64])
            .await?;

        let mut keys = Vec::new();
        while let Some(row) = rows.next().await? {
            keys.push(sql_value_to_json(row.get_value(0)?));
        }
        Ok(keys)
    }

    #[instrument(skip(self))]
    async fn sample_sorted_keys(&self, collection: &str, field: &str) -> Result<Vec<Value>, StoreError> {
        let connection = self.client.get_connection()?;
        let key_path = format!("$.{}", field);
        let sql = "
            SELECT json_extract(payload, ?2) AS key_value
            FROM documents
            WHERE collection = ?1 AND json_extract(payload, ?2) IS NOT NULL
            ORDER BY key_value ASC
        ";

        let mut rows = connection.query(sql, params![collection, key_path]).await?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next().await? {
            keys.push(sql_value_to_json(row.get_value(0)?));
        }
        Ok(keys)
    }

    fn scan_sorted(
        &self,
        collection: &str,
        field: &str,
        lower: Option<Value>,
        upper: Option<Value>,
    ) -> DocumentStream {
        let client = self.client.clone();
        let collection = collection.to_string();
        let field = field.to_string();

        Box::pin(try_stream! {
            let connection = client.get_connection()?;
            let key_path = format!("$.{}", field);

            let mut sql = format!(
                "SELECT id, payload, json_extract(payload, '{path}') AS key_value FROM documents WHERE collection = ?1",
                path = key_path.replace('\'', "''")
            );
            let mut bound_params: Vec<SqlValue> = vec![SqlValue::Text(collection.clone())];

            if let Some(lower) = &lower {
                sql.push_str(" AND key_value >= ?2");
                bound_params.push(json_to_sql_value(lower));
            }
            if let Some(upper) = &upper {
                let placeholder = if lower.is_some() { "?3" } else { "?2" };
                sql.push_str(&format!(" AND key_value < {}", placeholder));
                bound_params.push(json_to_sql_value(upper));
            }
            sql.push_str(" ORDER BY key_value ASC");

            let mut rows = connection.query(&sql, bound_params).await?;
            while let Some(row) = rows.next().await? {
                let key = sql_value_to_json(row.get_value(2)?);
                let payload_raw: String = row.get(1)?;
                let payload: Value = serde_json::from_str(&payload_raw)
                    .map_err(|e| StoreError::MappingError(format!("malformed document payload: {}", e)))?;
                yield ScannedDocument { key, payload };
            }
        })
    }
}

fn json_to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
