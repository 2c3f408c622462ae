//! Product persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `products` and
//! `stage_history` tables. Progression constraints are enforced at the
//! application layer (via `seatrace_state::validate_transition`), not in
//! SQL; the only database-level guard is the optimistic stage check in
//! [`record_transition`], which makes exactly one of two racing
//! transitions commit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use seatrace_core::{ActorId, BatchCode, ProductId};
use seatrace_state::{
    ActorRole, ProductStatus, SourceType, StageHistoryEntry, StagePayloads, SupplyChainStage,
};

use crate::state::ProductRecord;

/// Serialize an enum to its canonical string form for a text column.
///
/// Fails the write rather than defaulting, so a serialization bug can
/// never persist a wrong state that reverts the product on restart.
fn enum_to_db_string<T: serde::Serialize + std::fmt::Debug>(
    value: &T,
) -> Result<String, sqlx::Error> {
    let json = serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, value = ?value, "failed to serialize enum for persistence");
        sqlx::Error::Encode(Box::new(e))
    })?;
    json.as_str().map(String::from).ok_or_else(|| {
        tracing::error!(value = ?value, "enum did not serialize to a JSON string");
        sqlx::Error::Encode(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "enum did not serialize to a string",
        )))
    })
}

fn payloads_to_json(payloads: &StagePayloads) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(payloads).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize stage payloads");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert the history row for `entry` inside an open transaction.
async fn insert_history_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &StageHistoryEntry,
) -> Result<(), sqlx::Error> {
    let stage = enum_to_db_string(&entry.stage)?;
    let previous_stage = entry
        .previous_stage
        .as_ref()
        .map(enum_to_db_string)
        .transpose()?;
    let role = enum_to_db_string(&entry.updated_by_role)?;
    let file_refs = serde_json::to_value(&entry.file_refs).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize file_refs");
        sqlx::Error::Encode(Box::new(e))
    })?;

    sqlx::query(
        "INSERT INTO stage_history \
         (id, product_id, stage, previous_stage, updated_by, updated_by_role, \
          occurred_at, notes, stage_data, file_refs)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(entry.id)
    .bind(entry.product_id.as_str())
    .bind(&stage)
    .bind(&previous_stage)
    .bind(entry.updated_by.as_uuid())
    .bind(&role)
    .bind(entry.timestamp)
    .bind(&entry.notes)
    .bind(&entry.stage_data)
    .bind(&file_refs)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Insert a new product and its registration history entry in one
/// transaction.
pub async fn insert(pool: &PgPool, record: &ProductRecord) -> Result<(), sqlx::Error> {
    let source_type = enum_to_db_string(&record.source_type)?;
    let current_stage = enum_to_db_string(&record.current_stage)?;
    let status = enum_to_db_string(&record.status)?;
    let payloads = payloads_to_json(&record.payloads)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO products \
         (id, species, origin, batch_code, source_type, current_stage, status, payloads, \
          registered_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(record.id.as_str())
    .bind(&record.species)
    .bind(&record.origin)
    .bind(record.batch_code.as_ref().map(|b| b.as_str()))
    .bind(&source_type)
    .bind(&current_stage)
    .bind(&status)
    .bind(&payloads)
    .bind(record.registered_by.as_uuid())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *tx)
    .await?;

    for entry in &record.history {
        insert_history_entry(&mut tx, entry).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Persist a committed stage transition: update the product row and append
/// the history entry in one transaction.
///
/// The UPDATE carries an optimistic `current_stage = $expected` guard.
/// Returns `Ok(false)` without writing anything when the guard rejects
/// the update, meaning another writer got there first.
pub async fn record_transition(
    pool: &PgPool,
    record: &ProductRecord,
    expected_previous: SupplyChainStage,
    entry: &StageHistoryEntry,
) -> Result<bool, sqlx::Error> {
    let new_stage = enum_to_db_string(&record.current_stage)?;
    let expected = enum_to_db_string(&expected_previous)?;
    let payloads = payloads_to_json(&record.payloads)?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE products SET current_stage = $1, payloads = $2, updated_at = $3
         WHERE id = $4 AND current_stage = $5",
    )
    .bind(&new_stage)
    .bind(&payloads)
    .bind(record.updated_at)
    .bind(record.id.as_str())
    .bind(&expected)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    insert_history_entry(&mut tx, entry).await?;

    tx.commit().await?;
    Ok(true)
}

/// Persist a product status change (recall/retire).
pub async fn update_status(pool: &PgPool, record: &ProductRecord) -> Result<bool, sqlx::Error> {
    let status = enum_to_db_string(&record.status)?;

    let result = sqlx::query("UPDATE products SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(&status)
        .bind(record.updated_at)
        .bind(record.id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all products and their histories into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ProductRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, species, origin, batch_code, source_type, current_stage, status, payloads, \
                registered_by, created_at, updated_at
         FROM products ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let history_rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, product_id, stage, previous_stage, updated_by, updated_by_role, \
                occurred_at, notes, stage_data, file_refs
         FROM stage_history ORDER BY occurred_at",
    )
    .fetch_all(pool)
    .await?;

    let mut histories: HashMap<String, Vec<StageHistoryEntry>> = HashMap::new();
    for row in history_rows {
        let product_id = row.product_id.clone();
        if let Some(entry) = row.into_entry() {
            histories.entry(product_id).or_default().push(entry);
        }
    }

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let history = histories.remove(&row.id).unwrap_or_default();
            row.into_record(history)
        })
        .collect())
}

// ── Row types ───────────────────────────────────────────────────────

/// Parse an enum stored as a text column, READ path.
///
/// Unknown values are logged at ERROR and surface as `None` so one
/// corrupt row cannot take down startup hydration. The write path never
/// produces such rows; their presence means outside interference.
fn enum_from_db_string<T: serde::de::DeserializeOwned>(
    column: &str,
    id: &str,
    value: &str,
) -> Option<T> {
    match serde_json::from_value(serde_json::Value::String(value.to_string())) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::error!(
                id = %id,
                column = %column,
                value = %value,
                error = %e,
                "unknown enum value in database — skipping row; \
                 investigate: this may indicate data corruption"
            );
            None
        }
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    species: String,
    origin: String,
    batch_code: Option<String>,
    source_type: String,
    current_stage: String,
    status: String,
    payloads: serde_json::Value,
    registered_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_record(self, history: Vec<StageHistoryEntry>) -> Option<ProductRecord> {
        let id = match ProductId::new(&self.id) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "invalid product id in database — skipping row");
                return None;
            }
        };
        let source_type: SourceType =
            enum_from_db_string("source_type", &self.id, &self.source_type)?;
        let current_stage: SupplyChainStage =
            enum_from_db_string("current_stage", &self.id, &self.current_stage)?;
        let status: ProductStatus = enum_from_db_string("status", &self.id, &self.status)?;

        let payloads: StagePayloads =
            serde_json::from_value(self.payloads).unwrap_or_else(|e| {
                tracing::error!(
                    id = %self.id,
                    error = %e,
                    "failed to deserialize stage payloads — defaulting to empty"
                );
                StagePayloads::default()
            });

        let batch_code = self.batch_code.as_deref().and_then(|code| {
            match BatchCode::new(code) {
                Ok(code) => Some(code),
                Err(e) => {
                    tracing::error!(id = %self.id, error = %e, "invalid batch code in database — dropping field");
                    None
                }
            }
        });

        Some(ProductRecord {
            id,
            species: self.species,
            origin: self.origin,
            batch_code,
            source_type,
            current_stage,
            status,
            payloads,
            history,
            registered_by: ActorId::from_uuid(self.registered_by),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    product_id: String,
    stage: String,
    previous_stage: Option<String>,
    updated_by: Uuid,
    updated_by_role: String,
    occurred_at: DateTime<Utc>,
    notes: Option<String>,
    stage_data: serde_json::Value,
    file_refs: serde_json::Value,
}

impl HistoryRow {
    fn into_entry(self) -> Option<StageHistoryEntry> {
        let product_id = ProductId::new(&self.product_id).ok()?;
        let stage: SupplyChainStage =
            enum_from_db_string("stage", &self.product_id, &self.stage)?;
        let previous_stage = match &self.previous_stage {
            Some(s) => Some(enum_from_db_string("previous_stage", &self.product_id, s)?),
            None => None,
        };
        let updated_by_role: ActorRole =
            enum_from_db_string("updated_by_role", &self.product_id, &self.updated_by_role)?;
        let file_refs: Vec<String> =
            serde_json::from_value(self.file_refs).unwrap_or_else(|e| {
                tracing::error!(
                    id = %self.id,
                    error = %e,
                    "failed to deserialize file_refs — defaulting to empty"
                );
                Vec::new()
            });

        Some(StageHistoryEntry {
            id: self.id,
            product_id,
            stage,
            previous_stage,
            updated_by: ActorId::from_uuid(self.updated_by),
            updated_by_role,
            timestamp: self.occurred_at,
            notes: self.notes,
            stage_data: self.stage_data,
            file_refs,
        })
    }
}
