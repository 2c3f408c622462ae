//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Products live in a thread-safe in-memory store keyed by [`ProductId`].
//! When a PostgreSQL pool is configured the store is hydrated from the
//! database on startup and every accepted mutation is written through;
//! without a pool the API runs in in-memory-only mode.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use seatrace_core::{ActorId, BatchCode, ProductId};
use seatrace_state::{
    ProductStatus, SourceType, StageHistoryEntry, StagePayloads, SupplyChainStage,
};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
/// `parking_lot::RwLock` is non-poisonable — a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<ProductId, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: ProductId, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert a record only if the key is vacant.
    ///
    /// The vacancy check and the insert run under one write lock, so two
    /// racing inserts for the same key cannot both succeed. Returns the
    /// rejected value when the key is already occupied; the stored record
    /// is never overwritten.
    pub fn try_insert(&self, id: ProductId, value: T) -> Result<(), T> {
        match self.data.write().entry(id) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
            std::collections::hash_map::Entry::Occupied(_) => Err(value),
        }
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &ProductId) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives a `&mut T` and may inspect the current state,
    /// validate preconditions, mutate the record, and return `Ok(R)` or
    /// `Err(E)`. The entire operation runs under a single write lock,
    /// eliminating TOCTOU races between read and update.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &ProductId,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Product Record -----------------------------------------------------------

/// A traceable product and its full audit trail.
///
/// `payloads` holds the latest supplied payload per stage; `history` is the
/// append-only record of every stage change, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductRecord {
    #[schema(value_type = String)]
    pub id: ProductId,
    /// Species, free text (e.g. "Atlantic salmon").
    pub species: String,
    /// Origin description (farm site or catch area).
    pub origin: String,
    /// Operator batch code linking this product to a harvest or catch lot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub batch_code: Option<BatchCode>,
    #[schema(value_type = String)]
    pub source_type: SourceType,
    #[schema(value_type = String)]
    pub current_stage: SupplyChainStage,
    #[schema(value_type = String)]
    pub status: ProductStatus,
    #[schema(value_type = Object)]
    pub payloads: StagePayloads,
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<StageHistoryEntry>,
    #[schema(value_type = String)]
    pub registered_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Application State --------------------------------------------------------

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in the `Store`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub products: Store<ProductRecord>,

    /// PostgreSQL connection pool for durable persistence.
    /// When `Some`, product and history data is persisted in addition to
    /// the in-memory store. When `None`, the API is in-memory only.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create a new application state with the given configuration and
    /// optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            products: Store::new(),
            db_pool,
            config,
        }
    }

    /// Hydrate the in-memory store from the database.
    ///
    /// Called once on startup when a database pool is available. Loads all
    /// persisted products (with their histories) so that read operations
    /// remain fast and synchronous.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let products = crate::db::products::load_all(pool)
            .await
            .map_err(|e| format!("failed to load products: {e}"))?;
        let count = products.len();
        for record in products {
            self.products.insert(record.id.clone(), record);
        }

        tracing::info!(products = count, "hydrated stores from database");
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
