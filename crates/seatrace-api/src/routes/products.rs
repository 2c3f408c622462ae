//! # Products API
//!
//! Product registration, stage transitions, history queries, and status
//! changes.
//!
//! ## Endpoints
//!
//! - `POST /v1/products` — register product
//! - `GET /v1/products` — list products
//! - `GET /v1/products/:id` — get product
//! - `POST /v1/products/:id/stage` — stage transition
//! - `GET /v1/products/:id/history` — stage history
//! - `POST /v1/products/:id/recall` — recall product
//! - `POST /v1/products/:id/retire` — retire product
//!
//! A stage transition is validated and committed inside a single
//! `Store::try_update` closure, so two racing transition requests resolve
//! under one write lock: exactly one commits, the other observes the new
//! stage and is rejected. When a database pool is configured, the
//! in-memory commit is reverted if the durable write does not commit, so
//! a client is never told a transition failed while reads show it
//! succeeded.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use seatrace_core::{BatchCode, ProductId};
use seatrace_state::{
    can_actor_update_stage, validate_initial_stage, validate_transition, ActorRole,
    ProductStatus, StageHistoryEntry, StagePayloads, SupplyChainStage,
};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::{AppState, ProductRecord};

// ── Request DTOs ────────────────────────────────────────────────────

/// Request to register a new product.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    /// Operator-assigned product identifier (3-64 alphanumeric/`-`).
    pub product_id: String,
    /// Species, free text.
    pub species: String,
    /// Origin description (farm site or catch area).
    pub origin: String,
    /// Operator batch code linking the product to a harvest or catch lot.
    #[serde(default)]
    pub batch_code: Option<String>,
    /// "FARMED" or "WILD_CAPTURE".
    #[schema(value_type = String)]
    pub source_type: seatrace_state::SourceType,
    /// Initial stage. Defaults to the first stage of the source type's
    /// progression (HATCHERY for farmed, FISHING for wild capture).
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub initial_stage: Option<SupplyChainStage>,
    /// Payload for the initial stage. Required, must be non-empty.
    pub stage_data: Value,
    /// Free-text note for the registration history entry.
    #[serde(default)]
    pub notes: Option<String>,
    /// References to supporting documents.
    #[serde(default)]
    pub file_refs: Vec<String>,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), String> {
        if self.species.trim().is_empty() {
            return Err("species must not be empty".to_string());
        }
        if self.origin.trim().is_empty() {
            return Err("origin must not be empty".to_string());
        }
        Ok(())
    }
}

/// Request to move a product to its next stage.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StageTransitionRequest {
    /// The stage to move the product into.
    #[schema(value_type = String)]
    pub target_stage: SupplyChainStage,
    /// Payload for the target stage. Required: the transition is rejected
    /// with `MISSING_STAGE_DATA` when it is absent or empty.
    #[serde(default)]
    pub stage_data: Option<Value>,
    /// Free-text note for the history entry.
    #[serde(default)]
    pub notes: Option<String>,
    /// References to supporting documents.
    #[serde(default)]
    pub file_refs: Vec<String>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/products", get(list_products).post(create_product))
        .route("/v1/products/:id", get(get_product))
        .route("/v1/products/:id/stage", post(transition_stage))
        .route("/v1/products/:id/history", get(get_history))
        .route("/v1/products/:id/recall", post(recall_product))
        .route("/v1/products/:id/retire", post(retire_product))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/products — Register a new product.
#[utoipa::path(
    post,
    path = "/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product registered", body = ProductRecord),
        (status = 403, description = "Role not permitted for initial stage", body = crate::error::ErrorBody),
        (status = 409, description = "Product ID already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn create_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ProductRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let product_id = ProductId::new(req.product_id)?;
    let batch_code = req.batch_code.map(BatchCode::new).transpose()?;

    let initial_stage = match req.initial_stage {
        Some(stage) => {
            if !req.source_type.contains(stage) {
                return Err(AppError::Validation(format!(
                    "initial stage {stage} is not part of the {} progression",
                    req.source_type
                )));
            }
            stage
        }
        None => req.source_type.progression()[0],
    };

    let mut payloads = StagePayloads::default();
    payloads.set_for_stage(initial_stage, req.stage_data.clone());
    validate_initial_stage(caller.role, initial_stage, &payloads)?;

    let entry = StageHistoryEntry::new(
        product_id.clone(),
        initial_stage,
        None,
        caller.actor_or_system(),
        caller.role,
        req.notes,
        req.stage_data,
        req.file_refs,
    );

    let now = Utc::now();
    let record = ProductRecord {
        id: product_id.clone(),
        species: req.species,
        origin: req.origin,
        batch_code,
        source_type: req.source_type,
        current_stage: initial_stage,
        status: ProductStatus::Active,
        payloads,
        history: vec![entry],
        registered_by: caller.actor_or_system(),
        created_at: now,
        updated_at: now,
    };

    if let Some(pool) = &state.db_pool {
        crate::db::products::insert(pool, &record).await.map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::Conflict(format!("product {} is already registered", record.id))
            } else {
                AppError::Internal(format!("failed to persist product: {e}"))
            }
        })?;
    }

    // Vacancy check and insert run under one write lock; a racing
    // duplicate registration is rejected rather than overwriting the
    // first record.
    if state.products.try_insert(product_id, record.clone()).is_err() {
        return Err(AppError::Conflict(format!(
            "product {} is already registered",
            record.id
        )));
    }

    tracing::info!(
        product_id = %record.id,
        stage = %record.current_stage,
        source_type = %record.source_type,
        "product registered"
    );
    Ok((axum::http::StatusCode::CREATED, Json(record)))
}

/// GET /v1/products — List all products.
#[utoipa::path(
    get,
    path = "/v1/products",
    responses(
        (status = 200, description = "List of products", body = Vec<ProductRecord>),
    ),
    tag = "products"
)]
pub(crate) async fn list_products(State(state): State<AppState>) -> Json<Vec<ProductRecord>> {
    Json(state.products.list())
}

/// GET /v1/products/:id — Get a single product.
#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductRecord),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductRecord>, AppError> {
    let product_id = ProductId::new(id)?;
    state
        .products
        .get(&product_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {product_id} not found")))
}

/// POST /v1/products/:id/stage — Move a product to its next stage.
///
/// The authorization, progression, and data-presence checks run in that
/// order; the first failure determines the response.
#[utoipa::path(
    post,
    path = "/v1/products/{id}/stage",
    params(("id" = String, Path, description = "Product ID")),
    request_body = StageTransitionRequest,
    responses(
        (status = 200, description = "Stage transition committed", body = ProductRecord),
        (status = 403, description = "Role not permitted for target stage", body = crate::error::ErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 409, description = "Backward or cross-workflow transition, or terminal status", body = crate::error::ErrorBody),
        (status = 422, description = "Missing stage data", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn transition_stage(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Json<StageTransitionRequest>, JsonRejection>,
) -> Result<Json<ProductRecord>, AppError> {
    let req = extract_json(body)?;
    let product_id = ProductId::new(id)?;
    let target = req.target_stage;

    // Validate and commit under one write lock.
    let outcome = state.products.try_update(&product_id, |product| {
        if product.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "product {} is {} and can no longer transition",
                product.id, product.status
            )));
        }

        // A stored stage outside the product's progression means the record
        // was corrupted outside this API.
        if !product.source_type.contains(product.current_stage) {
            tracing::error!(
                product_id = %product.id,
                stage = %product.current_stage,
                source_type = %product.source_type,
                "stored stage is outside the product's progression"
            );
            return Err(AppError::Conflict(format!(
                "product {} is in stage {} which is not part of its {} progression",
                product.id, product.current_stage, product.source_type
            )));
        }

        let mut payloads = product.payloads.clone();
        if let Some(data) = &req.stage_data {
            payloads.set_for_stage(target, data.clone());
        }

        validate_transition(caller.role, product.current_stage, target, &payloads)?;

        let snapshot = product.clone();
        let previous = product.current_stage;
        let entry = StageHistoryEntry::new(
            product.id.clone(),
            target,
            Some(previous),
            caller.actor_or_system(),
            caller.role,
            req.notes.clone(),
            payloads
                .for_stage(target)
                .cloned()
                .unwrap_or(Value::Null),
            req.file_refs.clone(),
        );

        product.current_stage = target;
        product.payloads = payloads;
        product.history.push(entry.clone());
        product.updated_at = entry.timestamp;

        Ok((product.clone(), previous, entry, snapshot))
    });

    let (record, previous, entry, snapshot) = match outcome {
        Some(result) => result?,
        None => {
            return Err(AppError::NotFound(format!(
                "product {product_id} not found"
            )))
        }
    };

    if let Some(pool) = &state.db_pool {
        match crate::db::products::record_transition(pool, &record, previous, &entry).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(
                    product_id = %record.id,
                    from = %previous,
                    to = %record.current_stage,
                    "optimistic stage guard rejected the database write"
                );
                roll_back_transition(&state.products, &product_id, entry.id, snapshot);
                return Err(AppError::Conflict(format!(
                    "product {} was concurrently modified",
                    record.id
                )));
            }
            Err(e) => {
                roll_back_transition(&state.products, &product_id, entry.id, snapshot);
                return Err(AppError::Internal(format!(
                    "failed to persist stage transition: {e}"
                )));
            }
        }
    }

    tracing::info!(
        product_id = %record.id,
        from = %previous,
        to = %record.current_stage,
        role = %caller.role,
        "stage transition committed"
    );
    Ok(Json(record))
}

/// Restore a product's pre-transition state after the durable write did
/// not commit, so memory and database cannot diverge.
///
/// Restores only if the failed entry is still the newest history entry;
/// a later writer's committed transition is never clobbered.
fn roll_back_transition(
    products: &crate::state::Store<ProductRecord>,
    product_id: &ProductId,
    entry_id: uuid::Uuid,
    snapshot: ProductRecord,
) {
    let reverted = products.try_update(product_id, |product| -> Result<bool, AppError> {
        if product.history.last().is_some_and(|e| e.id == entry_id) {
            *product = snapshot;
            Ok(true)
        } else {
            Ok(false)
        }
    });
    if !matches!(reverted, Some(Ok(true))) {
        tracing::error!(
            product_id = %product_id,
            "could not roll back unpersisted stage transition"
        );
    }
}

/// GET /v1/products/:id/history — Get a product's stage history.
#[utoipa::path(
    get,
    path = "/v1/products/{id}/history",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Stage history, oldest first", body = Vec<Object>),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StageHistoryEntry>>, AppError> {
    let product_id = ProductId::new(id)?;
    state
        .products
        .get(&product_id)
        .map(|p| Json(p.history))
        .ok_or_else(|| AppError::NotFound(format!("product {product_id} not found")))
}

/// POST /v1/products/:id/recall — Pull a product from circulation.
#[utoipa::path(
    post,
    path = "/v1/products/{id}/recall",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product recalled", body = ProductRecord),
        (status = 403, description = "Role not permitted", body = crate::error::ErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 409, description = "Product already in a terminal status", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn recall_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<ProductRecord>, AppError> {
    set_status(state, caller, id, ProductStatus::Recalled).await
}

/// POST /v1/products/:id/retire — Mark a product's traceable life complete.
#[utoipa::path(
    post,
    path = "/v1/products/{id}/retire",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retired", body = ProductRecord),
        (status = 403, description = "Role not permitted", body = crate::error::ErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 409, description = "Product already in a terminal status", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn retire_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<ProductRecord>, AppError> {
    set_status(state, caller, id, ProductStatus::Retired).await
}

/// Common status-change path for recall and retire.
///
/// Permitted for admin or any role that may move the product's current
/// stage. Terminal statuses are irreversible.
async fn set_status(
    state: AppState,
    caller: CallerIdentity,
    id: String,
    new_status: ProductStatus,
) -> Result<Json<ProductRecord>, AppError> {
    let product_id = ProductId::new(id)?;

    let outcome = state.products.try_update(&product_id, |product| {
        if caller.role != ActorRole::Admin
            && !can_actor_update_stage(caller.role, product.current_stage)
        {
            return Err(AppError::Forbidden(format!(
                "role '{}' may not change the status of a product in stage {}",
                caller.role, product.current_stage
            )));
        }
        if product.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "product {} is already {}",
                product.id, product.status
            )));
        }
        product.status = new_status;
        product.updated_at = Utc::now();
        Ok(product.clone())
    });

    let record = match outcome {
        Some(result) => result?,
        None => {
            return Err(AppError::NotFound(format!(
                "product {product_id} not found"
            )))
        }
    };

    if let Some(pool) = &state.db_pool {
        let updated = crate::db::products::update_status(pool, &record)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist status change: {e}")))?;
        if !updated {
            tracing::error!(
                product_id = %record.id,
                status = %record.status,
                "status change matched no product row in the database"
            );
        }
    }

    tracing::info!(
        product_id = %record.id,
        status = %record.status,
        role = %caller.role,
        "product status changed"
    );
    Ok(Json(record))
}
