//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SeaTrace API",
        version = "0.3.2",
        description = "Seafood traceability API: product registration, supply-chain stage transitions with role-based validation, and immutable stage history.",
        license(name = "Apache-2.0")
    ),
    paths(
        crate::routes::products::create_product,
        crate::routes::products::list_products,
        crate::routes::products::get_product,
        crate::routes::products::transition_stage,
        crate::routes::products::get_history,
        crate::routes::products::recall_product,
        crate::routes::products::retire_product,
    ),
    components(schemas(
        crate::state::ProductRecord,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::products::CreateProductRequest,
        crate::routes::products::StageTransitionRequest,
    )),
    tags(
        (name = "products", description = "Product registration, stage transitions, and history"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
