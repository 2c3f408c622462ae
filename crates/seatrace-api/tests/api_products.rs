//! End-to-end tests for the products API surface, driven through the full
//! router (auth middleware included) with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use seatrace_api::state::{AppConfig, AppState};

const SECRET: &str = "test-secret";

fn test_app() -> Router {
    let config = AppConfig {
        port: 0,
        auth_token: Some(SECRET.to_string()),
    };
    seatrace_api::app(AppState::with_config(config, None))
}

fn bearer(role: &str) -> String {
    format!("Bearer {role}:550e8400-e29b-41d4-a716-446655440000:{SECRET}")
}

fn post_json(uri: &str, role: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", bearer(role))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_req(uri: &str, role: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", bearer(role))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_request(product_id: &str, source_type: &str, role: &str) -> Request<Body> {
    post_json(
        "/v1/products",
        role,
        json!({
            "product_id": product_id,
            "species": "Atlantic salmon",
            "origin": "Hardangerfjord site 12",
            "batch_code": "LOT-2026-03",
            "source_type": source_type,
            "stage_data": {"recorded": true},
        }),
    )
}

// ── Registration ────────────────────────────────────────────────────

#[tokio::test]
async fn register_farmed_product_starts_at_hatchery() {
    let app = test_app();
    let response = app
        .oneshot(register_request("SALMON-2026-0001", "FARMED", "farmer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["id"], "SALMON-2026-0001");
    assert_eq!(body["batch_code"], "LOT-2026-03");
    assert_eq!(body["current_stage"], "HATCHERY");
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["history"].as_array().unwrap().len(), 1);
    assert!(body["history"][0]["previous_stage"].is_null());
}

#[tokio::test]
async fn register_wild_product_starts_at_fishing() {
    let app = test_app();
    let response = app
        .oneshot(register_request("COD-2026-0007", "WILD_CAPTURE", "fisherman"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["current_stage"], "FISHING");
    assert_eq!(body["source_type"], "WILD_CAPTURE");
}

#[tokio::test]
async fn register_with_unpermitted_role_forbidden() {
    let app = test_app();
    let response = app
        .oneshot(register_request("SALMON-2026-0002", "FARMED", "retailer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("NOT_AUTHORIZED"));
}

#[tokio::test]
async fn register_without_stage_data_rejected() {
    let app = test_app();
    let response = app
        .oneshot(post_json(
            "/v1/products",
            "farmer",
            json!({
                "product_id": "SALMON-2026-0003",
                "species": "Atlantic salmon",
                "origin": "site 9",
                "source_type": "FARMED",
                "stage_data": {},
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("MISSING_STAGE_DATA"));
}

#[tokio::test]
async fn register_initial_stage_outside_progression_rejected() {
    let app = test_app();
    let response = app
        .oneshot(post_json(
            "/v1/products",
            "fisherman",
            json!({
                "product_id": "COD-2026-0008",
                "species": "Atlantic cod",
                "origin": "Barents Sea",
                "source_type": "WILD_CAPTURE",
                "initial_stage": "HATCHERY",
                "stage_data": {"recorded": true},
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_invalid_product_id_rejected() {
    let app = test_app();
    let response = app
        .oneshot(register_request("x", "FARMED", "farmer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_duplicate_product_id_conflicts() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(register_request("SALMON-2026-0004", "FARMED", "farmer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(register_request("SALMON-2026-0004", "FARMED", "farmer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn get_and_list_products() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("SALMON-2026-0005", "FARMED", "farmer"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_req("/v1/products/SALMON-2026-0005", "retailer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_req("/v1/products", "retailer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(get_req("/v1/products/NOPE-404", "retailer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ── Stage transitions ───────────────────────────────────────────────

#[tokio::test]
async fn farmer_advances_farmed_product() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("SALMON-2026-0006", "FARMED", "farmer"))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0006/stage",
            "farmer",
            json!({
                "target_stage": "GROW_OUT",
                "stage_data": {"pen": "A-4", "feed": "standard"},
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["current_stage"], "GROW_OUT");
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["previous_stage"], "HATCHERY");
    assert_eq!(history[1]["stage"], "GROW_OUT");
    assert_eq!(history[1]["updated_by_role"], "farmer");
}

#[tokio::test]
async fn backward_transition_conflicts() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("SALMON-2026-0007", "FARMED", "farmer"))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0007/stage",
            "farmer",
            json!({"target_stage": "GROW_OUT", "stage_data": {"pen": "A-1"}}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0007/stage",
            "farmer",
            json!({"target_stage": "HATCHERY", "stage_data": {"again": true}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("BACKWARD_TRANSITION"));
}

#[tokio::test]
async fn cross_workflow_transition_conflicts() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("COD-2026-0009", "WILD_CAPTURE", "fisherman"))
        .await
        .unwrap();

    // Admin bypasses the role check, so the progression rejection is isolated.
    let response = app
        .oneshot(post_json(
            "/v1/products/COD-2026-0009/stage",
            "admin",
            json!({"target_stage": "GROW_OUT", "stage_data": {"pen": "A-1"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("CROSS_WORKFLOW_TRANSITION"));
}

#[tokio::test]
async fn wrong_role_transition_forbidden() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("SALMON-2026-0008", "FARMED", "farmer"))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0008/stage",
            "retailer",
            json!({"target_stage": "GROW_OUT", "stage_data": {"pen": "A-1"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_stage_data_rejected_then_accepted_with_data() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("COD-2026-0010", "WILD_CAPTURE", "fisherman"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/products/COD-2026-0010/stage",
            "processor",
            json!({"target_stage": "PROCESSING"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("MISSING_STAGE_DATA"));

    let response = app
        .oneshot(post_json(
            "/v1/products/COD-2026-0010/stage",
            "processor",
            json!({"target_stage": "PROCESSING", "stage_data": {"yield_pct": 62}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wild_product_walks_the_full_progression() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("COD-2026-0011", "WILD_CAPTURE", "fisherman"))
        .await
        .unwrap();

    let steps = [
        ("PROCESSING", "processor", json!({"yield_pct": 58})),
        ("DISTRIBUTION", "trader", json!({"truck": "NL-4821"})),
        ("RETAIL", "retailer", json!({"store": "Bergen fish market"})),
    ];
    for (stage, role, data) in steps {
        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/products/COD-2026-0011/stage",
                role,
                json!({"target_stage": stage, "stage_data": data}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "step to {stage}");
    }

    let response = app
        .oneshot(get_req("/v1/products/COD-2026-0011/history", "admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    let stages: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, ["FISHING", "PROCESSING", "DISTRIBUTION", "RETAIL"]);
}

#[tokio::test]
async fn transition_on_unknown_product_is_404() {
    let app = test_app();
    let response = app
        .oneshot(post_json(
            "/v1/products/NOPE-404/stage",
            "admin",
            json!({"target_stage": "PROCESSING", "stage_data": {"x": 1}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ── Status changes ──────────────────────────────────────────────────

#[tokio::test]
async fn recalled_product_blocks_further_transitions() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("SALMON-2026-0009", "FARMED", "farmer"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0009/recall",
            "admin",
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "RECALLED");

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0009/stage",
            "farmer",
            json!({"target_stage": "GROW_OUT", "stage_data": {"pen": "A-1"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Terminal statuses are irreversible; retire after recall conflicts too.
    let response = app
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0009/retire",
            "admin",
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stage_operator_may_recall_product_in_own_stage() {
    let app = test_app();
    app.clone()
        .oneshot(register_request("SALMON-2026-0010", "FARMED", "farmer"))
        .await
        .unwrap();

    // Retailer cannot recall a product still in HATCHERY.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0010/recall",
            "retailer",
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The farmer who operates that stage can.
    let response = app
        .oneshot(post_json(
            "/v1/products/SALMON-2026-0010/recall",
            "farmer",
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ── Auth & probes ───────────────────────────────────────────────────

#[tokio::test]
async fn api_requires_credentials() {
    let app = test_app();
    let request = Request::builder()
        .uri("/v1/products")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_probes_skip_auth() {
    let app = test_app();
    for uri in ["/health/liveness", "/health/readiness"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let app = test_app();
    let response = app
        .oneshot(get_req("/openapi.json", "admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert!(spec["paths"]["/v1/products"].is_object());
    assert!(spec["paths"]["/v1/products/{id}/stage"].is_object());
}
