//! Integration tests for the capture API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The engine runs over an in-memory repository,
//! or over small fault-injecting repositories where a store failure has
//! to be simulated.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pokedex_api::router::{MAX_BODY_BYTES, build_router};
use pokedex_api::state::AppState;
use pokedex_core::{
    CaptureEngine, CaptureRepository, InsertOutcome, Lifecycle, MemoryRepository, StoreFault,
};
use pokedex_types::{CapturedRecord, Pokemon, PokemonId};
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_router() -> Router {
    build_router(Arc::new(AppState::in_memory()))
}

fn router_over(repository: Arc<dyn CaptureRepository>) -> Router {
    build_router(Arc::new(AppState::new(
        CaptureEngine::new(repository),
        Lifecycle::new(),
    )))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(body: &Value) -> Request<Body> {
    Request::post("/api/captured")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(id: &str) -> Request<Body> {
    Request::delete(format!("/api/captured/{id}"))
        .body(Body::empty())
        .unwrap()
}

fn list() -> Request<Body> {
    Request::get("/api/captured").body(Body::empty()).unwrap()
}

// =========================================================================
// Health
// =========================================================================

#[tokio::test]
async fn test_health() {
    let response = make_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await, json!({"status": "ok"}));
}

// =========================================================================
// Capture / release scenario
// =========================================================================

#[tokio::test]
async fn test_capture_scenario() {
    let router = make_router();
    let pikachu = json!({"id": 25, "name": "pikachu"});

    // First capture creates the record.
    let response = router.clone().oneshot(post_json(&pikachu)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_to_json(response.into_body()).await,
        json!({"status": "captured", "pokemon": {"id": 25, "name": "pikachu"}})
    );

    let listed = body_to_json(router.clone().oneshot(list()).await.unwrap().into_body()).await;
    let original_captured_at = listed[0]["captured_at"].clone();
    assert!(original_captured_at.is_string());

    // Repeating it reports the original timestamp.
    let response = router.clone().oneshot(post_json(&pikachu)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response.into_body()).await,
        json!({
            "status": "already_captured",
            "pokemon": {"id": 25, "name": "pikachu"},
            "captured_at": original_captured_at
        })
    );

    // Release returns the removed payload.
    let response = router.clone().oneshot(delete("25")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response.into_body()).await,
        json!({"status": "released", "pokemon": {"id": 25, "name": "pikachu"}})
    );

    // Releasing again is a 404.
    let response = router.clone().oneshot(delete("25")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_list_merges_captured_at_and_keeps_extra_fields() {
    let router = make_router();
    let charizard = json!({
        "id": 6,
        "name": "charizard",
        "types": [{"type": {"name": "fire"}}],
        "height": 17
    });
    router.clone().oneshot(post_json(&charizard)).await.unwrap();

    let response = router.oneshot(list()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let entry = json[0].as_object().unwrap();
    assert_eq!(entry["types"], charizard["types"]);
    assert_eq!(entry["height"], 17);
    assert!(entry.contains_key("captured_at"));
    assert_eq!(entry.len(), 5);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let router = make_router();
    for (id, name) in [(1, "bulbasaur"), (4, "charmander"), (7, "squirtle")] {
        let response = router
            .clone()
            .oneshot(post_json(&json!({"id": id, "name": name})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let json = body_to_json(router.oneshot(list()).await.unwrap().into_body()).await;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["squirtle", "charmander", "bulbasaur"]);
}

#[tokio::test]
async fn test_release_then_recapture() {
    let router = make_router();
    let eevee = json!({"id": 133, "name": "eevee"});

    router.clone().oneshot(post_json(&eevee)).await.unwrap();
    router.clone().oneshot(delete("133")).await.unwrap();

    let json = body_to_json(router.clone().oneshot(list()).await.unwrap().into_body()).await;
    assert_eq!(json, json!([]));

    let response = router.oneshot(post_json(&eevee)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

// =========================================================================
// Validation
// =========================================================================

#[tokio::test]
async fn test_capture_rejects_missing_fields() {
    let router = make_router();

    for body in [json!({"name": "missingno"}), json!({"id": 0}), json!({})] {
        let response = router.clone().oneshot(post_json(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");

        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["status"], "error");
        assert!(json["details"]["fieldErrors"].is_object());
    }

    let json = body_to_json(router.oneshot(list()).await.unwrap().into_body()).await;
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_capture_rejects_malformed_json() {
    let request = Request::post("/api/captured")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"id\": 25, \"name\": "))
        .unwrap();

    let response = make_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_capture_without_content_type_is_bad_request() {
    let request = Request::post("/api/captured")
        .body(Body::from(json!({"id": 25, "name": "pikachu"}).to_string()))
        .unwrap();

    let response = make_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_capture_rejects_oversized_body() {
    let filler = "x".repeat(MAX_BODY_BYTES + 1);
    let body = json!({"id": 25, "name": "pikachu", "filler": filler});

    let response = make_router().oneshot(post_json(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_release_rejects_non_integer_ids() {
    let router = make_router();
    for raw in ["pikachu", "25abc", "-1", "0", "99999999999"] {
        let response = router.clone().oneshot(delete(raw)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "id {raw}");
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["status"], "error");
    }
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let response = make_router()
        .oneshot(Request::get("/api/nothing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_captures() {
    let router = make_router();
    let attempts = 24;

    let responses = futures::future::join_all((0..attempts).map(|_| {
        let router = router.clone();
        tokio::spawn(async move {
            router
                .oneshot(post_json(&json!({"id": 143, "name": "snorlax"})))
                .await
                .unwrap()
                .status()
        })
    }))
    .await;

    let created = responses
        .iter()
        .filter(|status| *status.as_ref().unwrap() == StatusCode::CREATED)
        .count();
    let ok = responses
        .iter()
        .filter(|status| *status.as_ref().unwrap() == StatusCode::OK)
        .count();
    assert_eq!(created, 1);
    assert_eq!(ok, attempts - 1);

    let json = body_to_json(router.oneshot(list()).await.unwrap().into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// =========================================================================
// Store failures
// =========================================================================

/// Fails every operation with a driver-looking error.
struct BrokenRepository;

#[async_trait]
impl CaptureRepository for BrokenRepository {
    async fn insert(&self, _pokemon: Pokemon) -> Result<InsertOutcome, StoreFault> {
        Err(StoreFault::new("insert", "connection refused (os error 111)"))
    }

    async fn find_by_id(&self, _id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        Err(StoreFault::new("find_by_id", "connection refused (os error 111)"))
    }

    async fn list_all(&self) -> Result<Vec<CapturedRecord>, StoreFault> {
        Err(StoreFault::new("list_all", "connection refused (os error 111)"))
    }

    async fn delete_by_id(&self, _id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        Err(StoreFault::new("delete_by_id", "connection refused (os error 111)"))
    }
}

#[tokio::test]
async fn test_store_failures_are_generic_500s() {
    let router = router_over(Arc::new(BrokenRepository));

    let requests = [
        list(),
        post_json(&json!({"id": 25, "name": "pikachu"})),
        delete("25"),
    ];
    for request in requests {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["status"], "error");
        let message = json["message"].as_str().unwrap();
        assert!(!message.contains("os error"), "leaked: {message}");
    }
}

#[tokio::test]
async fn test_validation_happens_before_store_access() {
    let router = router_over(Arc::new(BrokenRepository));

    let response = router
        .clone()
        .oneshot(post_json(&json!({"name": "pikachu"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router.oneshot(delete("abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Conflicts on insert, then loses the row to a concurrent release.
struct VanishingRepository {
    inner: MemoryRepository,
}

#[async_trait]
impl CaptureRepository for VanishingRepository {
    async fn insert(&self, _pokemon: Pokemon) -> Result<InsertOutcome, StoreFault> {
        Ok(InsertOutcome::Conflict)
    }

    async fn find_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        self.inner.find_by_id(id).await
    }

    async fn list_all(&self) -> Result<Vec<CapturedRecord>, StoreFault> {
        self.inner.list_all().await
    }

    async fn delete_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        self.inner.delete_by_id(id).await
    }
}

#[tokio::test]
async fn test_reconciliation_miss_is_retryable() {
    let router = router_over(Arc::new(VanishingRepository {
        inner: MemoryRepository::new(),
    }));

    let response = router
        .oneshot(post_json(&json!({"id": 25, "name": "pikachu"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
}
