//! End-to-end handler tests against the in-memory content store.

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use clipmart_api::setup::setup_routes;
use clipmart_api::state::AppState;
use clipmart_core::config::DestinationSecrets;
use clipmart_core::models::Creator;
use clipmart_core::Config;
use clipmart_db::MemoryContentStore;
use clipmart_pricing::{DiscountCatalog, DiscountKind, DiscountRule, StaticCatalogProvider};
use clipmart_services::{NoopNotifier, PricingEnrichmentService, PublishService};
use clipmart_storage::TransferAuthorizer;
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        public_site_url: "https://clipmart.example".to_string(),
        secrets: DestinationSecrets {
            general: Some("sekret".to_string()),
            vault: None,
        },
        general_store: None,
        vault_store: None,
        grant_expiry_secs: 900,
        discount_catalog_url: None,
        publish_webhook_url: None,
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        scrub_max_bytes: 1_500_000_000,
    }
}

async fn test_server() -> TestServer {
    let store = Arc::new(MemoryContentStore::new());
    let mut alice = Creator::new("Alice", "https://social.example/alice");
    alice.premium = true;
    alice.pay = true;
    alice.url_handle = Some("alice".to_string());
    store.add_creator(alice).await;

    let mut catalog = DiscountCatalog::default();
    catalog.creators.insert(
        "alice".to_string(),
        vec![DiscountRule {
            label: Some("Spring".to_string()),
            kind: DiscountKind::Percentage {
                percent_off: Decimal::from(25),
            },
            applies_to_tags: HashSet::new(),
        }],
    );

    // General class: secret configured, backend absent.
    let authorizer = TransferAuthorizer::new().with_general("sekret", None);

    let publisher = Arc::new(PublishService::new(
        store.clone(),
        store.clone(),
        Arc::new(NoopNotifier),
        "https://clipmart.example",
    ));
    let enrichment = Arc::new(PricingEnrichmentService::new(
        Arc::new(StaticCatalogProvider::new(catalog)),
        store.clone(),
    ));

    let config = test_config();
    let state = Arc::new(AppState {
        config: config.clone(),
        authorizer: Arc::new(authorizer),
        publisher,
        enrichment,
        items: store,
    });

    let router = setup_routes(&config, state).unwrap();
    TestServer::new(router).unwrap()
}

fn publish_body() -> Value {
    json!({
        "title": "Sunset run",
        "description": "Golden hour",
        "price": 20,
        "creatorName": "alice",
        "url": "https://cdn.example/p.mp4",
        "thumbnail": "https://cdn.example/t.jpg",
        "tags": ["vlog"]
    })
}

#[tokio::test]
async fn test_authorize_rejects_bad_secret() {
    let server = test_server().await;

    let response = server
        .post("/api/v0/uploads/authorize")
        .json(&json!({
            "fileName": "clip.mp4",
            "contentType": "video/mp4",
            "folder": "previews",
            "sharedSecret": "wrong"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_authorize_without_backend_is_misconfigured() {
    let server = test_server().await;

    let response = server
        .post("/api/v0/uploads/authorize")
        .json(&json!({
            "fileName": "clip.mp4",
            "contentType": "video/mp4",
            "sharedSecret": "sekret"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "DESTINATION_MISCONFIGURED");
}

#[tokio::test]
async fn test_authorize_requires_fields() {
    let server = test_server().await;

    let response = server
        .post("/api/v0/uploads/authorize")
        .json(&json!({
            "contentType": "video/mp4",
            "sharedSecret": "sekret"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_authorize_rejects_unknown_destination() {
    let server = test_server().await;

    let response = server
        .post("/api/v0/uploads/authorize")
        .json(&json!({
            "fileName": "clip.mp4",
            "contentType": "video/mp4",
            "sharedSecret": "sekret",
            "destination": "tape"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_unknown_creator_is_404() {
    let server = test_server().await;

    let mut body = publish_body();
    body["creatorName"] = json!("nobody");
    let response = server.post("/api/v0/items").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let error: Value = response.json();
    assert_eq!(error["code"], "CREATOR_NOT_FOUND");
}

#[tokio::test]
async fn test_publish_and_read_back_enriched() {
    let server = test_server().await;

    let created = server.post("/api/v0/items").json(&publish_body()).await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let item: Value = created.json();
    let id = item["id"].as_str().unwrap().to_string();

    // Single read carries injected pricing and creator flags.
    let single = server.get(&format!("/api/v0/items/{}", id)).await;
    assert_eq!(single.status_code(), StatusCode::OK);
    let view: Value = single.json();
    assert_eq!(view["basePrice"], json!(20.0));
    assert_eq!(view["finalPrice"], json!(15.0));
    assert_eq!(view["discount"]["type"], "percentage");
    assert_eq!(view["premium"], true);
    assert_eq!(view["pay"], true);
    assert_eq!(view["creatorUrlHandle"], "alice");

    // List shaping is identical to single shaping.
    let list = server.get("/api/v0/items").await;
    assert_eq!(list.status_code(), StatusCode::OK);
    let views: Value = list.json();
    assert_eq!(views[0], view);
}

#[tokio::test]
async fn test_publish_duplicate_full_key_is_conflict() {
    let server = test_server().await;

    let mut body = publish_body();
    body["fullKey"] = json!("full/clip-1.mp4");

    let first = server.post("/api/v0/items").json(&body).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = server.post("/api/v0/items").json(&body).await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    let error: Value = second.json();
    assert_eq!(error["code"], "CONFLICT");
}

#[tokio::test]
async fn test_publish_price_defaults_to_zero() {
    let server = test_server().await;

    let mut body = publish_body();
    body["price"] = json!("not a number");
    let response = server.post("/api/v0/items").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let item: Value = response.json();
    assert_eq!(item["price"], json!(0.0));
}

#[tokio::test]
async fn test_get_unknown_item_is_404() {
    let server = test_server().await;
    let response = server
        .get(&format!("/api/v0/items/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
