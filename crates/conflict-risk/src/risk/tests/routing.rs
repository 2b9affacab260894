use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{build_service, engine, read_json_body, UnavailableStore};
use crate::config::CacheConfig;
use crate::risk::router::risk_router;
use crate::risk::service::RiskService;

fn app() -> Router {
    let (service, _) = build_service();
    risk_router(Arc::new(service))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

#[tokio::test]
async fn score_endpoint_scores_raw_inputs() {
    let payload = json!({
        "militaryRisk": 80,
        "economicRisk": "70",
        "political": 60,
        "alliance": 50,
        "cyber": 40,
        "social": 30
    });

    let response = app()
        .oneshot(post_json("/api/v1/risk/score", payload))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["assessment"]["composite"], json!(60.5));
    assert_eq!(body["assessment"]["tier"], json!("High"));
    assert_eq!(body["assessment"]["model_version"], json!("rule_based_v1.0"));
    assert_eq!(body["inputs"]["economic"], json!(70.0));
    assert_eq!(body["assessment"]["attribution"]["military"], json!(33.06));
}

#[tokio::test]
async fn score_endpoint_treats_missing_and_invalid_components_as_neutral() {
    let payload = json!({ "military": "n/a", "economic": 250 });

    let response = app()
        .oneshot(post_json("/api/v1/risk/score", payload))
        .await
        .expect("response");
    let body = read_json_body(response).await;

    assert_eq!(body["inputs"]["military"], json!(50.0));
    assert_eq!(body["inputs"]["economic"], json!(50.0));
    assert_eq!(body["assessment"]["composite"], json!(50.0));
    assert_eq!(body["assessment"]["tier"], json!("Moderate"));
}

#[tokio::test]
async fn simulate_endpoint_reports_delta() {
    let payload = json!({
        "iso": " pak ",
        "overrides": { "militaryBudgetChangePct": -20 }
    });

    let response = app()
        .oneshot(post_json("/api/v1/risk/simulate", payload))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["entity_id"], json!("PAK"));
    assert_eq!(body["delta"], json!(-7.5));
    assert_eq!(body["baseline"]["tier"], json!("Critical"));
    assert_eq!(body["simulated"]["tier"], json!("High"));
}

#[tokio::test]
async fn simulate_unknown_entity_is_not_found() {
    let payload = json!({ "entity_id": "ATL", "overrides": {} });
    let response = app()
        .oneshot(post_json("/api/v1/risk/simulate", payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["entity_id"], json!("ATL"));
}

#[tokio::test]
async fn simulate_requires_an_entity() {
    let payload = json!({ "entity_id": "   " });
    let response = app()
        .oneshot(post_json("/api/v1/risk/simulate", payload))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn alerts_endpoint_uses_default_threshold() {
    let response = app().oneshot(get("/api/v1/alerts")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["threshold"], json!(60.0));
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["data"][0]["entity_id"], json!("UKR"));
    assert_eq!(body["data"][2]["entity_id"], json!("IND"));
}

#[tokio::test]
async fn alerts_endpoint_honours_query_threshold() {
    let response = app()
        .oneshot(get("/api/v1/alerts?threshold=85"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["count"], json!(1));
}

#[tokio::test]
async fn tier_stats_endpoint_lists_present_tiers() {
    let response = app()
        .oneshot(get("/api/v1/alerts/stats"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["total_monitored"], json!(5));
    let tiers: Vec<&str> = body["by_tier"]
        .as_array()
        .expect("tier list")
        .iter()
        .filter_map(|bucket| bucket["tier"].as_str())
        .collect();
    assert_eq!(tiers, vec!["Low", "Moderate", "High", "Critical"]);
}

#[tokio::test]
async fn heatmap_endpoint_ranks_the_fleet() {
    let response = app()
        .oneshot(get("/api/v1/risk/heatmap"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["count"], json!(5));
    assert_eq!(body["data"][4]["entity_id"], json!("NOR"));
}

#[tokio::test]
async fn entity_routes_normalize_ids() {
    let response = app()
        .oneshot(get("/api/v1/entities/ind/latest"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["entity_id"], json!("IND"));
    assert_eq!(body["year"], json!(2024));
    assert_eq!(body["month"], json!(3));

    let response = app()
        .oneshot(get("/api/v1/entities/ind/stability"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["radar"][0]["score"], json!(38.0));
}

#[tokio::test]
async fn unknown_entity_latest_is_not_found() {
    let response = app()
        .oneshot(get("/api/v1/entities/ATL/latest"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_endpoint_returns_not_found_for_unknown_entity() {
    let response = app()
        .oneshot(get("/api/v1/entities/ATL/history?years=5"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["entity_id"], json!("ATL"));
}

#[tokio::test]
async fn history_endpoint_lists_known_entity() {
    let response = app()
        .oneshot(get("/api/v1/entities/pak/history?years=100"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["years"], json!(100));
    assert_eq!(body["data"][0]["year"], json!(2023));
    assert_eq!(body["data"][1]["year"], json!(2024));
}

#[tokio::test]
async fn compare_endpoint_rejects_single_entity() {
    let response = app()
        .oneshot(get("/api/v1/compare?entities=IND"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json_body(response).await;
    assert_eq!(body["retryable"], json!(false));
}

#[tokio::test]
async fn compare_endpoint_returns_request_order() {
    let response = app()
        .oneshot(get("/api/v1/compare?entities=nor,ukr"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["data"][0]["entity_id"], json!("NOR"));
    assert_eq!(body["data"][1]["entity_id"], json!("UKR"));
}

#[tokio::test]
async fn store_outage_returns_service_unavailable() {
    let service = RiskService::new(
        Arc::new(UnavailableStore),
        engine(),
        CacheConfig::default(),
    );
    let app = risk_router(Arc::new(service));

    let response = app.oneshot(get("/api/v1/alerts")).await.expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = read_json_body(response).await;
    assert_eq!(body["retryable"], json!(true));
}
