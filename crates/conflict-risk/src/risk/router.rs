use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{EntityId, RawRiskInputs, RiskInputVector, ScenarioOverride};
use super::scoring::RiskAssessment;
use super::service::{RiskService, RiskServiceError};
use super::store::RiskStore;

const DEFAULT_HISTORY_YEARS: u32 = 10;

/// Router builder exposing scoring, simulation, and fleet endpoints.
pub fn risk_router<S>(service: Arc<RiskService<S>>) -> Router
where
    S: RiskStore + 'static,
{
    Router::new()
        .route("/api/v1/risk/score", post(score_handler::<S>))
        .route("/api/v1/risk/simulate", post(simulate_handler::<S>))
        .route("/api/v1/risk/heatmap", get(heatmap_handler::<S>))
        .route("/api/v1/alerts", get(alerts_handler::<S>))
        .route("/api/v1/alerts/stats", get(tier_stats_handler::<S>))
        .route(
            "/api/v1/entities/:entity_id/latest",
            get(latest_handler::<S>),
        )
        .route(
            "/api/v1/entities/:entity_id/stability",
            get(stability_handler::<S>),
        )
        .route(
            "/api/v1/entities/:entity_id/history",
            get(history_handler::<S>),
        )
        .route("/api/v1/compare", get(compare_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub inputs: RiskInputVector,
    pub assessment: RiskAssessment,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    #[serde(alias = "iso")]
    pub entity_id: String,
    #[serde(default)]
    pub overrides: ScenarioOverride,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub years: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub entities: String,
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<RiskService<S>>>,
    Json(raw): Json<RawRiskInputs>,
) -> Response
where
    S: RiskStore + 'static,
{
    let inputs = RiskInputVector::from_raw(&raw);
    let assessment = service.score(&inputs);
    (StatusCode::OK, Json(ScoreResponse { inputs, assessment })).into_response()
}

pub(crate) async fn simulate_handler<S>(
    State(service): State<Arc<RiskService<S>>>,
    Json(request): Json<SimulateRequest>,
) -> Response
where
    S: RiskStore + 'static,
{
    let entity = EntityId::normalized(&request.entity_id);
    if entity.as_str().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "entity_id is required");
    }

    match service.simulate(&entity, &request.overrides).await {
        Ok(Some(outcome)) => {
            let payload = json!({
                "entity_id": entity,
                "baseline": outcome.baseline,
                "simulated": outcome.simulated,
                "delta": outcome.delta,
                "scenario": outcome.scenario,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(None) => not_found(&entity),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn heatmap_handler<S>(State(service): State<Arc<RiskService<S>>>) -> Response
where
    S: RiskStore + 'static,
{
    match service.heatmap().await {
        Ok(records) => {
            let payload = json!({ "count": records.len(), "data": records });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn alerts_handler<S>(
    State(service): State<Arc<RiskService<S>>>,
    Query(query): Query<AlertsQuery>,
) -> Response
where
    S: RiskStore + 'static,
{
    let threshold = query.threshold.unwrap_or(service.alert_threshold());
    match service.alerts(Some(threshold)).await {
        Ok(records) => {
            let payload = json!({
                "threshold": threshold,
                "count": records.len(),
                "data": records,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn tier_stats_handler<S>(State(service): State<Arc<RiskService<S>>>) -> Response
where
    S: RiskStore + 'static,
{
    match service.tier_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn latest_handler<S>(
    State(service): State<Arc<RiskService<S>>>,
    Path(entity_id): Path<String>,
) -> Response
where
    S: RiskStore + 'static,
{
    let entity = EntityId::normalized(&entity_id);
    match service.latest(&entity).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => not_found(&entity),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn stability_handler<S>(
    State(service): State<Arc<RiskService<S>>>,
    Path(entity_id): Path<String>,
) -> Response
where
    S: RiskStore + 'static,
{
    let entity = EntityId::normalized(&entity_id);
    match service.stability(&entity).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => not_found(&entity),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn history_handler<S>(
    State(service): State<Arc<RiskService<S>>>,
    Path(entity_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    S: RiskStore + 'static,
{
    let entity = EntityId::normalized(&entity_id);
    let years = query.years.unwrap_or(DEFAULT_HISTORY_YEARS);
    match service.history(&entity, years).await {
        Ok(Some(records)) => {
            let payload = json!({
                "entity_id": entity,
                "years": years,
                "data": records.as_slice(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(None) => not_found(&entity),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn compare_handler<S>(
    State(service): State<Arc<RiskService<S>>>,
    Query(query): Query<CompareQuery>,
) -> Response
where
    S: RiskStore + 'static,
{
    let entities: Vec<EntityId> = query
        .entities
        .split(',')
        .map(EntityId::normalized)
        .filter(|entity| !entity.as_str().is_empty())
        .collect();

    match service.compare(&entities).await {
        Ok(records) => {
            let payload = json!({ "count": records.len(), "data": records });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

fn not_found(entity: &EntityId) -> Response {
    let payload = json!({
        "entity_id": entity,
        "error": "no risk data for entity",
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn service_error_response(err: RiskServiceError) -> Response {
    let status = match &err {
        RiskServiceError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        RiskServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        RiskServiceError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": err.to_string(),
        "retryable": err.is_retryable(),
    });
    (status, Json(payload)).into_response()
}
