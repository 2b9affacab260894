use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRiskStore};
use crate::routes::with_risk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use conflict_risk::config::AppConfig;
use conflict_risk::error::AppError;
use conflict_risk::risk::{RiskService, ScoringEngine};
use conflict_risk::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dataset) = args.dataset.take() {
        config.dataset_path = Some(dataset);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let engine = ScoringEngine::from_config(&config.engine);
    let store = InMemoryRiskStore::load(config.dataset_path.as_deref(), &engine)?;
    info!(
        records = store.len(),
        dataset = ?config.dataset_path,
        "risk time series loaded"
    );

    let risk_service = Arc::new(
        RiskService::new(Arc::new(store), engine, config.cache.clone())
            .with_alert_threshold(config.engine.alert_threshold),
    );

    let app = with_risk_routes(risk_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "conflict risk engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
