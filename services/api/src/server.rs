use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_quote_routes;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use quote_optimizer::config::AppConfig;
use quote_optimizer::error::AppError;
use quote_optimizer::quoting::QuoteEngine;
use quote_optimizer::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let engine = Arc::new(QuoteEngine::load(&config.quoting.model_path)?);
    let model_version = engine.model_version().to_string();

    let app = build_app(engine, config.quoting.default_margin_floor, app_state)
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %model_version,
        margin_floor = config.quoting.default_margin_floor,
        "quote optimizer ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn build_app(
    engine: Arc<QuoteEngine>,
    default_margin_floor: f64,
    state: AppState,
) -> Router {
    with_quote_routes(engine, default_margin_floor).layer(Extension(state))
}
