use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use quote_optimizer::quoting::{quote_router, QuoteEngine};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_quote_routes(
    engine: Arc<QuoteEngine>,
    default_margin_floor: f64,
) -> axum::Router {
    quote_router(engine, default_margin_floor)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use quote_optimizer::quoting::ModelArtifact;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    const ARTIFACT: &str = include_str!("../../../models/win_probability.json");

    fn engine() -> Arc<QuoteEngine> {
        let artifact =
            ModelArtifact::from_reader(ARTIFACT.as_bytes(), "bundled").expect("artifact loads");
        Arc::new(QuoteEngine::from_artifact(artifact).expect("bundled artifact is valid"))
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let response = readiness_endpoint(Extension(state(false))).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let response = readiness_endpoint(Extension(state(true))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn host_routes_sit_next_to_quote_routes() {
        let app = with_quote_routes(engine(), 0.2).layer(Extension(state(true)));

        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(health.status(), StatusCode::OK);

        let model = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/model")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("model response");
        assert_eq!(model.status(), StatusCode::OK);
        let payload = json_body(model).await;
        assert_eq!(payload["model_version"], "gbt-win-2025.06");
        assert_eq!(payload["input_width"], 17);
    }

    #[tokio::test]
    async fn select_route_uses_configured_floor() {
        let app = with_quote_routes(engine(), 0.2).layer(Extension(state(true)));
        let body = json!({
            "rfq": {
                "client_id": "C-301",
                "region": "FR",
                "product_type": "t-shirt",
                "quantity": 250,
                "deadline": "2025-09-01"
            },
            "offers": [
                { "supplier_id": "S-1", "unit_price": 4.1, "quoted_margin_pct": 0.18,
                  "lead_time_days": 6, "tier": "A", "on_time_rate": 0.95 },
                { "supplier_id": "S-2", "unit_price": 3.9, "quoted_margin_pct": 0.24,
                  "lead_time_days": 8, "tier": "B", "on_time_rate": 0.9 }
            ]
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/quotes/select")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("select response");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["margin_floor"], 0.2);
        assert_eq!(payload["selected"]["offer"]["supplier_id"], "S-2");
    }
}
