use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Offer, Rfq};
use super::optimizer::SelectionConstraints;
use super::service::{QuoteEngine, QuoteError};

/// Body of `POST /api/v1/quotes/select`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub rfq: Rfq,
    pub offers: Vec<Offer>,
    /// Falls back to the host's configured floor.
    #[serde(default)]
    pub margin_floor: Option<f64>,
    /// Enables the delivery-window check against the RFQ deadline.
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub(crate) struct QuoteState {
    engine: Arc<QuoteEngine>,
    default_margin_floor: f64,
}

impl QuoteState {
    pub(crate) fn new(engine: Arc<QuoteEngine>, default_margin_floor: f64) -> Self {
        Self {
            engine,
            default_margin_floor,
        }
    }
}

/// Router builder exposing the quoting endpoints over a shared engine.
pub fn quote_router(engine: Arc<QuoteEngine>, default_margin_floor: f64) -> Router {
    Router::new()
        .route("/api/v1/quotes/select", post(select_handler))
        .route("/api/v1/model", get(model_handler))
        .with_state(QuoteState::new(engine, default_margin_floor))
}

pub(crate) async fn select_handler(
    State(state): State<QuoteState>,
    request: Result<Json<QuoteRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let payload = json!({
                "kind": "invalid_request",
                "error": rejection.body_text(),
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };
    let QuoteRequest {
        rfq,
        offers,
        margin_floor,
        order_date,
    } = request;
    let margin_floor = margin_floor.unwrap_or(state.default_margin_floor);
    let constraints = SelectionConstraints::for_rfq(&rfq, margin_floor, order_date);

    match state.engine.select_best_offer(&rfq, &offers, &constraints) {
        Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
        Err(QuoteError::NoFeasibleOffer { source, ranked }) => {
            let payload = json!({
                "kind": "no_feasible_offer",
                "error": source.to_string(),
                "margin_floor": source.margin_floor,
                "ranked": ranked,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(QuoteError::Schema(error)) => {
            let payload = json!({
                "kind": "invalid_offer",
                "error": error.to_string(),
                "supplier_id": error.supplier_id(),
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        Err(error @ QuoteError::InvalidMarginFloor(_)) => {
            let payload = json!({
                "kind": error.kind(),
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        Err(error @ QuoteError::FeatureShape(_)) => {
            tracing::error!(%error, "model and feature pipeline disagree");
            let payload = json!({
                "kind": error.kind(),
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn model_handler(State(state): State<QuoteState>) -> Json<serde_json::Value> {
    Json(json!({
        "model_version": state.engine.model_version(),
        "input_width": state.engine.input_width(),
    }))
}
