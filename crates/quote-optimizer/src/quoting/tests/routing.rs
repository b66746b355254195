use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::quoting::router::{quote_router, select_handler, QuoteRequest, QuoteState};

fn select_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/quotes/select")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn scenario_body(margin_floor: Option<f64>) -> Value {
    let mut body = json!({
        "rfq": rfq(),
        "offers": scenario_offers(),
    });
    if let Some(floor) = margin_floor {
        body["margin_floor"] = json!(floor);
    }
    body
}

#[tokio::test]
async fn select_endpoint_returns_decision() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);

    let response = app
        .oneshot(select_request(scenario_body(None)))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["selected"]["offer"]["supplier_id"], "A");
    assert_eq!(payload["margin_floor"], 0.15);
    assert_eq!(payload["ranked"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn select_endpoint_reports_infeasible_floor() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);

    let response = app
        .oneshot(select_request(scenario_body(Some(0.30))))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "no_feasible_offer");
    assert_eq!(payload["margin_floor"], 0.30);
    let ranked = payload["ranked"].as_array().expect("ranked rows");
    assert!(ranked.iter().all(|row| row["is_selected"] == false));
}

#[tokio::test]
async fn select_endpoint_rejects_invalid_offer() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);
    let mut body = scenario_body(None);
    body["offers"][1]["unit_price"] = json!(-1.0);

    let response = app
        .oneshot(select_request(body))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "invalid_offer");
    assert_eq!(payload["supplier_id"], "B");
}

#[tokio::test]
async fn undecodable_offer_is_a_bad_request_not_an_infeasible_quote() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);
    let mut body = scenario_body(None);
    body["offers"][1]
        .as_object_mut()
        .expect("offer object")
        .remove("margin");

    let response = app
        .oneshot(select_request(body))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "invalid_request");
    let error = payload["error"].as_str().expect("error message");
    assert!(error.contains("margin"));
}

#[tokio::test]
async fn negative_lead_time_and_bad_rfq_are_rejected_as_requests() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);

    let mut negative_lead = scenario_body(None);
    negative_lead["offers"][0]["lead_time_days"] = json!(-3);
    let mut bad_deadline = scenario_body(None);
    bad_deadline["rfq"]["deadline"] = json!("next week");

    for body in [negative_lead, bad_deadline] {
        let response = app
            .clone()
            .oneshot(select_request(body))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = read_json_body(response).await;
        assert_eq!(payload["kind"], "invalid_request");
    }
}

#[tokio::test]
async fn body_without_json_content_type_is_a_bad_request() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/quotes/select")
        .body(Body::from(scenario_body(None).to_string()))
        .expect("request");

    let response = app.oneshot(request).await.expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json_body(response).await["kind"], "invalid_request");
}

#[tokio::test]
async fn select_endpoint_rejects_out_of_range_floor() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);

    let response = app
        .oneshot(select_request(scenario_body(Some(1.5))))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "invalid_request");
}

#[tokio::test]
async fn model_endpoint_describes_loaded_artifact() {
    let app = quote_router(Arc::new(stub_engine(&scenario_probabilities())), 0.15);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/model")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["model_version"], "supplier-lookup");
    assert_eq!(payload["input_width"], 3);
}

#[tokio::test]
async fn handler_applies_delivery_window_from_order_date() {
    let state = QuoteState::new(Arc::new(stub_engine(&scenario_probabilities())), 0.15);
    let mut offers = scenario_offers();
    offers[0].lead_time_days = 20;
    let request = QuoteRequest {
        rfq: rfq(),
        offers,
        margin_floor: None,
        order_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 20),
    };

    let response = select_handler(State(state), Ok(Json(request))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["selected"]["offer"]["supplier_id"], "C");
}
