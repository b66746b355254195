use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::quoting::domain::{AttributeValue, Offer, ProductType, Rfq, ScoredOffer};
use crate::quoting::features::{
    CategoricalColumn, FeaturePipeline, FeatureSchema, NumericColumn,
};
use crate::quoting::model::{ModelArtifact, Predictor, WinProbabilityModel};
use crate::quoting::service::QuoteEngine;

pub(super) const FIXTURE_ARTIFACT: &str =
    include_str!("../../../../../models/win_probability.json");

pub(super) fn rfq() -> Rfq {
    Rfq {
        client_id: "C-512".to_string(),
        region: "NL".to_string(),
        product_type: ProductType::Flyer,
        quantity: 1500,
        deadline: NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date"),
    }
}

pub(super) fn offer(supplier_id: &str, margin: f64) -> Offer {
    Offer::new(supplier_id, 1.45, margin, 6)
        .with_attribute("tier", AttributeValue::Text("B".to_string()))
        .with_attribute("on_time_rate", AttributeValue::Number(0.93))
}

/// A 0.20 / p 0.6, B 0.10 / p 0.9, C 0.25 / p 0.3.
pub(super) fn scenario_offers() -> Vec<Offer> {
    vec![offer("A", 0.20), offer("B", 0.10), offer("C", 0.25)]
}

pub(super) fn scenario_probabilities() -> Vec<(&'static str, f64)> {
    vec![("A", 0.6), ("B", 0.9), ("C", 0.3)]
}

pub(super) fn scored(supplier_id: &str, margin: f64, p_win: f64) -> ScoredOffer {
    ScoredOffer::new(offer(supplier_id, margin), p_win)
}

/// Looks the probability up from a one-hot supplier encoding.
pub(super) struct SupplierLookupModel {
    probabilities: Vec<f64>,
}

impl WinProbabilityModel for SupplierLookupModel {
    fn input_width(&self) -> usize {
        self.probabilities.len()
    }

    fn win_probability(&self, features: &[f64]) -> f64 {
        features
            .iter()
            .zip(&self.probabilities)
            .map(|(hot, probability)| hot * probability)
            .sum()
    }

    fn version(&self) -> &str {
        "supplier-lookup"
    }
}

/// Always answers the same raw value, whatever the input.
pub(super) struct ConstantModel {
    pub(super) width: usize,
    pub(super) value: f64,
}

impl WinProbabilityModel for ConstantModel {
    fn input_width(&self) -> usize {
        self.width
    }

    fn win_probability(&self, _features: &[f64]) -> f64 {
        self.value
    }
}

pub(super) fn supplier_schema(suppliers: &[&str]) -> FeatureSchema {
    FeatureSchema {
        numeric: Vec::new(),
        categorical: vec![CategoricalColumn {
            name: "supplier_id".to_string(),
            categories: suppliers.iter().map(|id| id.to_string()).collect(),
        }],
    }
}

pub(super) fn stub_engine(probabilities: &[(&str, f64)]) -> QuoteEngine {
    let suppliers: Vec<&str> = probabilities.iter().map(|(id, _)| *id).collect();
    let model = SupplierLookupModel {
        probabilities: probabilities.iter().map(|(_, p)| *p).collect(),
    };
    QuoteEngine::new(
        FeaturePipeline::new(supplier_schema(&suppliers)),
        Predictor::new(Arc::new(model)),
    )
}

pub(super) fn print_schema() -> FeatureSchema {
    FeatureSchema {
        numeric: vec![
            NumericColumn {
                name: "quoted_margin_pct".to_string(),
                mean: 0.24,
                scale: 0.04,
            },
            NumericColumn {
                name: "price_delta_pct".to_string(),
                mean: 0.0,
                scale: 1.0,
            },
            NumericColumn {
                name: "on_time_rate".to_string(),
                mean: 0.9,
                scale: 0.0,
            },
        ],
        categorical: vec![
            CategoricalColumn {
                name: "tier".to_string(),
                categories: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            },
            CategoricalColumn {
                name: "region".to_string(),
                categories: vec!["DE".to_string(), "NL".to_string()],
            },
        ],
    }
}

pub(super) fn fixture_artifact() -> ModelArtifact {
    ModelArtifact::from_reader(FIXTURE_ARTIFACT.as_bytes(), "fixture").expect("fixture loads")
}

pub(super) fn logistic_artifact_json(coefficients: &[f64]) -> String {
    serde_json::json!({
        "format_version": 1,
        "model_version": "logit-test",
        "features": {
            "numeric": [
                { "name": "quoted_margin_pct", "mean": 0.24, "scale": 0.04 },
                { "name": "lead_time_days", "mean": 6.0, "scale": 2.0 }
            ],
            "categorical": [
                { "name": "tier", "categories": ["A", "B", "C"] }
            ]
        },
        "classifier": {
            "kind": "logistic",
            "intercept": -0.2,
            "coefficients": coefficients
        }
    })
    .to_string()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
