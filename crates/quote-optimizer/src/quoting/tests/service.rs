use std::sync::Arc;

use super::common::*;
use crate::quoting::domain::{AttributeValue, Offer};
use crate::quoting::features::{FeaturePipeline, SchemaError};
use crate::quoting::model::Predictor;
use crate::quoting::optimizer::SelectionConstraints;
use crate::quoting::service::{QuoteEngine, QuoteError, QuoteErrorKind};

#[test]
fn selects_from_scored_offers_end_to_end() {
    let engine = stub_engine(&scenario_probabilities());

    let decision = engine
        .select_best_offer(&rfq(), &scenario_offers(), &SelectionConstraints::new(0.15))
        .expect("A clears the floor");

    assert_eq!(decision.selected.supplier_id(), "A");
    assert!((decision.selected.p_win() - 0.6).abs() < 1e-12);
    assert_eq!(decision.model_version, "supplier-lookup");
    assert_eq!(decision.margin_floor, 0.15);
    assert_eq!(decision.ranked.len(), 3);
    assert_eq!(
        decision.ranked.selected().map(|row| row.supplier_id.as_str()),
        Some("A")
    );
}

#[test]
fn score_preserves_input_order() {
    let engine = stub_engine(&scenario_probabilities());

    let scored = engine.score(&rfq(), &scenario_offers()).expect("scores");

    let ids: Vec<&str> = scored.iter().map(|offer| offer.supplier_id()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert!((scored[1].objective_value() - 0.09).abs() < 1e-12);
}

#[test]
fn no_feasible_offer_still_returns_the_ranking() {
    let engine = stub_engine(&scenario_probabilities());

    let err = engine
        .select_best_offer(&rfq(), &scenario_offers(), &SelectionConstraints::new(0.30))
        .expect_err("nothing clears 0.30");

    assert_eq!(err.kind(), QuoteErrorKind::NoFeasibleOffer);
    match err {
        QuoteError::NoFeasibleOffer { source, ranked } => {
            assert_eq!(source.below_floor, 3);
            assert_eq!(ranked.len(), 3);
            assert!(ranked.selected().is_none());
        }
        other => panic!("expected no feasible offer, got {other:?}"),
    }
}

#[test]
fn schema_errors_surface_as_invalid_offers() {
    let engine = QuoteEngine::new(
        FeaturePipeline::new(print_schema()),
        Predictor::new(Arc::new(ConstantModel {
            width: 8,
            value: 0.5,
        })),
    );
    let mut offers = scenario_offers();
    offers[2]
        .attributes
        .insert("tier".to_string(), AttributeValue::Number(2.0));

    let err = engine
        .select_best_offer(&rfq(), &offers, &SelectionConstraints::new(0.15))
        .expect_err("tier must be text");

    assert_eq!(err.kind(), QuoteErrorKind::InvalidOffer);
    assert!(matches!(
        err,
        QuoteError::Schema(SchemaError::WrongType { ref supplier_id, .. }) if supplier_id == "C"
    ));
}

#[test]
fn mismatched_model_is_a_system_failure() {
    let engine = QuoteEngine::new(
        FeaturePipeline::new(print_schema()),
        Predictor::new(Arc::new(ConstantModel {
            width: 5,
            value: 0.5,
        })),
    );

    let err = engine
        .select_best_offer(&rfq(), &scenario_offers(), &SelectionConstraints::new(0.15))
        .expect_err("width 8 features against a width 5 model");

    assert_eq!(err.kind(), QuoteErrorKind::SystemFailure);
    assert!(matches!(err, QuoteError::FeatureShape(_)));
}

#[test]
fn invalid_margin_floor_is_a_request_error() {
    let engine = stub_engine(&scenario_probabilities());

    let err = engine
        .select_best_offer(&rfq(), &scenario_offers(), &SelectionConstraints::new(1.2))
        .expect_err("floor above one");

    assert_eq!(err, QuoteError::InvalidMarginFloor(1.2));
    assert_eq!(err.kind(), QuoteErrorKind::InvalidRequest);
}

#[test]
fn fixture_engine_is_deterministic() {
    let engine = QuoteEngine::from_artifact(fixture_artifact()).expect("fixture is valid");
    let offers = vec![
        offer("A", 0.18).with_attribute("tier", AttributeValue::Text("A".to_string())),
        offer("B", 0.26),
        Offer::new("D", 1.62, 0.31, 9)
            .with_attribute("tier", AttributeValue::Text("C".to_string()))
            .with_attribute("on_time_rate", AttributeValue::Number(0.81)),
    ];
    let constraints = SelectionConstraints::new(0.15);

    let first = engine
        .select_best_offer(&rfq(), &offers, &constraints)
        .expect("fixture selects");
    let second = engine
        .select_best_offer(&rfq(), &offers, &constraints)
        .expect("fixture selects");

    assert_eq!(first, second);
    assert_eq!(engine.model_version(), "gbt-win-2025.06");
    assert_eq!(engine.input_width(), 17);
    for row in first.ranked.rows() {
        assert!((0.0..=1.0).contains(&row.p_win));
    }
}
