use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::domain::{Offer, Rfq, ScoredOffer};
use super::features::{FeaturePipeline, SchemaError};
use super::model::{FeatureShapeError, ModelArtifact, ModelUnavailableError, Predictor};
use super::optimizer::{self, NoFeasibleOfferError, SelectionConstraints, SelectionError};
use super::ranking::{self, RankedTable};

/// Facade running features, prediction, selection and ranking for one RFQ at a time.
///
/// Holds only immutable fitted state, so one engine can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct QuoteEngine {
    pipeline: FeaturePipeline,
    predictor: Predictor,
}

/// Selected offer plus the full ranking shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteDecision {
    pub model_version: String,
    pub margin_floor: f64,
    pub selected: ScoredOffer,
    pub ranked: RankedTable,
}

impl QuoteEngine {
    pub fn new(pipeline: FeaturePipeline, predictor: Predictor) -> Self {
        Self {
            pipeline,
            predictor,
        }
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelUnavailableError> {
        let (pipeline, predictor) = artifact.into_parts()?;
        Ok(Self::new(pipeline, predictor))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelUnavailableError> {
        ModelArtifact::load(path).and_then(Self::from_artifact)
    }

    pub fn model_version(&self) -> &str {
        self.predictor.model_version()
    }

    pub fn input_width(&self) -> usize {
        self.predictor.input_width()
    }

    /// Win probability and expected value for every offer, in input order.
    pub fn score(&self, rfq: &Rfq, offers: &[Offer]) -> Result<Vec<ScoredOffer>, QuoteError> {
        let features = self.pipeline.transform(rfq, offers)?;
        debug!(
            client_id = %rfq.client_id,
            offers = offers.len(),
            width = features.width(),
            "offer features prepared"
        );

        let probabilities = self.predictor.predict(&features)?;
        Ok(offers
            .iter()
            .cloned()
            .zip(probabilities)
            .map(|(offer, p_win)| ScoredOffer::new(offer, p_win))
            .collect())
    }

    pub fn select_best_offer(
        &self,
        rfq: &Rfq,
        offers: &[Offer],
        constraints: &SelectionConstraints,
    ) -> Result<QuoteDecision, QuoteError> {
        let scored = self.score(rfq, offers)?;

        match optimizer::select(&scored, constraints) {
            Ok(selection) => {
                let ranked = ranking::format(&scored, Some(&selection));
                info!(
                    client_id = %rfq.client_id,
                    supplier_id = %selection.offer.supplier_id(),
                    p_win = selection.offer.p_win(),
                    objective = selection.offer.objective_value(),
                    margin_floor = constraints.margin_floor,
                    "offer selected"
                );
                Ok(QuoteDecision {
                    model_version: self.model_version().to_string(),
                    margin_floor: constraints.margin_floor,
                    selected: selection.offer,
                    ranked,
                })
            }
            Err(SelectionError::NoFeasibleOffer(source)) => {
                info!(
                    client_id = %rfq.client_id,
                    margin_floor = constraints.margin_floor,
                    offers = offers.len(),
                    "no offer clears the constraints"
                );
                Err(QuoteError::NoFeasibleOffer {
                    source,
                    ranked: ranking::format(&scored, None),
                })
            }
            Err(SelectionError::InvalidMarginFloor(floor)) => {
                Err(QuoteError::InvalidMarginFloor(floor))
            }
        }
    }
}

/// Error raised while quoting one RFQ.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuoteError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    FeatureShape(#[from] FeatureShapeError),
    #[error("margin floor {0} must be a fraction between 0 and 1")]
    InvalidMarginFloor(f64),
    /// Carries the unselected ranking so callers can still show what was scored.
    #[error("{source}")]
    NoFeasibleOffer {
        source: NoFeasibleOfferError,
        ranked: RankedTable,
    },
}

/// Coarse classification presentation layers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteErrorKind {
    /// Actionable: lower the floor or request more offers.
    NoFeasibleOffer,
    InvalidOffer,
    InvalidRequest,
    /// Pipeline and model disagree; not something the caller can fix.
    SystemFailure,
}

impl QuoteError {
    pub fn kind(&self) -> QuoteErrorKind {
        match self {
            QuoteError::NoFeasibleOffer { .. } => QuoteErrorKind::NoFeasibleOffer,
            QuoteError::Schema(_) => QuoteErrorKind::InvalidOffer,
            QuoteError::InvalidMarginFloor(_) => QuoteErrorKind::InvalidRequest,
            QuoteError::FeatureShape(_) => QuoteErrorKind::SystemFailure,
        }
    }
}
