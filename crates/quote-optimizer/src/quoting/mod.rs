//! Offer scoring and selection for incoming RFQs.
//!
//! Requests flow through the feature pipeline, the win-probability predictor, the
//! margin-constrained optimizer and finally the ranking formatter. Only the fitted model is
//! shared between requests; everything else lives for a single call.

pub mod domain;
pub mod features;
pub mod model;
pub mod optimizer;
pub mod ranking;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{AttributeValue, Offer, ProductType, Rfq, ScoredOffer};
pub use features::{FeatureMatrix, FeaturePipeline, FeatureSchema, FeatureVector, SchemaError};
pub use model::{
    FeatureShapeError, ModelArtifact, ModelUnavailableError, Predictor, WinProbabilityModel,
};
pub use optimizer::{
    select, DeliveryWindow, NoFeasibleOfferError, Selection, SelectionConstraints, SelectionError,
};
pub use ranking::{RankedRow, RankedTable};
pub use router::{quote_router, QuoteRequest};
pub use service::{QuoteDecision, QuoteEngine, QuoteError, QuoteErrorKind};
