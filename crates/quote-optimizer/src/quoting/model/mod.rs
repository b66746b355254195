mod artifact;
mod classifier;

pub use artifact::{ModelArtifact, ModelUnavailableError, SUPPORTED_FORMAT_VERSION};
pub use classifier::{Classifier, LogisticModel, RegressionTree, TreeEnsemble, TreeNode};

use std::sync::Arc;

use tracing::warn;

use super::features::FeatureMatrix;

/// Trained win-probability model. Loaded once, then shared read-only across requests.
pub trait WinProbabilityModel: Send + Sync {
    /// Number of features each row must carry.
    fn input_width(&self) -> usize;
    /// Probability that the offer described by `features` wins.
    fn win_probability(&self, features: &[f64]) -> f64;
    fn version(&self) -> &str {
        "unversioned"
    }
}

/// The feature matrix does not match what the model was trained on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("feature shape mismatch: model expects {expected} columns, got {actual} (row {row:?})")]
pub struct FeatureShapeError {
    pub expected: usize,
    pub actual: usize,
    /// `None` when the matrix as a whole declares the wrong width.
    pub row: Option<usize>,
}

/// Cheap-to-clone handle over the process-wide model.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn WinProbabilityModel>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("model_version", &self.model.version())
            .field("input_width", &self.model.input_width())
            .finish()
    }
}

impl Predictor {
    pub fn new(model: Arc<dyn WinProbabilityModel>) -> Self {
        Self { model }
    }

    pub fn input_width(&self) -> usize {
        self.model.input_width()
    }

    pub fn model_version(&self) -> &str {
        self.model.version()
    }

    /// One probability per row, clamped to `[0, 1]`.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, FeatureShapeError> {
        let expected = self.model.input_width();
        if features.width() != expected {
            return Err(FeatureShapeError {
                expected,
                actual: features.width(),
                row: None,
            });
        }

        features
            .rows()
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                if row.len() != expected {
                    return Err(FeatureShapeError {
                        expected,
                        actual: row.len(),
                        row: Some(idx),
                    });
                }
                let raw = self.model.win_probability(row.as_slice());
                if !raw.is_finite() {
                    warn!(row = idx, "model returned a non-finite probability; using 0");
                    return Ok(0.0);
                }
                Ok(raw.clamp(0.0, 1.0))
            })
            .collect()
    }
}
