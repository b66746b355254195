use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::super::features::{FeaturePipeline, FeatureSchema};
use super::classifier::{sigmoid, Classifier};
use super::{Predictor, WinProbabilityModel};

pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Raised when the trained model cannot be brought online. Fatal at startup, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ModelUnavailableError {
    #[error("model artifact {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {origin} is not valid JSON: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact {origin} uses format version {found}, expected {expected}")]
    UnsupportedFormat {
        origin: String,
        found: u32,
        expected: u32,
    },
    #[error("model artifact {origin} is inconsistent: {reason}")]
    Inconsistent { origin: String, reason: String },
}

/// Versioned training export: fitted preprocessing parameters plus the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_version: String,
    pub features: FeatureSchema,
    pub classifier: Classifier,
}

impl ModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelUnavailableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelUnavailableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = Self::from_reader(BufReader::new(file), path.display().to_string())?;
        info!(
            path = %path.display(),
            model_version = %artifact.model_version,
            input_width = artifact.features.width(),
            "win-probability model loaded"
        );
        Ok(artifact)
    }

    /// `origin` only labels errors (a path, or e.g. `"inline"`).
    pub fn from_reader<R: Read>(
        reader: R,
        origin: impl Into<String>,
    ) -> Result<Self, ModelUnavailableError> {
        let origin = origin.into();
        let artifact: ModelArtifact = match serde_json::from_reader(reader) {
            Ok(artifact) => artifact,
            Err(source) => return Err(ModelUnavailableError::Malformed { origin, source }),
        };
        artifact.validate(&origin)?;
        Ok(artifact)
    }

    fn validate(&self, origin: &str) -> Result<(), ModelUnavailableError> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ModelUnavailableError::UnsupportedFormat {
                origin: origin.to_string(),
                found: self.format_version,
                expected: SUPPORTED_FORMAT_VERSION,
            });
        }

        let inconsistent = |reason: String| ModelUnavailableError::Inconsistent {
            origin: origin.to_string(),
            reason,
        };
        self.features.validate().map_err(inconsistent)?;
        self.classifier
            .validate(self.features.width())
            .map_err(inconsistent)
    }

    /// Splits the artifact into the pipeline and the shared predictor built from it.
    ///
    /// Re-validates first, since an artifact built in memory never went through `from_reader`.
    pub fn into_parts(self) -> Result<(FeaturePipeline, Predictor), ModelUnavailableError> {
        self.validate(&format!("in-memory artifact {}", self.model_version))?;

        let model = ArtifactModel {
            input_width: self.features.width(),
            model_version: self.model_version,
            classifier: self.classifier,
        };
        Ok((
            FeaturePipeline::new(self.features),
            Predictor::new(Arc::new(model)),
        ))
    }
}

/// Classifier loaded from an artifact, checked against its schema width.
#[derive(Debug)]
struct ArtifactModel {
    input_width: usize,
    model_version: String,
    classifier: Classifier,
}

impl WinProbabilityModel for ArtifactModel {
    fn input_width(&self) -> usize {
        self.input_width
    }

    fn win_probability(&self, features: &[f64]) -> f64 {
        sigmoid(self.classifier.margin(features))
    }

    fn version(&self) -> &str {
        &self.model_version
    }
}
