//! Artifact bundles: the {preprocessor, model, threshold} triple.
//!
//! A bundle is created once by the training pipeline, persisted as three
//! JSON artifacts under a per-disease directory, and loaded read-only by
//! the serving process. It is never mutated after load, which is what lets
//! concurrent requests share one bundle without locking.
//!
//! Layout under the artifact root:
//!
//! ```text
//! <root>/<disease_key>/preprocessor.json
//! <root>/<disease_key>/model.json
//! <root>/<disease_key>/threshold.json   (optional; absent means 0.5)
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::RiskModel;
use crate::preprocess::Preprocessor;

/// File name of the preprocessor artifact.
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
/// File name of the model artifact.
pub const MODEL_FILE: &str = "model.json";
/// File name of the threshold artifact.
pub const THRESHOLD_FILE: &str = "threshold.json";
/// Decision threshold assumed when no calibrated threshold artifact exists.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Errors loading or saving a bundle's artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Filesystem failure reading or writing an artifact.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The artifact path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An artifact exists but is not valid JSON for its expected shape.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// The artifact path involved.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A required artifact file is absent.
    #[error("missing artifact for `{disease}`: {path}")]
    MissingArtifact {
        /// Disease whose bundle is incomplete.
        disease: String,
        /// The absent path.
        path: PathBuf,
    },

    /// The stored threshold is outside [0, 1].
    #[error("threshold for `{disease}` is {value}, expected a value in [0, 1]")]
    InvalidThreshold {
        /// Disease whose threshold is invalid.
        disease: String,
        /// The rejected value.
        value: f64,
    },

    /// The preprocessor artifact was fitted for a different disease than
    /// the directory it was found under.
    #[error("artifact for `{disease}` was fitted for `{found}`")]
    DiseaseKeyMismatch {
        /// Disease the directory belongs to.
        disease: String,
        /// Disease key stored inside the preprocessor artifact.
        found: String,
    },

    /// Preprocessor output width and model input width disagree. This is
    /// the schema-drift bug class the load-time check exists to catch.
    #[error(
        "feature width mismatch for `{disease}`: preprocessor emits {preprocessor} columns, model expects {model}"
    )]
    FeatureWidthMismatch {
        /// Disease whose artifacts disagree.
        disease: String,
        /// Preprocessor output width.
        preprocessor: usize,
        /// Model input width.
        model: usize,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct ThresholdArtifact {
    threshold: f64,
}

/// Which of a disease's artifact files are present on disk.
///
/// This is the typed availability check training pipelines use to decide
/// train-vs-skip, instead of ad hoc file-existence branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactPresence {
    /// `preprocessor.json` exists.
    pub preprocessor: bool,
    /// `model.json` exists.
    pub model: bool,
    /// `threshold.json` exists.
    pub threshold: bool,
}

impl ArtifactPresence {
    /// All three artifacts exist.
    pub fn is_complete(self) -> bool {
        self.preprocessor && self.model && self.threshold
    }

    /// The disease can be served (threshold is optional and defaults).
    pub fn is_servable(self) -> bool {
        self.preprocessor && self.model
    }
}

/// An immutable trained bundle for one disease.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    preprocessor: Preprocessor,
    model: RiskModel,
    threshold: f64,
}

impl ArtifactBundle {
    /// Assemble a bundle, enforcing the cross-artifact invariants: the
    /// threshold is in [0, 1] and the preprocessor's output width matches
    /// the model's input width.
    pub fn new(
        preprocessor: Preprocessor,
        model: RiskModel,
        threshold: f64,
    ) -> Result<Self, ArtifactError> {
        let disease = preprocessor.schema().disease_key.clone();
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::InvalidThreshold {
                disease,
                value: threshold,
            });
        }
        if preprocessor.num_columns() != model.num_features() {
            return Err(ArtifactError::FeatureWidthMismatch {
                disease,
                preprocessor: preprocessor.num_columns(),
                model: model.num_features(),
            });
        }
        Ok(Self {
            preprocessor,
            model,
            threshold,
        })
    }

    /// The fitted preprocessor.
    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// The trained model.
    pub fn model(&self) -> &RiskModel {
        &self.model
    }

    /// The calibrated decision threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Which artifact files exist under a bundle directory.
    pub fn probe(dir: &Path) -> ArtifactPresence {
        ArtifactPresence {
            preprocessor: dir.join(PREPROCESSOR_FILE).is_file(),
            model: dir.join(MODEL_FILE).is_file(),
            threshold: dir.join(THRESHOLD_FILE).is_file(),
        }
    }

    /// Load a disease's bundle from its artifact directory.
    ///
    /// A missing threshold artifact falls back to [`DEFAULT_THRESHOLD`];
    /// missing preprocessor or model artifacts are errors.
    pub fn load(disease: &str, dir: &Path) -> Result<Self, ArtifactError> {
        let preprocessor: Preprocessor = read_json(disease, dir.join(PREPROCESSOR_FILE))?;
        if preprocessor.schema().disease_key != disease {
            return Err(ArtifactError::DiseaseKeyMismatch {
                disease: disease.to_owned(),
                found: preprocessor.schema().disease_key.clone(),
            });
        }

        let model: RiskModel = read_json(disease, dir.join(MODEL_FILE))?;

        let threshold_path = dir.join(THRESHOLD_FILE);
        let threshold = if threshold_path.is_file() {
            read_json::<ThresholdArtifact>(disease, threshold_path)?.threshold
        } else {
            log::debug!("no threshold artifact for `{disease}`, using {DEFAULT_THRESHOLD}");
            DEFAULT_THRESHOLD
        };

        Self::new(preprocessor, model, threshold)
    }

    /// Persist the bundle's three artifacts under a directory
    /// (offline-pipeline convenience).
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        std::fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        write_json(&self.preprocessor, dir.join(PREPROCESSOR_FILE))?;
        write_json(&self.model, dir.join(MODEL_FILE))?;
        write_json(
            &ThresholdArtifact {
                threshold: self.threshold,
            },
            dir.join(THRESHOLD_FILE),
        )?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(disease: &str, path: PathBuf) -> Result<T, ArtifactError> {
    let file = File::open(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::MissingArtifact {
                disease: disease.to_owned(),
                path: path.clone(),
            }
        } else {
            ArtifactError::Io {
                path: path.clone(),
                source,
            }
        }
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| ArtifactError::Json { path, source })
}

fn write_json<T: Serialize>(value: &T, path: PathBuf) -> Result<(), ArtifactError> {
    let file = File::create(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|source| ArtifactError::Json { path, source })
}
