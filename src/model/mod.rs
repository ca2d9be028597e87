//! Trained probability models.
//!
//! A [`RiskModel`] is the single capability an artifact bundle needs from
//! its model: given an encoded feature vector, return a probability in
//! [0, 1]. Variants cover the artifact types the training pipelines
//! produce — a dense feed-forward network and a logistic regression —
//! dispatched through one enum so the serving engine never branches on
//! model type.

mod logistic;
mod mlp;

pub use logistic::LogisticModel;
pub use mlp::{Activation, DenseLayer, MlpModel};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors evaluating a model. All of these indicate a corrupt or
/// mismatched artifact, never bad caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Input vector width does not match the model's input width.
    #[error("model expects {expected} features, got {got}")]
    FeatureCountMismatch {
        /// Input width the model was trained on.
        expected: usize,
        /// Width of the vector actually supplied.
        got: usize,
    },

    /// A layer's weight matrix does not match its declared shape.
    #[error("layer {layer} is malformed: {detail}")]
    BadLayerShape {
        /// Zero-based layer index.
        layer: usize,
        /// What is wrong with the shape.
        detail: String,
    },

    /// The model has no layers.
    #[error("model has no layers")]
    EmptyModel,

    /// The final layer did not produce a single scalar.
    #[error("final layer produced {got} outputs, expected 1")]
    NotScalarOutput {
        /// Number of outputs actually produced.
        got: usize,
    },
}

/// Numerically plain logistic sigmoid.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A trained binary classifier loaded from an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RiskModel {
    /// Dense feed-forward network with a sigmoid head.
    Mlp(MlpModel),
    /// Logistic regression.
    Logistic(LogisticModel),
}

impl RiskModel {
    /// Input width the model expects.
    pub fn num_features(&self) -> usize {
        match self {
            RiskModel::Mlp(m) => m.num_features(),
            RiskModel::Logistic(m) => m.num_features(),
        }
    }

    /// Evaluate the model on an encoded feature vector.
    ///
    /// Pure function of the input; the result is always in [0, 1].
    pub fn probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        match self {
            RiskModel::Mlp(m) => m.probability(features),
            RiskModel::Logistic(m) => m.probability(features),
        }
    }
}
