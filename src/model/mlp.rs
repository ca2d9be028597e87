//! Dense feed-forward network loaded from a trained-model artifact.
//!
//! The offline trainer exports each dense layer's weights, bias, and
//! activation; inference is a pure matrix-vector chain. Shapes are checked
//! at every layer so a corrupt artifact fails with a typed error instead
//! of producing garbage.

use serde::{Deserialize, Serialize};

use super::{sigmoid, ModelError};

/// Activation applied after a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// `max(0, x)`.
    Relu,
    /// Logistic sigmoid.
    Sigmoid,
    /// Pass-through.
    Identity,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => sigmoid(x),
            Activation::Identity => x,
        }
    }
}

/// One dense layer: `activation(W · x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Flat weight matrix, row-major `[outputs][inputs]`.
    pub weights: Vec<f64>,
    /// Per-output bias (its length defines the layer's output width).
    pub bias: Vec<f64>,
    /// Activation function.
    pub activation: Activation,
}

impl DenseLayer {
    /// Output width of this layer.
    pub fn outputs(&self) -> usize {
        self.bias.len()
    }

    /// Input width of this layer, derived from the weight matrix shape.
    pub fn inputs(&self) -> usize {
        if self.bias.is_empty() {
            0
        } else {
            self.weights.len() / self.bias.len()
        }
    }

    fn forward(&self, layer: usize, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        let outputs = self.outputs();
        if outputs == 0 {
            return Err(ModelError::BadLayerShape {
                layer,
                detail: "empty bias".into(),
            });
        }
        if self.weights.len() != outputs * input.len() {
            return Err(ModelError::BadLayerShape {
                layer,
                detail: format!(
                    "weight matrix has {} entries, expected {} ({} outputs x {} inputs)",
                    self.weights.len(),
                    outputs * input.len(),
                    outputs,
                    input.len()
                ),
            });
        }

        let mut out = Vec::with_capacity(outputs);
        for (row, &b) in self.bias.iter().enumerate() {
            let z = self.weights[row * input.len()..(row + 1) * input.len()]
                .iter()
                .zip(input)
                .map(|(w, x)| w * x)
                .sum::<f64>()
                + b;
            out.push(self.activation.apply(z));
        }
        Ok(out)
    }
}

/// Dense feed-forward network with a single-probability head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpModel {
    /// Layers in forward order.
    pub layers: Vec<DenseLayer>,
}

impl MlpModel {
    /// Create a network from layers in forward order.
    pub fn new(layers: Vec<DenseLayer>) -> Self {
        Self { layers }
    }

    /// Input width the network expects.
    pub fn num_features(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::inputs)
    }

    /// Positive-class probability for an encoded feature vector.
    pub fn probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::EmptyModel);
        }
        if features.len() != self.num_features() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.num_features(),
                got: features.len(),
            });
        }

        let mut current = features.to_vec();
        for (i, layer) in self.layers.iter().enumerate() {
            current = layer.forward(i, &current)?;
        }

        if current.len() != 1 {
            return Err(ModelError::NotScalarOutput { got: current.len() });
        }
        Ok(current[0].clamp(0.0, 1.0))
    }
}
