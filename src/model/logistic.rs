//! Logistic regression loaded from a calibrated-model artifact.

use serde::{Deserialize, Serialize};

use super::{sigmoid, ModelError};

/// Logistic regression: `sigmoid(w · x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Per-feature coefficients, aligned with the encoded column order.
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
}

impl LogisticModel {
    /// Create a model from coefficients and an intercept.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Input width (number of coefficients).
    pub fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Positive-class probability for an encoded feature vector.
    pub fn probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.coefficients.len(),
                got: features.len(),
            });
        }

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Ok(sigmoid(z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn probability_matches_hand_computed_sigmoid() {
        let model = LogisticModel::new(vec![1.0, -2.0], 0.5);
        let p = model.probability(&[2.0, 0.25]).unwrap();
        // z = 0.5 + 2.0 - 0.5 = 2.0
        assert_abs_diff_eq!(p, sigmoid(2.0), epsilon = 1e-15);
    }

    #[test]
    fn zero_coefficients_yield_intercept_probability() {
        let target = 0.82f64;
        let model = LogisticModel::new(vec![0.0; 4], (target / (1.0 - target)).ln());
        let p = model.probability(&[9.0, -3.0, 0.0, 100.0]).unwrap();
        assert_abs_diff_eq!(p, target, epsilon = 1e-12);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let model = LogisticModel::new(vec![1.0, 1.0], 0.0);
        let err = model.probability(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::FeatureCountMismatch {
                expected: 2,
                got: 1
            }
        );
    }
}
