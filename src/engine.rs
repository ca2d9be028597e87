//! The prediction engine: validate, transform, score, classify.
//!
//! One engine serves all diseases, dispatching through the bundle's model
//! variant instead of per-model code paths. Prediction is a pure function
//! of the request and the (read-only) registry, so concurrent calls need
//! no synchronization and batches parallelize freely.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::PredictError;
use crate::registry::BundleRegistry;
use crate::schema::RawFeatureMap;

/// Binary risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    /// Probability reached the decision threshold.
    Positive,
    /// Probability fell below the decision threshold.
    Negative,
}

impl RiskLabel {
    /// Whether this is the at-risk label.
    pub fn is_positive(self) -> bool {
        matches!(self, RiskLabel::Positive)
    }
}

/// Outcome of one prediction. Derived per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Disease the prediction is for.
    pub disease: String,
    /// Model probability at full precision. Rounding happens only at the
    /// presentation boundary, never here.
    pub probability: f64,
    /// Classification of `probability` against `threshold`.
    pub label: RiskLabel,
    /// The decision threshold that was applied.
    pub threshold: f64,
}

impl PredictionResult {
    /// Probability as a display percentage, rounded to two decimals.
    pub fn probability_percent(&self) -> f64 {
        (self.probability * 10_000.0).round() / 100.0
    }
}

/// Serves predictions for every disease in its registry.
#[derive(Debug)]
pub struct PredictionEngine {
    registry: BundleRegistry,
}

impl PredictionEngine {
    /// Create an engine over a fully loaded registry.
    pub fn new(registry: BundleRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry (for health/ops surfaces).
    pub fn registry(&self) -> &BundleRegistry {
        &self.registry
    }

    /// Answer one prediction request.
    ///
    /// Flow: resolve the bundle, validate and encode the raw map, evaluate
    /// the model, classify against the stored threshold
    /// (`probability >= threshold` is positive).
    pub fn predict(
        &self,
        disease_key: &str,
        raw: &RawFeatureMap,
    ) -> Result<PredictionResult, PredictError> {
        let bundle = self.registry.lookup(disease_key)?;
        let encoded = bundle.preprocessor().transform(raw)?;
        let probability = bundle.model().probability(&encoded).map_err(|error| {
            log::error!("model evaluation failed for `{disease_key}`: {error}");
            PredictError::Model(error)
        })?;

        let threshold = bundle.threshold();
        let label = if probability >= threshold {
            RiskLabel::Positive
        } else {
            RiskLabel::Negative
        };
        log::debug!(
            "predicted `{disease_key}`: probability {probability:.4}, threshold {threshold:.4}, {label:?}"
        );

        Ok(PredictionResult {
            disease: disease_key.to_owned(),
            probability,
            label,
            threshold,
        })
    }

    /// Answer a batch of requests for one disease in parallel.
    ///
    /// Bundles are read-only after startup, so requests share them without
    /// locking; results keep the input order.
    pub fn predict_batch(
        &self,
        disease_key: &str,
        requests: &[RawFeatureMap],
    ) -> Vec<Result<PredictionResult, PredictError>> {
        requests
            .par_iter()
            .map(|raw| self.predict(disease_key, raw))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ArtifactBundle;
    use crate::model::{LogisticModel, RiskModel};
    use crate::preprocess::{Preprocessor, Scaler, Stage};
    use crate::schema::{FeatureSchema, FieldSpec, RawValue};

    fn engine_with_constant_probability(p: f64, threshold: f64) -> PredictionEngine {
        let schema = FeatureSchema::new("diabetes", vec![FieldSpec::numeric("age")]);
        let preprocessor = Preprocessor::from_stages(
            schema,
            vec![Stage::Numeric {
                scaler: Scaler::MinMax { min: 0.0, max: 100.0 },
            }],
        )
        .unwrap();
        // Zero coefficients make the intercept carry the whole probability.
        let model = RiskModel::Logistic(LogisticModel::new(vec![0.0], (p / (1.0 - p)).ln()));
        let bundle = ArtifactBundle::new(preprocessor, model, threshold).unwrap();
        PredictionEngine::new(BundleRegistry::from_bundles([("diabetes".to_string(), bundle)]))
    }

    fn request(age: f64) -> RawFeatureMap {
        [("age".to_string(), RawValue::Number(age))].into_iter().collect()
    }

    #[test]
    fn probability_at_threshold_is_positive() {
        let engine = engine_with_constant_probability(0.5, 0.5);
        let result = engine.predict("diabetes", &request(40.0)).unwrap();
        assert_eq!(result.label, RiskLabel::Positive);
    }

    #[test]
    fn probability_below_threshold_is_negative() {
        let engine = engine_with_constant_probability(0.3, 0.5);
        let result = engine.predict("diabetes", &request(40.0)).unwrap();
        assert_eq!(result.label, RiskLabel::Negative);
        assert_eq!(result.threshold, 0.5);
    }

    #[test]
    fn percent_rounds_only_at_presentation() {
        let engine = engine_with_constant_probability(0.123456, 0.5);
        let result = engine.predict("diabetes", &request(40.0)).unwrap();
        // Internal probability keeps full precision.
        assert!((result.probability - 0.123456).abs() < 1e-9);
        assert_eq!(result.probability_percent(), 12.35);
    }

    #[test]
    fn batch_preserves_input_order() {
        let engine = engine_with_constant_probability(0.7, 0.5);
        let requests = vec![request(10.0), request(20.0), request(30.0)];
        let results = engine.predict_batch("diabetes", &requests);
        assert_eq!(results.len(), 3);
        for result in results {
            assert_eq!(result.unwrap().label, RiskLabel::Positive);
        }
    }

    #[test]
    fn result_serializes_with_lowercase_label() {
        let engine = engine_with_constant_probability(0.7, 0.5);
        let result = engine.predict("diabetes", &request(40.0)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["label"], "positive");
        assert_eq!(json["disease"], "diabetes");
    }
}
