//! End-to-end prediction tests: artifacts on disk → registry → engine.
//!
//! These tests persist real bundle artifacts to a temporary directory,
//! load them through `BundleRegistry::load_all`, and drive the engine the
//! way the transport layer would.

use approx::assert_abs_diff_eq;

use riskserve::bundle::ArtifactBundle;
use riskserve::model::{LogisticModel, RiskModel};
use riskserve::preprocess::{Preprocessor, Scaler, Scaling, Stage};
use riskserve::schema::{FeatureSchema, FieldSpec, RawFeatureMap, RawValue};
use riskserve::{BundleRegistry, PredictError, PredictionEngine, RiskLabel, ServiceConfig};

// =============================================================================
// Fixtures
// =============================================================================

fn diabetes_schema() -> FeatureSchema {
    FeatureSchema::new(
        "diabetes",
        vec![
            FieldSpec::numeric("age"),
            FieldSpec::numeric("bmi"),
            FieldSpec::numeric("hba1c"),
            FieldSpec::numeric("glucose"),
        ],
    )
}

/// A diabetes bundle whose model always returns the given probability
/// (zero coefficients, intercept = logit of the target).
fn diabetes_bundle(probability: f64, threshold: f64) -> ArtifactBundle {
    let stages = vec![
        Stage::Numeric {
            scaler: Scaler::MinMax { min: 0.0, max: 100.0 },
        },
        Stage::Numeric {
            scaler: Scaler::MinMax { min: 10.0, max: 50.0 },
        },
        Stage::Numeric {
            scaler: Scaler::MinMax { min: 3.0, max: 9.0 },
        },
        Stage::Numeric {
            scaler: Scaler::MinMax { min: 50.0, max: 300.0 },
        },
    ];
    let preprocessor = Preprocessor::from_stages(diabetes_schema(), stages).unwrap();
    let model = RiskModel::Logistic(LogisticModel::new(
        vec![0.0; 4],
        (probability / (1.0 - probability)).ln(),
    ));
    ArtifactBundle::new(preprocessor, model, threshold).unwrap()
}

fn diabetes_request() -> RawFeatureMap {
    [
        ("age", RawValue::Number(45.0)),
        ("bmi", RawValue::Number(27.3)),
        ("hba1c", RawValue::Number(6.1)),
        ("glucose", RawValue::Number(140.0)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn config() -> ServiceConfig {
    ServiceConfig {
        diseases: vec![
            diabetes_schema(),
            FeatureSchema::new("stroke", vec![FieldSpec::numeric("age")]),
        ],
    }
}

/// Persist the diabetes bundle, load everything back through the registry,
/// and wrap it in an engine. Stroke has no artifacts, so it must come back
/// as a warning.
fn engine_from_disk(probability: f64, threshold: f64) -> PredictionEngine {
    let dir = tempfile::tempdir().unwrap();
    diabetes_bundle(probability, threshold)
        .save(&dir.path().join("diabetes"))
        .unwrap();

    let (registry, warnings) = BundleRegistry::load_all(dir.path(), &config());
    assert_eq!(registry.len(), 1);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].disease, "stroke");

    PredictionEngine::new(registry)
}

// =============================================================================
// Happy path
// =============================================================================

#[test]
fn loaded_bundle_predicts_positive_above_threshold() {
    let engine = engine_from_disk(0.82, 0.5);
    let result = engine.predict("diabetes", &diabetes_request()).unwrap();

    assert_eq!(result.disease, "diabetes");
    assert_eq!(result.label, RiskLabel::Positive);
    assert_eq!(result.threshold, 0.5);
    assert_abs_diff_eq!(result.probability, 0.82, epsilon = 1e-12);
    assert_abs_diff_eq!(result.probability_percent(), 82.0, epsilon = 1e-9);
}

#[test]
fn repeated_requests_are_bit_identical() {
    let engine = engine_from_disk(0.82, 0.5);
    let request = diabetes_request();
    let first = engine.predict("diabetes", &request).unwrap();
    let second = engine.predict("diabetes", &request).unwrap();
    assert_eq!(first.probability.to_bits(), second.probability.to_bits());
}

#[test]
fn numeric_strings_are_accepted() {
    let engine = engine_from_disk(0.82, 0.5);
    let mut request = diabetes_request();
    request.insert("age".into(), RawValue::Text("45".into()));
    let result = engine.predict("diabetes", &request).unwrap();
    assert_eq!(result.label, RiskLabel::Positive);
}

// =============================================================================
// Caller errors
// =============================================================================

#[test]
fn missing_field_names_exactly_the_absent_field() {
    let engine = engine_from_disk(0.82, 0.5);
    let mut request = diabetes_request();
    request.remove("hba1c");

    let err = engine.predict("diabetes", &request).unwrap_err();
    match &err {
        PredictError::MissingFields(names) => assert_eq!(names, &vec!["hba1c".to_string()]),
        other => panic!("expected MissingFields, got {other:?}"),
    }
    assert!(err.is_caller_error());
}

#[test]
fn every_missing_field_is_reported_at_once() {
    let engine = engine_from_disk(0.82, 0.5);
    let mut request = diabetes_request();
    request.remove("bmi");
    request.remove("glucose");

    let err = engine.predict("diabetes", &request).unwrap_err();
    match err {
        PredictError::MissingFields(names) => {
            assert_eq!(names, vec!["bmi".to_string(), "glucose".to_string()]);
        }
        other => panic!("expected MissingFields, got {other:?}"),
    }
}

#[test]
fn non_numeric_value_names_the_offending_field() {
    let engine = engine_from_disk(0.82, 0.5);
    let mut request = diabetes_request();
    request.insert("age".into(), RawValue::Text("forty-five".into()));

    let err = engine.predict("diabetes", &request).unwrap_err();
    match &err {
        PredictError::InvalidValue { field, .. } => assert_eq!(field, "age"),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
    assert!(err.is_caller_error());
}

#[test]
fn unknown_disease_is_rejected_before_any_model_work() {
    let engine = engine_from_disk(0.82, 0.5);
    let err = engine.predict("gout", &diabetes_request()).unwrap_err();
    assert!(matches!(err, PredictError::UnknownDisease(key) if key == "gout"));
}

#[test]
fn disabled_disease_is_unknown_to_callers() {
    // Stroke's artifacts never existed, so it was disabled at startup.
    let engine = engine_from_disk(0.82, 0.5);
    let request: RawFeatureMap =
        [("age".to_string(), RawValue::Number(60.0))].into_iter().collect();
    let err = engine.predict("stroke", &request).unwrap_err();
    assert!(matches!(err, PredictError::UnknownDisease(_)));
}

// =============================================================================
// Threshold semantics
// =============================================================================

#[test]
fn probability_equal_to_threshold_classifies_positive() {
    let engine = engine_from_disk(0.5, 0.5);
    let result = engine.predict("diabetes", &diabetes_request()).unwrap();
    assert_eq!(result.label, RiskLabel::Positive);
}

#[test]
fn calibrated_threshold_from_artifact_is_applied() {
    let engine = engine_from_disk(0.6, 0.62);
    let result = engine.predict("diabetes", &diabetes_request()).unwrap();
    assert_eq!(result.threshold, 0.62);
    assert_eq!(result.label, RiskLabel::Negative);
}

// =============================================================================
// Categorical round trip through disk
// =============================================================================

#[test]
fn fitted_categorical_bundle_round_trips_with_stable_width() {
    let schema = FeatureSchema::new(
        "stroke",
        vec![
            FieldSpec::numeric("age"),
            FieldSpec::categorical("smoking_status"),
        ],
    );
    let rows: Vec<RawFeatureMap> = [
        (55.0, "never smoked"),
        (63.0, "smokes"),
        (71.0, "formerly smoked"),
    ]
    .iter()
    .map(|(age, smoking)| {
        [
            ("age".to_string(), RawValue::Number(*age)),
            ("smoking_status".to_string(), RawValue::Text((*smoking).into())),
        ]
        .into_iter()
        .collect()
    })
    .collect();

    let preprocessor = Preprocessor::fit(schema, &rows, Scaling::Standard).unwrap();
    let width = preprocessor.num_columns();
    let model = RiskModel::Logistic(LogisticModel::new(vec![0.1; width], -1.0));
    let bundle = ArtifactBundle::new(preprocessor, model, 0.5).unwrap();

    let dir = tempfile::tempdir().unwrap();
    bundle.save(&dir.path().join("stroke")).unwrap();
    let loaded = ArtifactBundle::load("stroke", &dir.path().join("stroke")).unwrap();

    // Known, different, and unknown categories all encode to the same width.
    for smoking in ["never smoked", "smokes", "vapes"] {
        let request: RawFeatureMap = [
            ("age".to_string(), RawValue::Number(60.0)),
            ("smoking_status".to_string(), RawValue::Text(smoking.into())),
        ]
        .into_iter()
        .collect();
        let encoded = loaded.preprocessor().transform(&request).unwrap();
        assert_eq!(encoded.len(), width);
    }
}
