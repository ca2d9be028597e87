//! riskserve: inference-serving core for multi-disease risk prediction.
//!
//! This crate provides the serving side of a risk-prediction service: it
//! loads per-disease artifact bundles (fitted preprocessor + trained model +
//! calibrated decision threshold) and answers prediction requests against
//! them, plus the F1-optimal threshold search used at training time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use riskserve::{BundleRegistry, PredictionEngine, ServiceConfig};
//!
//! let config = ServiceConfig::default_diseases();
//! let (registry, warnings) = BundleRegistry::load_all("artifacts".as_ref(), &config);
//! for w in &warnings {
//!     eprintln!("disabled {}: {}", w.disease, w.error);
//! }
//!
//! let engine = PredictionEngine::new(registry);
//! # let raw = riskserve::RawFeatureMap::new();
//! let result = engine.predict("diabetes", &raw)?;
//! println!("{}: {:.2}%", result.disease, result.probability_percent());
//! # Ok::<(), riskserve::PredictError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Raw feature map → FeatureSchema validation → Preprocessor → model → threshold → result
//! ```
//!
//! The registry is built once at startup and is read-only afterwards, so
//! concurrent predictions share bundles without locking.

pub mod bundle;
pub mod calibrate;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod registry;
pub mod schema;

pub use bundle::{ArtifactBundle, ArtifactError, ArtifactPresence};
pub use config::ServiceConfig;
pub use engine::{PredictionEngine, PredictionResult, RiskLabel};
pub use error::PredictError;
pub use model::RiskModel;
pub use preprocess::Preprocessor;
pub use registry::{BundleRegistry, LoadWarning};
pub use schema::{FeatureSchema, FieldKind, RawFeatureMap, RawValue};
