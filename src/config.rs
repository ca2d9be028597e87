//! Disease configuration: the single authoritative schema per disease.
//!
//! The set of supported disease keys and each disease's ordered field list
//! must be defined once and shared identically between the training
//! pipeline (which fits preprocessors against this exact order) and the
//! serving engine (which validates against the same order). A mismatch
//! between the two is the most consequential bug class this system guards
//! against, so the schemas live here and nowhere else.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{FeatureSchema, FieldSpec};

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem failure reading the file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The configuration path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// The configuration path involved.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Two schemas claim the same disease key.
    #[error("duplicate disease key: {0}")]
    DuplicateDisease(String),
}

/// The set of diseases the service supports and their schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// One schema per supported disease.
    pub diseases: Vec<FeatureSchema>,
}

impl ServiceConfig {
    /// Load a configuration from a JSON file, rejecting duplicate keys.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.check_unique_keys()?;
        Ok(config)
    }

    fn check_unique_keys(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::BTreeSet::new();
        for schema in &self.diseases {
            if !seen.insert(schema.disease_key.as_str()) {
                return Err(ConfigError::DuplicateDisease(schema.disease_key.clone()));
            }
        }
        Ok(())
    }

    /// The schema for a disease key, if configured.
    pub fn schema(&self, disease_key: &str) -> Option<&FeatureSchema> {
        self.diseases.iter().find(|s| s.disease_key == disease_key)
    }

    /// The built-in canonical schemas for the four supported diseases.
    ///
    /// Field order here is the one authoritative ordering; training fits
    /// against it and serving validates against it.
    pub fn default_diseases() -> Self {
        Self {
            diseases: vec![diabetes(), heart(), stroke(), pcos()],
        }
    }
}

fn diabetes() -> FeatureSchema {
    FeatureSchema::new(
        "diabetes",
        vec![
            FieldSpec::categorical("gender"),
            FieldSpec::numeric("age"),
            FieldSpec::numeric("hypertension"),
            FieldSpec::numeric("heart_disease"),
            FieldSpec::categorical("smoking_history"),
            FieldSpec::numeric("bmi"),
            FieldSpec::numeric("hba1c"),
            FieldSpec::numeric("glucose"),
        ],
    )
}

fn heart() -> FeatureSchema {
    // UCI heart-disease encoding: categoricals arrive pre-encoded as small
    // integers, so every field is numeric.
    FeatureSchema::new(
        "heart",
        vec![
            FieldSpec::numeric("age"),
            FieldSpec::numeric("sex"),
            FieldSpec::numeric("cp"),
            FieldSpec::numeric("trestbps"),
            FieldSpec::numeric("chol"),
            FieldSpec::numeric("fbs"),
            FieldSpec::numeric("restecg"),
            FieldSpec::numeric("thalach"),
            FieldSpec::numeric("exang"),
            FieldSpec::numeric("oldpeak"),
            FieldSpec::numeric("slope"),
            FieldSpec::numeric("ca"),
            FieldSpec::numeric("thal"),
        ],
    )
}

fn stroke() -> FeatureSchema {
    FeatureSchema::new(
        "stroke",
        vec![
            FieldSpec::categorical("gender"),
            FieldSpec::numeric("age"),
            FieldSpec::numeric("hypertension"),
            FieldSpec::numeric("heart_disease"),
            FieldSpec::categorical("ever_married"),
            FieldSpec::categorical("work_type"),
            FieldSpec::categorical("residence_type"),
            FieldSpec::numeric("avg_glucose_level"),
            FieldSpec::numeric("bmi"),
            FieldSpec::categorical("smoking_status"),
        ],
    )
}

fn pcos() -> FeatureSchema {
    FeatureSchema::new(
        "pcos",
        vec![
            FieldSpec::numeric("age_yrs"),
            FieldSpec::numeric("bmi"),
            FieldSpec::numeric("amh_ng_ml"),
            FieldSpec::numeric("lh_miu_ml"),
            FieldSpec::numeric("fsh_miu_ml"),
            FieldSpec::numeric("fsh_lh_ratio"),
            FieldSpec::numeric("cycle_length_days"),
            FieldSpec::numeric("cycle_regularity"),
            FieldSpec::numeric("weight_gain"),
            FieldSpec::numeric("hair_growth"),
            FieldSpec::numeric("skin_darkening"),
            FieldSpec::numeric("hair_loss"),
            FieldSpec::numeric("pimples"),
            FieldSpec::numeric("follicle_no_left"),
            FieldSpec::numeric("follicle_no_right"),
            FieldSpec::numeric("avg_f_size_left_mm"),
            FieldSpec::numeric("avg_f_size_right_mm"),
            FieldSpec::numeric("tsh_miu_l"),
            FieldSpec::numeric("endometrium_mm"),
            FieldSpec::numeric("prl_ng_ml"),
        ],
    )
}
