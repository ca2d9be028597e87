//! Fitted feature preprocessing: scaling, one-hot encoding, column order.
//!
//! A [`Preprocessor`] turns a raw feature map into the fixed-width numeric
//! vector the model was trained on. Its fitted state (scaler parameters,
//! category vocabularies, and the resulting output column order) serializes
//! as a single artifact; loading never re-fits or re-derives anything.
//!
//! The crux invariant lives here: for one fitted preprocessor, the encoded
//! output has identical width and column order on every call, no matter
//! which subset of known categories a request happens to contain. Numeric
//! fields contribute one column each; categorical fields always contribute
//! one column per fitted category (unseen categories encode as an all-zero
//! indicator row under the default policy).

mod encoder;
mod scaler;

pub use encoder::{OneHotEncoder, UnknownPolicy};
pub use scaler::{Scaler, Scaling};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PredictError;
use crate::schema::{FeatureSchema, FieldKind, FieldValue, RawFeatureMap};

/// Errors fitting or assembling a preprocessor (offline path).
#[derive(Debug, Error)]
pub enum FitError {
    /// No training rows were supplied.
    #[error("cannot fit a preprocessor on zero rows")]
    NoRows,

    /// A training row failed schema validation.
    #[error("training row {row}: {source}")]
    Row {
        /// Zero-based row index.
        row: usize,
        /// The underlying validation failure.
        #[source]
        source: PredictError,
    },

    /// Stage list does not line up with the schema's field list.
    #[error("schema has {fields} fields but {stages} stages were supplied")]
    StageCount {
        /// Number of schema fields.
        fields: usize,
        /// Number of supplied stages.
        stages: usize,
    },

    /// A stage's kind does not match its field's kind.
    #[error("field `{field}` kind does not match its stage")]
    StageKind {
        /// Name of the mismatched field.
        field: String,
    },
}

/// Fitted transform for one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Scaled numeric column.
    Numeric {
        /// The fitted scaler.
        scaler: Scaler,
    },
    /// One-hot expanded categorical columns.
    Categorical {
        /// The fitted encoder.
        encoder: OneHotEncoder,
    },
}

impl Stage {
    fn matches(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Stage::Numeric { .. }, FieldKind::Numeric)
                | (Stage::Categorical { .. }, FieldKind::Categorical)
        )
    }
}

/// A fitted, deterministic raw-map → encoded-vector transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    schema: FeatureSchema,
    stages: Vec<Stage>,
    columns: Vec<String>,
}

impl Preprocessor {
    /// Fit a preprocessor over training rows.
    ///
    /// Numeric fields get a scaler of the requested family; categorical
    /// fields get a one-hot vocabulary in sorted order. The post-expansion
    /// column order is frozen here and reproduced by every
    /// [`transform`](Self::transform).
    pub fn fit(
        schema: FeatureSchema,
        rows: &[RawFeatureMap],
        scaling: Scaling,
    ) -> Result<Self, FitError> {
        if rows.is_empty() {
            return Err(FitError::NoRows);
        }

        let mut validated = Vec::with_capacity(rows.len());
        for (row, raw) in rows.iter().enumerate() {
            let values = schema
                .validate(raw)
                .map_err(|source| FitError::Row { row, source })?;
            validated.push(values);
        }

        let mut stages = Vec::with_capacity(schema.fields.len());
        for (idx, field) in schema.fields.iter().enumerate() {
            match field.kind {
                FieldKind::Numeric => {
                    let column: Vec<f64> = validated
                        .iter()
                        .filter_map(|values| match &values[idx] {
                            FieldValue::Numeric(v) => Some(*v),
                            FieldValue::Category(_) => None,
                        })
                        .collect();
                    stages.push(Stage::Numeric {
                        scaler: Scaler::fit(scaling, &column),
                    });
                }
                FieldKind::Categorical => {
                    let encoder = OneHotEncoder::fit(validated.iter().filter_map(
                        |values| match &values[idx] {
                            FieldValue::Category(c) => Some(c.as_str()),
                            FieldValue::Numeric(_) => None,
                        },
                    ));
                    stages.push(Stage::Categorical { encoder });
                }
            }
        }

        Self::from_stages(schema, stages)
    }

    /// Assemble a preprocessor from already-fitted stages.
    ///
    /// Stages must align one-to-one with the schema's fields; the output
    /// column list is derived from them.
    pub fn from_stages(schema: FeatureSchema, stages: Vec<Stage>) -> Result<Self, FitError> {
        if stages.len() != schema.fields.len() {
            return Err(FitError::StageCount {
                fields: schema.fields.len(),
                stages: stages.len(),
            });
        }
        for (field, stage) in schema.fields.iter().zip(&stages) {
            if !stage.matches(field.kind) {
                return Err(FitError::StageKind {
                    field: field.name.clone(),
                });
            }
        }

        let mut columns = Vec::new();
        for (field, stage) in schema.fields.iter().zip(&stages) {
            match stage {
                Stage::Numeric { .. } => columns.push(field.name.clone()),
                Stage::Categorical { encoder } => {
                    for category in &encoder.categories {
                        columns.push(format!("{}_{}", field.name, category));
                    }
                }
            }
        }

        Ok(Self {
            schema,
            stages,
            columns,
        })
    }

    /// The schema this preprocessor was fitted against.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Fitted post-expansion output column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Encoded vector width.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Transform a raw feature map into the fitted encoded vector.
    ///
    /// Deterministic and side-effect-free. The result always has exactly
    /// [`num_columns`](Self::num_columns) entries in fitted column order;
    /// anything that cannot be reconciled with the fitted column set is a
    /// [`PredictError::SchemaMismatch`].
    pub fn transform(&self, raw: &RawFeatureMap) -> Result<Vec<f64>, PredictError> {
        let values = self.schema.validate(raw)?;

        let mut out = Vec::with_capacity(self.columns.len());
        for ((field, stage), value) in self.schema.fields.iter().zip(&self.stages).zip(&values) {
            match (stage, value) {
                (Stage::Numeric { scaler }, FieldValue::Numeric(v)) => {
                    out.push(scaler.apply(*v));
                }
                (Stage::Categorical { encoder }, FieldValue::Category(category)) => {
                    let start = out.len();
                    out.resize(start + encoder.width(), 0.0);
                    match encoder.position(category) {
                        Some(i) => out[start + i] = 1.0,
                        None => {
                            if encoder.unknown == UnknownPolicy::Error {
                                return Err(PredictError::SchemaMismatch {
                                    detail: format!(
                                        "unknown category `{category}` for field `{}`",
                                        field.name
                                    ),
                                });
                            }
                            // Ignore policy: the all-zero indicator row
                            // written by resize stands.
                        }
                    }
                }
                _ => {
                    return Err(PredictError::SchemaMismatch {
                        detail: format!(
                            "field `{}` does not match the fitted pipeline",
                            field.name
                        ),
                    });
                }
            }
        }

        if out.len() != self.columns.len() {
            log::error!(
                "encoded width {} does not match fitted column count {} for `{}`",
                out.len(),
                self.columns.len(),
                self.schema.disease_key
            );
            return Err(PredictError::SchemaMismatch {
                detail: format!(
                    "encoded width {} does not match fitted column count {}",
                    out.len(),
                    self.columns.len()
                ),
            });
        }

        Ok(out)
    }
}
