//! Request-level error taxonomy.
//!
//! Errors split into two classes: caller errors (bad or incomplete input,
//! fixable by resubmitting a corrected request) and internal errors
//! (artifact drift or corruption, fixable only by an operator). Use
//! [`PredictError::is_caller_error`] to pick the response class at the
//! transport boundary. Nothing in this crate retries: every operation is a
//! deterministic function of its inputs.

use thiserror::Error;

use crate::model::ModelError;

/// Errors produced while answering a prediction request.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Requested disease key has no loaded bundle (never trained, or its
    /// artifacts were absent at startup).
    #[error("unknown disease: {0}")]
    UnknownDisease(String),

    /// The raw feature map omits one or more required fields. All missing
    /// names are reported in one error so the caller can fix every omission
    /// in a single round trip.
    #[error("missing input fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A field expected to be numeric could not be parsed as a number.
    #[error("invalid value for field `{field}`: expected a number, got `{value}`")]
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// The rejected raw value, rendered for the error message.
        value: String,
    },

    /// The encoded input could not be reconciled with the fitted
    /// preprocessor. This is a deployment inconsistency (artifact/schema
    /// drift), not a caller input problem.
    #[error("schema mismatch: {detail}")]
    SchemaMismatch {
        /// What failed to reconcile.
        detail: String,
    },

    /// Model evaluation failed. Indicates a corrupt artifact; retrying the
    /// same request cannot succeed.
    #[error("model evaluation failed: {0}")]
    Model(#[from] ModelError),
}

impl PredictError {
    /// Whether the error is recoverable by the caller resubmitting
    /// corrected input (HTTP 400 class), as opposed to an operator-facing
    /// artifact problem (HTTP 500 class).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PredictError::UnknownDisease(_)
                | PredictError::MissingFields(_)
                | PredictError::InvalidValue { .. }
        )
    }
}
