//! Feature schemas and raw request input.
//!
//! A [`FeatureSchema`] is the ordered, named contract of inputs a disease's
//! bundle expects. The field order is fixed when the preprocessor is fitted
//! and is never re-derived per request; it is the contract boundary between
//! validation and encoding, and the schema persists inside the preprocessor
//! artifact so serving can never drift from training.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Semantic type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Scaled to a single numeric column.
    Numeric,
    /// One-hot expanded against a fitted category vocabulary.
    Categorical,
}

/// A single named field in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it appears in request payloads.
    pub name: String,
    /// Semantic type.
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Shorthand for a numeric field.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Numeric,
        }
    }

    /// Shorthand for a categorical field.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Categorical,
        }
    }
}

/// Ordered list of required input fields for one disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Disease identifier (e.g. "diabetes").
    pub disease_key: String,
    /// Required fields, order-significant: this is the exact order columns
    /// were presented to the preprocessor during fit.
    pub fields: Vec<FieldSpec>,
}

/// An untrusted raw value supplied by a caller.
///
/// Request payloads carry numeric literals, yes/no flags, or category
/// strings; the untagged representation accepts all three JSON shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A yes/no flag. Coerces to 1.0/0.0 for numeric fields and to
    /// "Yes"/"No" for categorical fields.
    Flag(bool),
    /// A numeric literal.
    Number(f64),
    /// Free text: either a numeric-literal-as-string or a category name.
    Text(String),
}

impl RawValue {
    /// Interpret as a numeric value, if possible.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) => Some(*v),
            RawValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            RawValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret as a category name.
    pub fn as_category(&self) -> String {
        match self {
            RawValue::Text(s) => s.trim().to_owned(),
            RawValue::Flag(b) => if *b { "Yes" } else { "No" }.to_owned(),
            RawValue::Number(v) => v.to_string(),
        }
    }

    /// Render for error messages.
    fn display_string(&self) -> String {
        match self {
            RawValue::Text(s) => s.clone(),
            RawValue::Flag(b) => b.to_string(),
            RawValue::Number(v) => v.to_string(),
        }
    }
}

/// An unordered, untrusted field-name → value mapping from a caller.
pub type RawFeatureMap = HashMap<String, RawValue>;

/// A validated value, ready for the preprocessor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Parsed numeric value for a [`FieldKind::Numeric`] field.
    Numeric(f64),
    /// Normalized category name for a [`FieldKind::Categorical`] field.
    Category(String),
}

impl FeatureSchema {
    /// Create a schema from an ordered field list.
    pub fn new(disease_key: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            disease_key: disease_key.into(),
            fields,
        }
    }

    /// Required field names, in schema order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of input fields (pre one-hot expansion).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a raw map against this schema, returning values in schema
    /// order.
    ///
    /// Missing fields are collected into a single [`PredictError::MissingFields`]
    /// listing every absent name. Numeric fields that cannot be parsed fail
    /// with [`PredictError::InvalidValue`] naming the field. Extra fields in
    /// the map are ignored.
    pub fn validate(&self, raw: &RawFeatureMap) -> Result<Vec<FieldValue>, PredictError> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| !raw.contains_key(&f.name))
            .map(|f| f.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(PredictError::MissingFields(missing));
        }

        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = &raw[&field.name];
            match field.kind {
                FieldKind::Numeric => {
                    let v = value.as_numeric().ok_or_else(|| PredictError::InvalidValue {
                        field: field.name.clone(),
                        value: value.display_string(),
                    })?;
                    values.push(FieldValue::Numeric(v));
                }
                FieldKind::Categorical => {
                    values.push(FieldValue::Category(value.as_category()));
                }
            }
        }
        Ok(values)
    }
}
