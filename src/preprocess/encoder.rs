//! One-hot encoding with a fit-time frozen category vocabulary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What to do with a category that was not seen at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Emit an all-zero indicator row. Keeps serving robust to rare
    /// categories; the default, matching how the bundles are trained.
    #[default]
    Ignore,
    /// Fail the transform with a schema mismatch.
    Error,
}

/// One-hot encoder for a single categorical field.
///
/// The vocabulary is frozen at fit time in sorted order; the indicator row
/// width is always `categories.len()` regardless of the incoming value, so
/// encoded output columns reproduce the fit-time schema exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Fitted vocabulary, sorted; defines indicator column order.
    pub categories: Vec<String>,
    /// Policy for categories outside the vocabulary.
    #[serde(default)]
    pub unknown: UnknownPolicy,
}

impl OneHotEncoder {
    /// Fit a vocabulary from training values, in stable sorted order.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let categories: BTreeSet<&str> = values.into_iter().collect();
        Self {
            categories: categories.into_iter().map(str::to_owned).collect(),
            unknown: UnknownPolicy::Ignore,
        }
    }

    /// Set the unknown-category policy.
    pub fn with_unknown(mut self, unknown: UnknownPolicy) -> Self {
        self.unknown = unknown;
        self
    }

    /// Number of indicator columns this encoder emits.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Indicator column index for a category, or `None` if unseen at fit
    /// time.
    pub fn position(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }
}
