//! F1-optimal decision-threshold calibration.
//!
//! A naive 0.5 cutoff is suboptimal under class imbalance: even after
//! training-time resampling, the held-out set skews the precision/recall
//! trade-off. [`optimal_threshold`] sweeps candidate thresholds over the
//! held-out probabilities and keeps the one maximizing F1 for the positive
//! (at-risk) class. The sweep is deterministic: candidates are sorted
//! ascending, only a strictly greater F1 replaces the incumbent, so ties
//! resolve to the lowest threshold.

use thiserror::Error;

/// Number of evenly spaced grid candidates.
const GRID_POINTS: usize = 81;
/// Grid range endpoints (inclusive). Extremes 0 and 1 are never candidates.
const GRID_LO: f64 = 0.1;
const GRID_HI: f64 = 0.9;

/// Errors validating calibration input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// No examples were supplied.
    #[error("cannot calibrate a threshold on zero examples")]
    Empty,

    /// Labels and probabilities differ in length.
    #[error("length mismatch: {labels} labels vs {probabilities} probabilities")]
    LengthMismatch {
        /// Number of labels.
        labels: usize,
        /// Number of probabilities.
        probabilities: usize,
    },

    /// A label was neither 0 nor 1.
    #[error("label at index {index} is {value}, expected 0 or 1")]
    BadLabel {
        /// Offending example index.
        index: usize,
        /// The rejected label.
        value: u8,
    },

    /// A probability was outside [0, 1] or not finite.
    #[error("probability at index {index} is {value}, expected a finite value in [0, 1]")]
    BadProbability {
        /// Offending example index.
        index: usize,
        /// The rejected probability.
        value: f64,
    },
}

/// Binary confusion counts for the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionCounts {
    /// True positives.
    pub tp: usize,
    /// False positives.
    pub fp: usize,
    /// False negatives.
    pub fn_: usize,
    /// True negatives.
    pub tn: usize,
}

impl ConfusionCounts {
    /// Count a labeled prediction set. Slices must be equal length.
    pub fn from_predictions(labels: &[u8], predictions: &[u8]) -> Self {
        let mut counts = Self::default();
        for (&label, &pred) in labels.iter().zip(predictions) {
            match (label != 0, pred != 0) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (true, false) => counts.fn_ += 1,
                (false, false) => counts.tn += 1,
            }
        }
        counts
    }

    /// Count predictions made by thresholding probabilities at `t` with
    /// `p >= t`.
    pub fn at_threshold(labels: &[u8], probabilities: &[f64], t: f64) -> Self {
        let mut counts = Self::default();
        for (&label, &p) in labels.iter().zip(probabilities) {
            match (label != 0, p >= t) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (true, false) => counts.fn_ += 1,
                (false, false) => counts.tn += 1,
            }
        }
        counts
    }

    /// Precision for the positive class; 0.0 when undefined.
    pub fn precision(&self) -> f64 {
        let denom = self.tp + self.fp;
        if denom == 0 {
            0.0
        } else {
            self.tp as f64 / denom as f64
        }
    }

    /// Recall for the positive class; 0.0 when undefined.
    pub fn recall(&self) -> f64 {
        let denom = self.tp + self.fn_;
        if denom == 0 {
            0.0
        } else {
            self.tp as f64 / denom as f64
        }
    }

    /// F1 score; 0.0 when precision and recall are both zero.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

/// F1 score of a prediction set against true labels.
pub fn f1_score(labels: &[u8], predictions: &[u8]) -> f64 {
    ConfusionCounts::from_predictions(labels, predictions).f1()
}

fn validate(labels: &[u8], probabilities: &[f64]) -> Result<(), CalibrationError> {
    if labels.len() != probabilities.len() {
        return Err(CalibrationError::LengthMismatch {
            labels: labels.len(),
            probabilities: probabilities.len(),
        });
    }
    if labels.is_empty() {
        return Err(CalibrationError::Empty);
    }
    for (index, &value) in labels.iter().enumerate() {
        if value > 1 {
            return Err(CalibrationError::BadLabel { index, value });
        }
    }
    for (index, &value) in probabilities.iter().enumerate() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(CalibrationError::BadProbability { index, value });
        }
    }
    Ok(())
}

/// Find the F1-maximizing decision threshold over held-out examples.
///
/// Candidates are the union of an 81-point grid over [0.1, 0.9] and every
/// distinct probability value strictly inside (0, 1), swept ascending.
/// Binarization is `p >= t`. Returns the lowest threshold achieving the
/// greatest F1; running twice on identical input yields the identical
/// threshold.
pub fn optimal_threshold(labels: &[u8], probabilities: &[f64]) -> Result<f64, CalibrationError> {
    validate(labels, probabilities)?;

    let step = (GRID_HI - GRID_LO) / (GRID_POINTS - 1) as f64;
    let mut candidates: Vec<f64> = (0..GRID_POINTS).map(|i| GRID_LO + step * i as f64).collect();
    candidates.extend(probabilities.iter().copied().filter(|&p| p > 0.0 && p < 1.0));
    candidates.sort_by(f64::total_cmp);
    candidates.dedup();

    let mut best_t = 0.5;
    let mut best_f1 = -1.0;
    for &t in &candidates {
        let f1 = ConfusionCounts::at_threshold(labels, probabilities, t).f1();
        if f1 > best_f1 {
            best_f1 = f1;
            best_t = t;
        }
    }

    log::debug!("calibrated threshold {best_t:.4} (F1 {best_f1:.4}, {} candidates)", candidates.len());
    Ok(best_t)
}
