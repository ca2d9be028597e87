//! Per-column affine scaling with fit-time frozen parameters.

use serde::{Deserialize, Serialize};

/// Which scaling family to fit for numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// Rescale to the fitted [min, max] range.
    #[default]
    MinMax,
    /// Center to the fitted mean and scale by the fitted standard deviation.
    Standard,
}

/// A fitted affine transform for one numeric column.
///
/// Parameters are frozen at fit time and applied identically at inference;
/// a degenerate column (constant values) maps everything to 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// Min-max rescaling: `(v - min) / (max - min)`.
    MinMax {
        /// Smallest value seen at fit time.
        min: f64,
        /// Largest value seen at fit time.
        max: f64,
    },
    /// Standardization: `(v - mean) / std`.
    Standard {
        /// Column mean at fit time.
        mean: f64,
        /// Population standard deviation at fit time.
        std: f64,
    },
}

impl Scaler {
    /// Fit a scaler of the given family over a training column.
    pub fn fit(scaling: Scaling, values: &[f64]) -> Self {
        match scaling {
            Scaling::MinMax => Self::fit_min_max(values),
            Scaling::Standard => Self::fit_standard(values),
        }
    }

    /// Fit a min-max scaler over a training column.
    pub fn fit_min_max(values: &[f64]) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if min > max {
            // No finite values; behave as a degenerate column.
            return Scaler::MinMax { min: 0.0, max: 0.0 };
        }
        Scaler::MinMax { min, max }
    }

    /// Fit a standardization scaler over a training column.
    pub fn fit_standard(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Scaler::Standard { mean: 0.0, std: 0.0 };
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Scaler::Standard {
            mean,
            std: var.sqrt(),
        }
    }

    /// Apply the fitted transform to one value.
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            Scaler::MinMax { min, max } => {
                let range = max - min;
                if range == 0.0 {
                    0.0
                } else {
                    (v - min) / range
                }
            }
            Scaler::Standard { mean, std } => {
                if *std == 0.0 {
                    0.0
                } else {
                    (v - mean) / std
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn min_max_rescales_into_unit_range() {
        let scaler = Scaler::fit_min_max(&[10.0, 20.0, 30.0]);
        assert_eq!(scaler, Scaler::MinMax { min: 10.0, max: 30.0 });
        assert_abs_diff_eq!(scaler.apply(10.0), 0.0);
        assert_abs_diff_eq!(scaler.apply(20.0), 0.5);
        assert_abs_diff_eq!(scaler.apply(30.0), 1.0);
        // Out-of-range inference values extrapolate, matching the fitted affine.
        assert_abs_diff_eq!(scaler.apply(40.0), 1.5);
    }

    #[test]
    fn standard_centers_and_scales() {
        let scaler = Scaler::fit_standard(&[2.0, 4.0, 6.0]);
        match scaler {
            Scaler::Standard { mean, std } => {
                assert_abs_diff_eq!(mean, 4.0);
                assert_abs_diff_eq!(std, (8.0f64 / 3.0).sqrt(), epsilon = 1e-12);
            }
            other => panic!("expected Standard, got {other:?}"),
        }
        assert_abs_diff_eq!(scaler.apply(4.0), 0.0);
    }

    #[test]
    fn degenerate_columns_map_to_zero() {
        let constant = Scaler::fit_min_max(&[5.0, 5.0, 5.0]);
        assert_eq!(constant.apply(5.0), 0.0);
        assert_eq!(constant.apply(99.0), 0.0);

        let constant = Scaler::fit_standard(&[5.0, 5.0]);
        assert_eq!(constant.apply(5.0), 0.0);
    }

    #[test]
    fn serde_round_trip_preserves_parameters() {
        let scaler = Scaler::MinMax { min: 1.5, max: 9.25 };
        let json = serde_json::to_string(&scaler).unwrap();
        let back: Scaler = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scaler);
    }
}
