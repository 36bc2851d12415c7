//! Cross-sectional transforms.

use crate::stats::{nan_mean, nan_std};

/// Z-score a cross-section ignoring missing values (population std).
///
/// A zero or undefined dispersion yields all-missing output.
#[must_use]
pub fn standardize(data: &[f64]) -> Vec<f64> {
    let mean = nan_mean(data);
    let std = nan_std(data);
    if !std.is_finite() || std == 0.0 {
        return vec![f64::NAN; data.len()];
    }
    data.iter().map(|x| (x - mean) / std).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::stats::{nan_mean, nan_std};

    #[test]
    fn zero_mean_unit_variance() {
        let out = standardize(&[1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0]);
        assert!(out[2].is_nan());
        assert_relative_eq!(nan_mean(&out), 0.0, epsilon = 1e-12);
        assert_relative_eq!(nan_std(&out), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_input() {
        assert!(standardize(&[2.0, 2.0, 2.0]).iter().all(|v| v.is_nan()));
    }
}
