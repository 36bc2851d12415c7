//! Outlier clipping.

use crate::stats::nan_median;

/// Clip values to `median ± n · MAD`, where MAD is the median absolute
/// deviation from the median. Missing values stay missing.
#[must_use]
pub fn winsorize_mad(data: &[f64], n: f64) -> Vec<f64> {
    let median = nan_median(data);
    if median.is_nan() {
        return data.to_vec();
    }
    let deviations: Vec<f64> = data.iter().map(|x| (x - median).abs()).collect();
    let mad = nan_median(&deviations);
    let (lower, upper) = (median - n * mad, median + n * mad);

    data.iter().map(|&x| if x.is_nan() { x } else { x.clamp(lower, upper) }).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn clips_extremes() {
        let data = [1.0, 2.0, 3.0, 4.0, 100.0];
        // median 3, MAD 1
        let out = winsorize_mad(&data, 5.0);
        assert_relative_eq!(out[4], 8.0);
        assert_relative_eq!(out[0], 1.0);
    }

    #[test]
    fn preserves_missing() {
        let data = [1.0, f64::NAN, 3.0, -50.0, 2.0];
        let out = winsorize_mad(&data, 1.0);
        assert!(out[1].is_nan());
        // median 1.5, MAD 1.0
        assert_relative_eq!(out[3], 0.5);
    }

    #[test]
    fn all_missing() {
        let out = winsorize_mad(&[f64::NAN, f64::NAN], 5.0);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
