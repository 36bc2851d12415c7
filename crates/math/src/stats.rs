//! Missing-aware reducers and smoothers over `f64` slices.
//!
//! `NaN` marks a missing observation throughout.

/// Mean of the non-missing values, `NaN` if there are none.
#[must_use]
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

/// Population standard deviation (ddof 0) of the non-missing values.
#[must_use]
pub fn nan_std(values: &[f64]) -> f64 {
    let mean = nan_mean(values);
    if mean.is_nan() {
        return f64::NAN;
    }
    let (ss, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(s, c), v| (s + (v - mean).powi(2), c + 1));
    (ss / count as f64).sqrt()
}

/// Sum of the non-missing values; zero if there are none.
#[must_use]
pub fn nan_sum(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).sum()
}

/// Median of the non-missing values, `NaN` if there are none.
#[must_use]
pub fn nan_median(values: &[f64]) -> f64 {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.sort_by(f64::total_cmp);
    let mid = valid.len() / 2;
    if valid.len() % 2 == 0 { (valid[mid - 1] + valid[mid]) / 2.0 } else { valid[mid] }
}

/// Compounded return `prod(1 + r) - 1`, skipping missing returns.
#[must_use]
pub fn compound(returns: &[f64]) -> f64 {
    returns.iter().filter(|r| !r.is_nan()).fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Exponentially weighted mean with `adjust = false` and `ignore_na = true`.
///
/// `y_0` is the first non-missing value, then `y_t = (1 - alpha) y_{t-1} +
/// alpha x_t`. A missing input carries the previous output forward; leading
/// missing inputs stay missing.
#[must_use]
pub fn ewm_mean(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev = f64::NAN;
    for &x in values {
        if !x.is_nan() {
            prev = if prev.is_nan() { x } else { (1.0 - alpha) * prev + alpha * x };
        }
        out.push(prev);
    }
    out
}

/// `numerator / denominator`, missing when either side is missing or the
/// denominator is zero.
#[must_use]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if numerator.is_nan() || denominator.is_nan() || denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// `1 / x` through [`safe_div`].
#[must_use]
pub fn reciprocal(x: f64) -> f64 {
    safe_div(1.0, x)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn reducers_skip_missing() {
        let v = [1.0, NAN, 3.0];
        assert_relative_eq!(nan_mean(&v), 2.0);
        assert_relative_eq!(nan_std(&v), 1.0);
        assert_relative_eq!(nan_sum(&v), 4.0);
        assert_relative_eq!(nan_median(&v), 2.0);
    }

    #[test]
    fn reducers_all_missing() {
        assert!(nan_mean(&[NAN, NAN]).is_nan());
        assert!(nan_std(&[]).is_nan());
        assert!(nan_median(&[NAN]).is_nan());
        assert_eq!(nan_sum(&[NAN]), 0.0);
    }

    #[test]
    fn compound_returns() {
        assert_relative_eq!(compound(&[0.1, NAN, -0.1]), 1.1 * 0.9 - 1.0, epsilon = 1e-12);
        assert_eq!(compound(&[]), 0.0);
    }

    #[test]
    fn ewm_carries_over_missing() {
        let out = ewm_mean(&[NAN, 1.0, NAN, 3.0], 0.5);
        assert!(out[0].is_nan());
        assert_relative_eq!(out[1], 1.0);
        assert_relative_eq!(out[2], 1.0);
        assert_relative_eq!(out[3], 2.0);
    }

    #[rstest]
    #[case(1.0, 0.0)]
    #[case(NAN, 2.0)]
    #[case(1.0, NAN)]
    fn safe_div_missing(#[case] n: f64, #[case] d: f64) {
        assert!(safe_div(n, d).is_nan());
    }

    #[test]
    fn reciprocal_value() {
        assert_relative_eq!(reciprocal(4.0), 0.25);
        assert!(reciprocal(0.0).is_nan());
    }
}
