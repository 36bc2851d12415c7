//! Weight generation functions.

use ndarray::Array1;

/// Generate exponentially decaying weights in chronological order.
///
/// The weight at lag `i` is `0.5^(i / half_life)`; the array is reversed so
/// the last element (the most recent observation) is `1.0` and the first is
/// the smallest. Weights are not normalized.
///
/// # Arguments
/// * `window` - Number of trailing periods
/// * `half_life` - Half-life in periods
#[must_use]
pub fn exp_weights(window: usize, half_life: usize) -> Array1<f64> {
    if window == 0 || half_life == 0 {
        return Array1::zeros(window);
    }

    let decay = 0.5_f64.powf(1.0 / half_life as f64);
    Array1::from_iter((0..window).rev().map(|lag| decay.powi(lag as i32)))
}
