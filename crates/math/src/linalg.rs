//! Least-squares regression.
//!
//! Weighted least squares minimizes `sum(w_i * r_i^2)`: rows of the design
//! and the response are scaled by `sqrt(w_i)` before solving the normal
//! equations. Robust mode runs iteratively reweighted least squares with
//! Huber's T norm on top of the caller's weights.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::MathError;

/// Huber tuning constant.
const HUBER_T: f64 = 1.345;

/// Consistency constant turning the median absolute residual into a scale.
const MAD_NORMALIZER: f64 = 0.674_489_750_196_081_7;

/// Relative pivot threshold for the normal equations.
const PIVOT_TOLERANCE: f64 = 1e-14;

/// Options for [`fit`].
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Prepend a constant column to the design.
    pub intercept: bool,
    /// Observation weights, all ones when `None`.
    pub weights: Option<Array1<f64>>,
    /// Use Huber IRLS instead of plain least squares.
    pub robust: bool,
    /// Maximum IRLS iterations.
    pub max_iter: usize,
    /// IRLS convergence tolerance on the coefficients.
    pub tol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { intercept: true, weights: None, robust: false, max_iter: 50, tol: 1e-8 }
    }
}

impl FitOptions {
    /// Ordinary least squares with an intercept.
    #[must_use]
    pub fn ols() -> Self {
        Self::default()
    }

    /// Weighted least squares with an intercept.
    #[must_use]
    pub fn weighted(weights: Array1<f64>) -> Self {
        Self { weights: Some(weights), ..Self::default() }
    }

    /// Switch the intercept on or off.
    #[must_use]
    pub const fn with_intercept(mut self, intercept: bool) -> Self {
        self.intercept = intercept;
        self
    }

    /// Switch robust fitting on or off.
    #[must_use]
    pub const fn with_robust(mut self, robust: bool) -> Self {
        self.robust = robust;
        self
    }
}

/// Coefficients and residuals of a fit with `k` response columns.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Intercept per response column (zero without an intercept).
    pub intercept: Array1<f64>,
    /// Slopes, `p x k`.
    pub slopes: Array2<f64>,
    /// Residuals on the original scale, `n x k`.
    pub residuals: Array2<f64>,
}

/// Result of [`fit_simple`].
#[derive(Debug, Clone)]
pub struct SimpleFit {
    /// Intercept.
    pub intercept: f64,
    /// Slope.
    pub slope: f64,
    /// Residuals.
    pub residuals: Vec<f64>,
}

/// Fit `y` on `x`, one coefficient set per column of `y`.
///
/// # Errors
/// Returns an error on mismatched shapes, non-finite input, invalid weights,
/// fewer observations than parameters, or a singular design. Never panics on
/// degenerate data.
pub fn fit(
    x: ArrayView2<'_, f64>,
    y: ArrayView2<'_, f64>,
    options: &FitOptions,
) -> Result<FitResult, MathError> {
    let n = y.nrows();
    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::NonFinite("x"));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(MathError::NonFinite("y"));
    }

    let weights = match &options.weights {
        Some(w) => {
            if w.len() != n {
                return Err(MathError::DimensionMismatch { expected: n, actual: w.len() });
            }
            validate_weights(w.view())?;
            w.clone()
        }
        None => Array1::ones(n),
    };

    let design = design_matrix(x, options.intercept);
    let p = design.ncols();
    if n < p {
        return Err(MathError::InsufficientObservations { needed: p, got: n });
    }

    let beta = if options.robust {
        let mut beta = Array2::zeros((p, y.ncols()));
        for (k, column) in y.axis_iter(Axis(1)).enumerate() {
            let b = huber_irls(&design, column, &weights, options.max_iter, options.tol)?;
            beta.column_mut(k).assign(&b);
        }
        beta
    } else {
        solve_weighted(&design, y, &weights)?
    };

    let residuals = &y - &design.dot(&beta);
    let (intercept, slopes) = if options.intercept {
        (beta.row(0).to_owned(), beta.slice(ndarray::s![1.., ..]).to_owned())
    } else {
        (Array1::zeros(y.ncols()), beta)
    };

    Ok(FitResult { intercept, slopes, residuals })
}

/// Fit `y = a + b x` with optional weights.
///
/// # Errors
/// See [`fit`].
pub fn fit_simple(x: &[f64], y: &[f64], weights: Option<&[f64]>) -> Result<SimpleFit, MathError> {
    if x.len() != y.len() {
        return Err(MathError::DimensionMismatch { expected: y.len(), actual: x.len() });
    }
    let xv = ArrayView2::from_shape((x.len(), 1), x)
        .map_err(|_| MathError::DimensionMismatch { expected: y.len(), actual: x.len() })?;
    let yv = ArrayView2::from_shape((y.len(), 1), y)
        .map_err(|_| MathError::DimensionMismatch { expected: x.len(), actual: y.len() })?;
    let options = FitOptions { weights: weights.map(|w| Array1::from(w.to_vec())), ..FitOptions::ols() };

    let result = fit(xv, yv, &options)?;
    Ok(SimpleFit {
        intercept: result.intercept[0],
        slope: result.slopes[[0, 0]],
        residuals: result.residuals.column(0).to_vec(),
    })
}

fn validate_weights(w: ArrayView1<'_, f64>) -> Result<(), MathError> {
    if w.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidWeights("non-finite weight".to_string()));
    }
    if w.iter().any(|&v| v < 0.0) {
        return Err(MathError::InvalidWeights("negative weight".to_string()));
    }
    if w.sum() <= 0.0 {
        return Err(MathError::InvalidWeights("weights sum to zero".to_string()));
    }
    Ok(())
}

fn design_matrix(x: ArrayView2<'_, f64>, intercept: bool) -> Array2<f64> {
    if !intercept {
        return x.to_owned();
    }
    let mut design = Array2::ones((x.nrows(), x.ncols() + 1));
    design.slice_mut(ndarray::s![.., 1..]).assign(&x);
    design
}

/// Solve weighted normal equations for every column of `y`.
fn solve_weighted(
    design: &Array2<f64>,
    y: ArrayView2<'_, f64>,
    weights: &Array1<f64>,
) -> Result<Array2<f64>, MathError> {
    let sqrt_w = weights.mapv(f64::sqrt).insert_axis(Axis(1));
    let xw = design * &sqrt_w;
    let yw = &y * &sqrt_w;
    let xtx = xw.t().dot(&xw);
    let xty = xw.t().dot(&yw);
    solve_linear_system(&xtx, &xty)
}

/// Huber IRLS for one response column.
fn huber_irls(
    design: &Array2<f64>,
    y: ArrayView1<'_, f64>,
    weights: &Array1<f64>,
    max_iter: usize,
    tol: f64,
) -> Result<Array1<f64>, MathError> {
    let y2 = y.insert_axis(Axis(1));
    let mut beta = solve_weighted(design, y2.view(), weights)?.column(0).to_owned();

    for _ in 0..max_iter {
        let resid = &y - &design.dot(&beta);
        let scale = median(resid.iter().map(|r| r.abs()).collect()) / MAD_NORMALIZER;
        if scale <= f64::EPSILON {
            break;
        }

        let robust_w: Array1<f64> = resid
            .iter()
            .zip(weights.iter())
            .map(|(r, w)| {
                let u = (r / scale).abs();
                if u <= HUBER_T { *w } else { w * HUBER_T / u }
            })
            .collect();

        let next = solve_weighted(design, y2.view(), &robust_w)?.column(0).to_owned();
        let change = (&next - &beta).iter().fold(0.0_f64, |m, d| m.max(d.abs()));
        beta = next;
        if change < tol {
            break;
        }
    }

    Ok(beta)
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 { (values[mid - 1] + values[mid]) / 2.0 } else { values[mid] }
}

/// Solve `A X = B` using Gaussian elimination with partial pivoting.
fn solve_linear_system(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let n = a.nrows();
    let k = b.ncols();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }
    if b.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.nrows() });
    }

    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return Err(MathError::Singular);
    }

    // Augmented matrix [A | B]
    let mut aug = Array2::zeros((n, n + k));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.slice_mut(ndarray::s![.., n..]).assign(b);

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val <= PIVOT_TOLERANCE * scale {
            return Err(MathError::Singular);
        }

        if max_row != col {
            for j in 0..(n + k) {
                aug.swap([col, j], [max_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..(n + k) {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array2::zeros((n, k));
    for c in 0..k {
        for i in (0..n).rev() {
            let mut sum = aug[[i, n + c]];
            for j in (i + 1)..n {
                sum -= aug[[i, j]] * x[[j, c]];
            }
            x[[i, c]] = sum / aug[[i, i]];
        }
    }

    if x.iter().any(|v: &f64| !v.is_finite()) {
        return Err(MathError::Singular);
    }
    Ok(x)
}
