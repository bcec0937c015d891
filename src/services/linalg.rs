//! Small dense linear algebra helpers for the built-in model.
//!
//! Design matrices are stored column-major as `&[Vec<f64>]`, one vector per
//! regressor.

use crate::error::ModelError;

/// Solve the ridge-penalized normal equations `(X'X + diag(p)) b = X'y`.
///
/// `penalties` holds one non-negative weight per column. Fails when the
/// system is not positive definite or the solution is not finite.
pub fn penalized_least_squares(
    columns: &[Vec<f64>],
    y: &[f64],
    penalties: &[f64],
) -> Result<Vec<f64>, ModelError> {
    let k = columns.len();
    if penalties.len() != k {
        return Err(ModelError::InvalidInput(format!(
            "{} penalties for {} columns",
            penalties.len(),
            k
        )));
    }
    if k == 0 {
        return Ok(Vec::new());
    }
    if let Some(col) = columns.iter().find(|c| c.len() != y.len()) {
        return Err(ModelError::InvalidInput(format!(
            "column of length {} for {} observations",
            col.len(),
            y.len()
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in 0..=i {
            let v: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = v;
            xtx[j][i] = v;
        }
        xtx[i][i] += penalties[i];
    }

    let xty: Vec<f64> = columns
        .iter()
        .map(|col| col.iter().zip(y).map(|(a, b)| a * b).sum())
        .collect();

    let coefficients = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ModelError::Numerical("normal equations are not positive definite".to_string())
    })?;

    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::Numerical(
            "least squares produced non-finite coefficients".to_string(),
        ));
    }
    Ok(coefficients)
}

/// `X b` for a column-major design.
pub fn apply(columns: &[Vec<f64>], coefficients: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for (col, coef) in columns.iter().zip(coefficients) {
        for (o, x) in out.iter_mut().zip(col) {
            *o += coef * x;
        }
    }
    out
}

/// Solve a symmetric positive definite system with a Cholesky factorization.
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * z[j];
        }
        z[i] = sum / l[i][i];
    }

    // L' x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

/// Inverse standard normal CDF (Abramowitz and Stegun 26.2.23).
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let t = if p < 0.5 {
        (-2.0 * p.ln()).sqrt()
    } else {
        (-2.0 * (1.0 - p).ln()).sqrt()
    };

    // Abramowitz and Stegun rational approximation coefficients
    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let result = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    if p < 0.5 {
        -result
    } else {
        result
    }
}
