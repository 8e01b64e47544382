//! Numeric helpers shared by the sizing routines: tolerance comparison,
//! finiteness guards, log-spaced grids and Simpson integration over
//! irregularly spaced samples.

use crate::errors::{CalcError, CalcResult};

/// Absolute and relative comparison tolerances
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Reject NaN and infinities with a named InvalidInput error
pub fn ensure_finite(value: f64, what: &str) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::invalid_input(what, value.to_string(), "Value must be finite"))
    }
}

/// `n` points evenly spaced in log10 between `10^start` and `10^stop`, both included
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(stop)],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| 10f64.powf(start + step * i as f64))
                .collect()
        }
    }
}

fn trapezoid(x: &[f64], y: &[f64], i: usize) -> f64 {
    0.5 * (x[i + 1] - x[i]) * (y[i] + y[i + 1])
}

/// Composite Simpson over interval pairs `(i, i+1, i+2)` for `i = start, start+2, ...`
/// while `i + 2 <= last`. A pair with a zero-width interval falls back to trapezoids.
fn simpson_pairs(x: &[f64], y: &[f64], start: usize, last: usize) -> f64 {
    let mut total = 0.0;
    let mut i = start;
    while i + 2 <= last {
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        if h0 <= 0.0 || h1 <= 0.0 {
            total += trapezoid(x, y, i) + trapezoid(x, y, i + 1);
        } else {
            let hsum = h0 + h1;
            let hprod = h0 * h1;
            let ratio = h0 / h1;
            total += hsum / 6.0
                * (y[i] * (2.0 - 1.0 / ratio) + y[i + 1] * hsum * hsum / hprod + y[i + 2] * (2.0 - ratio));
        }
        i += 2;
    }
    total
}

/// Simpson's rule for samples `y` at ascending abscissae `x`.
///
/// With an even number of samples (odd number of intervals) the result is
/// the average of two passes: Simpson on the first `n-2` intervals plus a
/// trapezoid on the last, and a trapezoid on the first plus Simpson on the
/// remainder.
pub fn simpson(x: &[f64], y: &[f64]) -> CalcResult<f64> {
    if x.len() != y.len() {
        return Err(CalcError::invalid_input(
            "samples",
            format!("{} abscissae, {} ordinates", x.len(), y.len()),
            "Sample arrays must have equal length",
        ));
    }
    let n = x.len();
    if n < 2 {
        return Ok(0.0);
    }
    if n % 2 == 1 {
        return Ok(simpson_pairs(x, y, 0, n - 1));
    }

    let first = simpson_pairs(x, y, 0, n - 2) + trapezoid(x, y, n - 2);
    let last = trapezoid(x, y, 0) + simpson_pairs(x, y, 1, n - 1);
    Ok(0.5 * (first + last))
}
