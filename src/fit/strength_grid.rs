//! Penalty-strength grids for regularization paths.
//!
//! Strengths of interest span several orders of magnitude, so paths are sampled
//! on a log scale. A path may also start at exactly zero (the unregularized fit).

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::new(
            2,
            format!(
                "Invalid strength range: min={min}, max={max} \
                 (must be finite, >0, and max>min)."
            ),
        ));
    }
    if steps < 2 {
        return Err(AppError::new(2, "Strength steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    Ok(out)
}

/// Log-spaced strengths, optionally prefixed with `0.0`.
pub fn strength_grid(
    min: f64,
    max: f64,
    steps: usize,
    include_zero: bool,
) -> Result<Vec<f64>, AppError> {
    let mut out = Vec::with_capacity(steps + 1);
    if include_zero {
        out.push(0.0);
    }
    out.extend(log_space(min, max, steps)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_space_endpoints_and_ratio() {
        let v = log_space(0.01, 100.0, 5).unwrap();
        assert_eq!(v.len(), 5);
        assert!((v[0] - 0.01).abs() < 1e-12);
        assert!((v[4] - 100.0).abs() < 1e-9);
        for w in v.windows(2) {
            assert!((w[1] / w[0] - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn strength_grid_can_start_at_zero() {
        let v = strength_grid(0.1, 1.0, 3, true).unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v[0], 0.0);
        assert!(strength_grid(1.0, 0.1, 3, false).is_err());
        assert!(log_space(0.1, 1.0, 1).is_err());
    }
}
