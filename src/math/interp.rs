//! Grid construction and interpolation helpers.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > min) {
        return Err(AppError::invalid(format!(
            "Invalid log range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::invalid("Log grid needs at least 2 steps."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// Straight line through `a` and `b`, evaluated at `x` (extrapolates).
pub fn linear_interp(a: (f64, f64), b: (f64, f64), x: f64) -> f64 {
    let (x0, y0) = a;
    let (x1, y1) = b;
    if (x1 - x0).abs() < 1e-12 {
        return y0;
    }
    let u = (x - x0) / (x1 - x0);
    y0 + u * (y1 - y0)
}

/// Piecewise-linear interpolation on a uniform grid `x0 + i*dx`.
///
/// Outside the grid the end segments are extended linearly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformGrid {
    x0: f64,
    dx: f64,
    values: Vec<f64>,
}

impl UniformGrid {
    pub fn new(x0: f64, dx: f64, values: Vec<f64>) -> Result<Self> {
        if values.len() < 2 {
            return Err(AppError::invalid("Interpolation grid needs at least 2 values."));
        }
        if !(x0.is_finite() && dx.is_finite() && dx > 0.0) {
            return Err(AppError::invalid(format!(
                "Invalid interpolation grid: x0={x0}, dx={dx}."
            )));
        }
        Ok(Self { x0, dx, values })
    }

    pub fn x_min(&self) -> f64 {
        self.x0
    }

    pub fn x_max(&self) -> f64 {
        self.x0 + self.dx * (self.values.len() - 1) as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn eval(&self, x: f64) -> f64 {
        let last = self.values.len() - 2;
        let t = (x - self.x0) / self.dx;
        // NaN falls through to the first segment and propagates via `x`.
        let i = if t <= 0.0 || t.is_nan() {
            0
        } else {
            (t.floor() as usize).min(last)
        };
        let xa = self.x0 + self.dx * i as f64;
        linear_interp((xa, self.values[i]), (xa + self.dx, self.values[i + 1]), x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(1e-4, 10.0, 6).unwrap();
        assert_eq!(v.len(), 6);
        assert_relative_eq!(v[0], 1e-4, max_relative = 1e-12);
        assert_relative_eq!(v[5], 10.0, max_relative = 1e-12);
    }

    #[test]
    fn log_space_rejects_bad_range() {
        assert!(log_space(0.0, 1.0, 10).is_err());
        assert!(log_space(1.0, 0.5, 10).is_err());
        assert!(log_space(0.1, 1.0, 1).is_err());
    }

    #[test]
    fn uniform_grid_reproduces_lines_and_extrapolates() {
        // y = 3x - 1 on x in [0, 2]
        let grid = UniformGrid::new(0.0, 0.5, vec![-1.0, 0.5, 2.0, 3.5, 5.0]).unwrap();
        for &x in &[0.0, 0.3, 1.25, 2.0] {
            assert_relative_eq!(grid.eval(x), 3.0 * x - 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(grid.eval(-1.0), -4.0, epsilon = 1e-12);
        assert_relative_eq!(grid.eval(3.0), 8.0, epsilon = 1e-12);
        assert_relative_eq!(grid.x_max(), 2.0);
    }

    #[test]
    fn uniform_grid_propagates_nan() {
        let grid = UniformGrid::new(0.0, 1.0, vec![0.0, 1.0]).unwrap();
        assert!(grid.eval(f64::NAN).is_nan());
    }
}
