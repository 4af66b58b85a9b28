//! Least-squares line fitting for spend series
//!
//! Fits `y = slope * x + intercept` over a series indexed `0..n` using the
//! closed-form normal equations. Degenerate input (fewer than two distinct x
//! values) never fails: the fit falls back to a flat line at the mean.

use serde::{Deserialize, Serialize};

/// A fitted line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit a line over values indexed 0..n
    pub fn fit(values: &[f64]) -> Self {
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, &y)| (i as f64, y))
            .collect();
        Self::fit_points(&points)
    }

    /// Fit a line over explicit (x, y) points
    pub fn fit_points(points: &[(f64, f64)]) -> Self {
        if points.is_empty() {
            return Self {
                slope: 0.0,
                intercept: 0.0,
            };
        }

        let n = points.len() as f64;
        let sum_x: f64 = points.iter().map(|p| p.0).sum();
        let sum_y: f64 = points.iter().map(|p| p.1).sum();
        let sum_xx: f64 = points.iter().map(|p| p.0 * p.0).sum();
        let sum_xy: f64 = points.iter().map(|p| p.0 * p.1).sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator.abs() < f64::EPSILON {
            return Self {
                slope: 0.0,
                intercept: sum_y / n,
            };
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        Self { slope, intercept }
    }

    /// Raw line value at `x` (may be negative)
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Spend prediction at `x`, never negative
    pub fn predict(&self, x: f64) -> f64 {
        self.value_at(x).max(0.0)
    }

    /// Coefficient of determination against the values the line was fit on
    ///
    /// 1.0 is a perfect fit; 0.0 when the series has no variance.
    pub fn r_squared(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let ss_tot: f64 = values.iter().map(|y| (y - mean).powi(2)).sum();
        let ss_res: f64 = values
            .iter()
            .enumerate()
            .map(|(i, y)| (y - self.value_at(i as f64)).powi(2))
            .sum();

        if ss_tot > 0.0 {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_fit_empty_series() {
        let fit = LinearFit::fit(&[]);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 0.0);
    }

    #[test]
    fn test_fit_single_point_is_flat_at_value() {
        let fit = LinearFit::fit(&[42.0]);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 42.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_fit_identical_x_values_falls_back_to_mean() {
        let fit = LinearFit::fit_points(&[(3.0, 10.0), (3.0, 20.0)]);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 15.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_fit_recovers_exact_line() {
        // y = 2.5x + 10
        let values: Vec<f64> = (0..6).map(|x| 2.5 * x as f64 + 10.0).collect();
        let fit = LinearFit::fit(&values);

        assert!((fit.slope - 2.5).abs() < TOLERANCE);
        assert!((fit.intercept - 10.0).abs() < TOLERANCE);
        assert!((fit.r_squared(&values) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_predict_clamps_negative() {
        // y = -10x + 20 crosses zero at x = 2
        let fit = LinearFit::fit(&[20.0, 10.0, 0.0]);
        assert!((fit.value_at(5.0) + 30.0).abs() < TOLERANCE);
        assert_eq!(fit.predict(5.0), 0.0);
        assert!((fit.predict(1.0) - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_r_squared_flat_series() {
        let values = [5.0, 5.0, 5.0];
        let fit = LinearFit::fit(&values);
        assert_eq!(fit.r_squared(&values), 0.0);
    }
}
