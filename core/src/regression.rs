//! Ordinary least-squares line fits.

use crate::correlation::coefficient::{check_pair, correlation_p_value};
use crate::math::stats::StatsHelper;
use crate::prelude::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

/// Least-squares line `y = slope * x + intercept` with its uncertainties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    pub p_value: f64,
    pub slope_stderr: f64,
    pub intercept_stderr: f64,
    pub samples: usize,
}

impl LinearRegression {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fits a straight line through `(x, y)`.
///
/// The slope standard error is `sqrt((1 - r^2) * Syy / Sxx / (n - 2))`; the
/// intercept error follows from it. Needs at least three pairs and a
/// non-constant `x`.
pub fn linregress(x: &[f64], y: &[f64]) -> AnalysisResult<LinearRegression> {
    check_pair(x, y)?;
    let n = x.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientSample {
            needed: 3,
            actual: n,
        });
    }

    let x_mean = StatsHelper::mean(x);
    let y_mean = StatsHelper::mean(y);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&xv, &yv) in x.iter().zip(y) {
        let dx = xv - x_mean;
        let dy = yv - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return Err(AnalysisError::InvalidInput(
            "cannot fit a line to a constant x sequence".into(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r_value = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };

    let df = (n - 2) as f64;
    let slope_stderr = ((1.0 - r_value * r_value).max(0.0) * syy / sxx / df).sqrt();
    let intercept_stderr = slope_stderr * (sxx / n as f64 + x_mean * x_mean).sqrt();

    Ok(LinearRegression {
        slope,
        intercept,
        r_value,
        p_value: correlation_p_value(r_value, n),
        slope_stderr,
        intercept_stderr,
        samples: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 1.5 * v - 2.0).collect();
        let fit = linregress(&x, &y).unwrap();
        assert!((fit.slope - 1.5).abs() < 1e-12);
        assert!((fit.intercept + 2.0).abs() < 1e-12);
        assert!((fit.r_value - 1.0).abs() < 1e-12);
        assert!(fit.slope_stderr.abs() < 1e-6);
        assert!((fit.predict(10.0) - 13.0).abs() < 1e-9);
    }

    #[test]
    fn standard_errors_match_reference() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let fit = linregress(&x, &y).unwrap();
        // Sxy = 8, Sxx = 10, Syy = 10
        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept - 0.6).abs() < 1e-12);
        assert!((fit.r_value - 0.8).abs() < 1e-12);
        let expected_slope_err = (0.36_f64 * 10.0 / 10.0 / 3.0).sqrt();
        assert!((fit.slope_stderr - expected_slope_err).abs() < 1e-12);
        let expected_intercept_err = expected_slope_err * (2.0_f64 + 9.0).sqrt();
        assert!((fit.intercept_stderr - expected_intercept_err).abs() < 1e-12);
        assert!((fit.p_value - 0.104_088_038_661_827_8).abs() < 1e-9);
    }

    #[test]
    fn two_points_are_insufficient() {
        assert_eq!(
            linregress(&[1.0, 2.0], &[1.0, 2.0]).unwrap_err(),
            AnalysisError::InsufficientSample {
                needed: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn constant_x_is_rejected() {
        assert!(matches!(
            linregress(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(AnalysisError::InvalidInput(_))
        ));
    }
}
