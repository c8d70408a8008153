use super::coefficient::check_pair;
use super::{CorrelationMethod, CorrelationResult};
use crate::math::special::normal_quantile;
use crate::prelude::{AnalysisError, AnalysisResult};

/// Smallest sample for which the Fisher standard error `1/sqrt(n - 3)` exists.
pub const MIN_INTERVAL_SAMPLES: usize = 4;

/// Confidence bounds of a correlation coefficient via the Fisher z-transform.
///
/// Callers must pass `|r| < 1` and `n >= 4`.
pub fn fisher_interval(r: f64, n: usize, alpha: f64) -> (f64, f64) {
    let z = r.atanh();
    let se = 1.0 / ((n - 3) as f64).sqrt();
    let z_crit = normal_quantile(1.0 - alpha / 2.0);
    ((z - z_crit * se).tanh(), (z + z_crit * se).tanh())
}

/// Correlation coefficient, p-value and `1 - alpha` confidence interval.
///
/// Fails with `InsufficientSample` for fewer than four pairs and with
/// `DegenerateCorrelation` when the coefficient is exactly +1 or -1, where
/// the Fisher transform is unbounded.
pub fn correlation_with_ci(
    x: &[f64],
    y: &[f64],
    alpha: f64,
    method: CorrelationMethod,
) -> AnalysisResult<CorrelationResult> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "alpha must lie in (0, 1), got {}",
            alpha
        )));
    }
    check_pair(x, y)?;
    let samples = x.len();
    if samples < MIN_INTERVAL_SAMPLES {
        return Err(AnalysisError::InsufficientSample {
            needed: MIN_INTERVAL_SAMPLES,
            actual: samples,
        });
    }

    let (coefficient, p_value) = method.coefficient(x, y)?;
    if coefficient.abs() >= 1.0 {
        return Err(AnalysisError::DegenerateCorrelation { coefficient });
    }

    let (lower, upper) = fisher_interval(coefficient, samples, alpha);
    Ok(CorrelationResult {
        method,
        coefficient,
        p_value,
        lower,
        upper,
        samples,
    })
}
