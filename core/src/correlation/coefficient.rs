use crate::math::special::student_t_two_sided_p;
use crate::math::stats::StatsHelper;
use crate::prelude::{AnalysisError, AnalysisResult};

pub(crate) fn check_pair(x: &[f64], y: &[f64]) -> AnalysisResult<()> {
    if x.len() != y.len() {
        return Err(AnalysisError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if let Some(idx) = x.iter().chain(y).position(|v| !v.is_finite()) {
        let (series, offset) = if idx < x.len() {
            ("x", idx)
        } else {
            ("y", idx - x.len())
        };
        return Err(AnalysisError::InvalidInput(format!(
            "non-finite value in {} at index {}",
            series, offset
        )));
    }
    Ok(())
}

/// Two-sided p-value of a correlation coefficient against zero, using
/// Student's t with `n - 2` degrees of freedom.
pub(crate) fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / ((1.0 - r) * (1.0 + r))).sqrt();
    student_t_two_sided_p(t, df)
}

fn product_moment(x: &[f64], y: &[f64]) -> AnalysisResult<f64> {
    let x_mean = StatsHelper::mean(x);
    let y_mean = StatsHelper::mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xv, &yv) in x.iter().zip(y) {
        let dx = xv - x_mean;
        let dy = yv - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(AnalysisError::InvalidInput(
            "correlation of a constant sequence is undefined".into(),
        ));
    }
    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Pearson product-moment coefficient and its two-sided p-value.
pub fn pearson(x: &[f64], y: &[f64]) -> AnalysisResult<(f64, f64)> {
    check_pair(x, y)?;
    if x.len() < 2 {
        return Err(AnalysisError::InsufficientSample {
            needed: 2,
            actual: x.len(),
        });
    }
    let r = product_moment(x, y)?;
    Ok((r, correlation_p_value(r, x.len())))
}

/// Spearman rank coefficient and its two-sided p-value.
///
/// Ties take the average of the ranks they span.
pub fn spearman(x: &[f64], y: &[f64]) -> AnalysisResult<(f64, f64)> {
    check_pair(x, y)?;
    if x.len() < 2 {
        return Err(AnalysisError::InsufficientSample {
            needed: 2,
            actual: x.len(),
        });
    }
    let x_ranks = StatsHelper::average_ranks(x);
    let y_ranks = StatsHelper::average_ranks(y);
    let r = product_moment(&x_ranks, &y_ranks)?;
    Ok((r, correlation_p_value(r, x.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spearman_sees_monotone_curve_as_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 25.0];

        let (rho, rho_p) = spearman(&x, &y).unwrap();
        let (r, _) = pearson(&x, &y).unwrap();

        assert_eq!(rho, 1.0);
        assert_eq!(rho_p, 0.0);
        assert!(r < 1.0);
        assert!(r > 0.95);
    }

    #[test]
    fn pearson_matches_reference_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let (r, p) = pearson(&x, &y).unwrap();
        assert!((r - 0.8).abs() < 1e-12, "r {r}");
        assert!((p - 0.104_088_038_661_827_8).abs() < 1e-9, "p {p}");
    }

    #[test]
    fn anti_correlated_sequences_are_negative() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [6.0, 5.5, 3.0, 2.5, 2.0, -1.0];
        let (r, _) = pearson(&x, &y).unwrap();
        let (rho, _) = spearman(&x, &y).unwrap();
        assert!(r < -0.9);
        assert_eq!(rho, -1.0);
    }

    #[test]
    fn tied_ranks_are_averaged() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let (rho, _) = spearman(&x, &y).unwrap();
        // ranks (1, 2.5, 2.5, 4) against (1, 2, 3, 4)
        assert!((rho - 0.948_683_298_050_513_8).abs() < 1e-12, "rho {rho}");
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, AnalysisError::LengthMismatch { left: 3, right: 2 });
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = spearman(&[1.0, 2.0, 3.0], &[1.0, f64::NAN, 2.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(msg) if msg.contains("y at index 1")));
    }

    #[test]
    fn constant_sequence_is_rejected() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }
}
