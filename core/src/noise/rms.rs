use crate::math::stats::StatsHelper;
use crate::prelude::{AnalysisError, AnalysisResult, DEFAULT_MASK_THRESHOLD};
use ndarray::Array2;

/// Values further than this many RMS from the median are clipped.
pub const CLIP_FACTOR: f64 = 3.0;
/// Relative change between rounds that counts as converged.
pub const CONVERGENCE_TOLERANCE: f64 = 0.1;
/// Upper bound on clipping rounds.
pub const MAX_ROUNDS: usize = 10;

/// Outcome of a sigma-clipped RMS estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmaClip {
    pub rms: f64,
    /// Clipping rounds performed, never more than [`MAX_ROUNDS`].
    pub rounds: usize,
    pub converged: bool,
    /// Number of values that survived the mask.
    pub unmasked: usize,
}

/// Runs the sigma-clip and reports how it terminated.
///
/// Entries with `|v| <= mask_threshold` are blanked before any statistic is
/// taken; non-finite entries are blanked as well. The starting estimate is
/// the population standard deviation of the unmasked values, and each round
/// recomputes it over the values strictly within `CLIP_FACTOR * rms` of the
/// median. Running out of rounds is not an error: the last estimate is
/// returned with `converged == false`.
pub fn sigma_clip<'a, I>(values: I, mask_threshold: f64) -> AnalysisResult<SigmaClip>
where
    I: IntoIterator<Item = &'a f64>,
{
    let unmasked: Vec<f64> = values
        .into_iter()
        .copied()
        .filter(|v| v.is_finite() && v.abs() > mask_threshold)
        .collect();
    if unmasked.is_empty() {
        return Err(AnalysisError::EmptyInput("masking the noise map".into()));
    }

    let median = StatsHelper::median(&unmasked);
    let mut previous = StatsHelper::population_std(&unmasked);
    let mut outcome = SigmaClip {
        rms: previous,
        rounds: 0,
        converged: false,
        unmasked: unmasked.len(),
    };
    if previous == 0.0 {
        outcome.converged = true;
        return Ok(outcome);
    }

    let mut window = Vec::with_capacity(unmasked.len());
    for round in 1..=MAX_ROUNDS {
        outcome.rounds = round;
        let limit = previous * CLIP_FACTOR;
        window.clear();
        window.extend(
            unmasked
                .iter()
                .copied()
                .filter(|v| (v - median).abs() < limit),
        );
        if window.is_empty() {
            outcome.rms = previous;
            return Ok(outcome);
        }

        let rms = StatsHelper::population_std(&window);
        outcome.rms = rms;
        if rms == 0.0 {
            // a flat window cannot be clipped any further
            return Ok(outcome);
        }
        if ((rms - previous) / previous).abs() < CONVERGENCE_TOLERANCE {
            outcome.converged = true;
            return Ok(outcome);
        }
        previous = rms;
    }

    Ok(outcome)
}

/// Robust standard deviation of the unmasked population.
pub fn estimate_rms<'a, I>(values: I, mask_threshold: f64) -> AnalysisResult<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    sigma_clip(values, mask_threshold).map(|clip| clip.rms)
}

/// [`estimate_rms`] with the default blanking threshold of `1e-7`.
pub fn estimate_rms_default<'a, I>(values: I) -> AnalysisResult<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    estimate_rms(values, DEFAULT_MASK_THRESHOLD)
}

/// Pixel data of a radio noise map.
#[derive(Debug, Clone)]
pub struct NoiseMap {
    data: Array2<f64>,
}

impl NoiseMap {
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn sigma_clip(&self, mask_threshold: f64) -> AnalysisResult<SigmaClip> {
        sigma_clip(self.data.iter(), mask_threshold)
    }

    pub fn rms(&self, mask_threshold: f64) -> AnalysisResult<f64> {
        estimate_rms(self.data.iter(), mask_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn gaussian_samples(count: usize, sigma: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, sigma).unwrap();
        (0..count).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn outliers_are_clipped_from_gaussian_noise() {
        let mut values = gaussian_samples(1000, 2.0, 7);
        values.extend([100.0, -100.0, 100.0, 100.0, -100.0]);

        let rms = estimate_rms_default(&values).unwrap();
        assert!((rms - 2.0).abs() < 0.2, "rms {rms}");

        let raw = StatsHelper::population_std(&values);
        assert!(raw > 4.0, "outliers should inflate the raw std, got {raw}");
    }

    #[test]
    fn masked_values_never_influence_the_result() {
        let base = gaussian_samples(500, 1.5, 11);
        let mut with_zeros = base.clone();
        with_zeros.extend([0.0; 40]);
        let mut with_small = base.clone();
        with_small.extend((0..40).map(|i| if i % 2 == 0 { 5e-8 } else { -9e-8 }));

        let expected = estimate_rms_default(&base).unwrap();
        assert_eq!(estimate_rms_default(&with_zeros).unwrap(), expected);
        assert_eq!(estimate_rms_default(&with_small).unwrap(), expected);
    }

    #[test]
    fn blanked_pixels_are_skipped() {
        let mut values = gaussian_samples(200, 1.0, 3);
        let expected = estimate_rms_default(&values).unwrap();
        values.extend([f64::NAN, f64::INFINITY, f64::NAN]);
        assert_eq!(estimate_rms_default(&values).unwrap(), expected);
    }

    #[test]
    fn rms_is_non_negative_and_bounded_in_rounds() {
        let inputs: Vec<Vec<f64>> = vec![
            vec![1.0, -1.0],
            vec![3.0, 3.0, 3.0],
            vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 1e6],
            (1..400).map(|i| (i as f64).powi(3) * if i % 2 == 0 { 1.0 } else { -1.0 }).collect(),
            gaussian_samples(300, 0.5, 99),
        ];

        for values in inputs {
            let clip = sigma_clip(&values, DEFAULT_MASK_THRESHOLD).unwrap();
            assert!(clip.rms >= 0.0, "negative rms for {values:?}");
            assert!(clip.rounds <= MAX_ROUNDS);
        }
    }

    #[test]
    fn constant_population_has_zero_rms() {
        let clip = sigma_clip(&[2.5; 16], DEFAULT_MASK_THRESHOLD).unwrap();
        assert_eq!(clip.rms, 0.0);
        assert_eq!(clip.rounds, 0);
        assert!(clip.converged);
    }

    #[test]
    fn fully_masked_input_is_rejected() {
        let err = estimate_rms_default(&[0.0, 1e-9, -1e-8]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
        assert!(estimate_rms_default(&Vec::<f64>::new()).is_err());
    }

    #[test]
    fn noise_map_uses_every_pixel() {
        let values = gaussian_samples(64 * 64, 1e-3, 5);
        let map = NoiseMap::new(Array2::from_shape_vec((64, 64), values.clone()).unwrap());
        assert_eq!(map.dim(), (64, 64));
        assert_eq!(map.rms(1e-9).unwrap(), estimate_rms(&values, 1e-9).unwrap());
    }
}
