use std::cmp::Ordering;

pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return f64::NAN;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Population standard deviation (divides by `n`).
    pub fn population_std(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return f64::NAN;
        }
        let mean = Self::mean(samples);
        let sum_sq: f64 = samples.iter().map(|&v| (v - mean) * (v - mean)).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Median; even-length inputs average the two middle values.
    pub fn median(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return f64::NAN;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            0.5 * (sorted[mid - 1] + sorted[mid])
        } else {
            sorted[mid]
        }
    }

    /// 1-based ranks where ties share the average of the ranks they span.
    pub fn average_ranks(samples: &[f64]) -> Vec<f64> {
        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.sort_by(|&a, &b| {
            samples[a]
                .partial_cmp(&samples[b])
                .unwrap_or(Ordering::Equal)
        });

        let mut ranks = vec![0.0; samples.len()];
        let mut start = 0;
        while start < order.len() {
            let mut end = start + 1;
            while end < order.len() && samples[order[end]] == samples[order[start]] {
                end += 1;
            }
            // positions start..end hold ranks start+1..=end
            let shared = (start + end + 1) as f64 / 2.0;
            for &idx in &order[start..end] {
                ranks[idx] = shared;
            }
            start = end;
        }
        ranks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_yields_nan() {
        assert!(StatsHelper::mean(&[]).is_nan());
        assert!(StatsHelper::population_std(&[]).is_nan());
        assert!(StatsHelper::median(&[]).is_nan());
    }

    #[test]
    fn population_std_divides_by_count() {
        let std = StatsHelper::population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn median_handles_odd_and_even_lengths() {
        assert_eq!(StatsHelper::median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(StatsHelper::median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn ties_share_average_rank() {
        let ranks = StatsHelper::average_ranks(&[10.0, 20.0, 20.0, 5.0]);
        assert_eq!(ranks, vec![2.0, 3.5, 3.5, 1.0]);
    }
}
