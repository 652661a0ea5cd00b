pub struct StatsHelper;

impl StatsHelper {
    pub fn mean_abs(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|v| v.abs()).sum::<f64>() / samples.len() as f64
    }

    pub fn max_abs(samples: &[f64]) -> f64 {
        samples.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    /// First difference divided by the sample interval, `diff(trace) / dt`.
    pub fn derivative(samples: &[f64], dt: f64) -> Vec<f64> {
        samples.windows(2).map(|w| (w[1] - w[0]) / dt).collect()
    }

    pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (count - 1) as f64;
                let mut values: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
                values[count - 1] = stop;
                values
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_abs_empty_sequence_yields_zero() {
        assert_eq!(StatsHelper::mean_abs(&[]), 0.0);
        assert_eq!(StatsHelper::mean_abs(&[-2.0, 2.0]), 2.0);
    }

    #[test]
    fn max_abs_picks_largest_magnitude() {
        assert_eq!(StatsHelper::max_abs(&[1.0, -4.0, 3.0]), 4.0);
    }

    #[test]
    fn derivative_scales_by_interval() {
        let speed = StatsHelper::derivative(&[0.0, 1.0, 3.0], 0.5);
        assert_eq!(speed, vec![2.0, 4.0]);
    }

    #[test]
    fn linspace_hits_both_endpoints() {
        let values = StatsHelper::linspace(-1.0, 1.0, 5);
        assert_eq!(values, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(StatsHelper::linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(StatsHelper::linspace(2.0, 3.0, 0).is_empty());
    }
}
