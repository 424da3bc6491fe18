use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Summary statistics of one classification window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DataStats {
    pub mean: f32,
    /// Population standard deviation.
    pub std_dev: f32,
    /// Maximum minus minimum.
    pub range: f32,
}

pub struct StatsHelper;

impl StatsHelper {
    /// Computes mean, standard deviation and range. An empty window yields zeros.
    pub fn compute(samples: &[f32]) -> DataStats {
        let view = ArrayView1::from(samples);
        let mean = match view.mean() {
            Some(mean) => mean,
            None => return DataStats::default(),
        };
        let std_dev = view.std(0.0);

        let (min, max) = view
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        DataStats {
            mean,
            std_dev,
            range: max - min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_yields_zero_stats() {
        assert_eq!(StatsHelper::compute(&[]), DataStats::default());
    }

    #[test]
    fn constant_window_has_no_spread() {
        let stats = StatsHelper::compute(&[9.8; 12]);
        assert!((stats.mean - 9.8).abs() < 1e-5);
        assert!(stats.std_dev.abs() < 1e-5);
        assert_eq!(stats.range, 0.0);
    }

    #[test]
    fn population_deviation_and_range() {
        let stats = StatsHelper::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-6);
        assert!((stats.std_dev - 2.0).abs() < 1e-6);
        assert!((stats.range - 7.0).abs() < 1e-6);
    }
}
