/// Single-state scalar Kalman filter used to smooth a raw window before
/// pattern matching.
///
/// The state model is a constant: prediction leaves the estimate unchanged
/// and only grows the error covariance by the process noise. Output is
/// causal, `smoothed[i]` depends on `samples[..=i]` only.
#[derive(Debug, Clone, Copy)]
pub struct KalmanSmoother {
    pub process_noise: f32,
    pub measurement_noise: f32,
    pub initial_covariance: f32,
}

impl Default for KalmanSmoother {
    fn default() -> Self {
        Self {
            process_noise: 0.1,
            measurement_noise: 1.0,
            initial_covariance: 1.0,
        }
    }
}

impl KalmanSmoother {
    pub fn smooth(&self, samples: &[f32]) -> Vec<f32> {
        let Some(&first) = samples.first() else {
            return Vec::new();
        };

        let mut estimate = first;
        let mut covariance = self.initial_covariance;
        let mut smoothed = Vec::with_capacity(samples.len());

        for &sample in samples {
            covariance += self.process_noise;
            let gain = covariance / (covariance + self.measurement_noise);
            estimate += gain * (sample - estimate);
            covariance *= 1.0 - gain;
            smoothed.push(estimate);
        }

        smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(KalmanSmoother::default().smooth(&[]).is_empty());
    }

    #[test]
    fn constant_input_stays_constant() {
        let smoothed = KalmanSmoother::default().smooth(&[9.8; 30]);
        assert_eq!(smoothed.len(), 30);
        assert!(smoothed.iter().all(|&v| (v - 9.8).abs() < 1e-5));
    }

    #[test]
    fn step_is_attenuated_then_tracked() {
        let mut samples = vec![0.0; 5];
        samples.extend(std::iter::repeat(1.0).take(40));
        let smoothed = KalmanSmoother::default().smooth(&samples);

        assert!(smoothed[5] > 0.0 && smoothed[5] < 1.0);
        assert!(smoothed.windows(2).skip(5).all(|w| w[1] >= w[0]));
        assert!((smoothed[44] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn output_is_causal() {
        let base = [1.0, 3.0, 2.0, 5.0, 4.0, 6.0];
        let mut altered = base;
        altered[5] = -20.0;

        let a = KalmanSmoother::default().smooth(&base);
        let b = KalmanSmoother::default().smooth(&altered);
        assert_eq!(a[..5], b[..5]);
        assert_ne!(a[5], b[5]);
    }
}
