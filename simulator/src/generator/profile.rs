use crate::generator::template;
use anyhow::{ensure, Context};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use roadcore::interface::{RideMetadata, RideRecording, SensorReading};
use roadcore::prelude::{SensorChannel, EARTH_GRAVITY};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyShape {
    Pothole,
    SpeedBump,
    DoubleBump,
}

/// One anomaly injected into the synthetic ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySpec {
    pub kind: AnomalyShape,
    pub at_millis: i64,
    /// Peak deviation from the baseline, m/s².
    pub magnitude: f32,
    /// Peak pitch rate while crossing, rad/s.
    #[serde(default = "default_pitch")]
    pub pitch: f32,
}

fn default_pitch() -> f32 {
    1.5
}

/// Configuration for generating a synthetic ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sample_rate_hz: f32,
    pub duration_millis: i64,
    pub baseline: f32,
    pub noise: f32,
    pub gyro_noise: f32,
    pub seed: u64,
    /// Shuffle channel order within each sampling step.
    pub interleave: bool,
    pub anomalies: Vec<AnomalySpec>,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 50.0,
            duration_millis: 10_000,
            baseline: EARTH_GRAVITY,
            noise: 0.05,
            gyro_noise: 0.05,
            seed: 0,
            interleave: true,
            anomalies: vec![
                AnomalySpec {
                    kind: AnomalyShape::Pothole,
                    at_millis: 2_200,
                    magnitude: 3.8,
                    pitch: 1.6,
                },
                AnomalySpec {
                    kind: AnomalyShape::SpeedBump,
                    at_millis: 5_200,
                    magnitude: 2.0,
                    pitch: 1.3,
                },
                AnomalySpec {
                    kind: AnomalyShape::DoubleBump,
                    at_millis: 8_200,
                    magnitude: 2.0,
                    pitch: 1.3,
                },
            ],
            description: None,
            scenario: None,
        }
    }
}

impl GeneratorConfig {
    fn step_millis(&self) -> f32 {
        1000.0 / self.sample_rate_hz
    }

    fn step_count(&self) -> usize {
        (self.duration_millis as f32 / self.step_millis()).floor() as usize
    }
}

struct Overlay {
    accel: Vec<f32>,
    pitch: Vec<f32>,
    roll: Vec<f32>,
}

fn build_overlay(config: &GeneratorConfig, steps: usize) -> Overlay {
    let mut overlay = Overlay {
        accel: vec![0.0; steps],
        pitch: vec![0.0; steps],
        roll: vec![0.0; steps],
    };

    for anomaly in &config.anomalies {
        let shape = match anomaly.kind {
            AnomalyShape::Pothole => template::pothole(anomaly.magnitude),
            AnomalyShape::SpeedBump => template::speed_bump(anomaly.magnitude),
            AnomalyShape::DoubleBump => template::double_bump(anomaly.magnitude),
        };
        let spike = template::pitch_spike(shape.len(), anomaly.pitch);
        // Potholes tip the car sideways, bumps mostly pitch it.
        let roll_share = match anomaly.kind {
            AnomalyShape::Pothole => 1.1,
            AnomalyShape::SpeedBump | AnomalyShape::DoubleBump => 0.7,
        };

        let start = (anomaly.at_millis as f32 / config.step_millis()).round() as usize;
        for (offset, (&accel, &pitch)) in shape.iter().zip(&spike).enumerate() {
            let Some(step) = start.checked_add(offset).filter(|&s| s < steps) else {
                break;
            };
            overlay.accel[step] += accel;
            overlay.pitch[step] += pitch;
            overlay.roll[step] += pitch * roll_share;
        }
    }

    overlay
}

fn jitter(rng: &mut StdRng, amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

pub fn build_recording_from_config(config: &GeneratorConfig) -> anyhow::Result<RideRecording> {
    ensure!(
        config.sample_rate_hz.is_finite() && config.sample_rate_hz > 0.0,
        "sample rate must be positive, got {}",
        config.sample_rate_hz
    );
    ensure!(config.duration_millis > 0, "ride duration must be positive");

    let steps = config.step_count();
    let readings_len = steps
        .checked_mul(3)
        .context("overflow computing reading count for generator")?;

    let overlay = build_overlay(config, steps);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut readings = Vec::with_capacity(readings_len);

    for step in 0..steps {
        let timestamp_nanos = (step as f64 * config.step_millis() as f64 * 1e6) as i64;
        let mut batch = [
            SensorReading::new(
                SensorChannel::AccelZ,
                config.baseline + overlay.accel[step] + jitter(&mut rng, config.noise),
                timestamp_nanos,
            ),
            SensorReading::new(
                SensorChannel::GyroRoll,
                overlay.roll[step] + jitter(&mut rng, config.gyro_noise),
                timestamp_nanos,
            ),
            SensorReading::new(
                SensorChannel::GyroPitch,
                overlay.pitch[step] + jitter(&mut rng, config.gyro_noise),
                timestamp_nanos,
            ),
        ];
        if config.interleave {
            batch.shuffle(&mut rng);
        }
        readings.extend(batch);
    }

    let metadata = RideMetadata {
        name: config
            .scenario
            .clone()
            .unwrap_or_else(|| "synthetic ride".into()),
        sample_rate_hz: config.sample_rate_hz,
        duration_millis: config.duration_millis,
        description: config.description.clone(),
    };

    Ok(RideRecording::new(metadata, readings))
}

pub fn build_recording(seed: u64, duration_millis: i64) -> anyhow::Result<RideRecording> {
    let config = GeneratorConfig {
        seed,
        duration_millis,
        ..Default::default()
    };
    build_recording_from_config(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_interleaved_channels() {
        let recording = build_recording(7, 2_000).unwrap();
        assert_eq!(recording.readings.len(), 3 * 100);
        assert_eq!(recording.channel_count(SensorChannel::AccelZ), 100);
        assert_eq!(recording.channel_count(SensorChannel::GyroPitch), 100);
    }

    #[test]
    fn channel_order_is_preserved_per_axis() {
        let recording = build_recording(3, 1_000).unwrap();
        let accel_times: Vec<i64> = recording
            .readings
            .iter()
            .filter(|r| r.channel == SensorChannel::AccelZ)
            .map(|r| r.timestamp_nanos)
            .collect();
        assert!(accel_times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn quiet_ride_has_flat_baseline_and_injected_pothole() {
        let config = GeneratorConfig {
            noise: 0.0,
            gyro_noise: 0.0,
            duration_millis: 1_000,
            interleave: false,
            anomalies: vec![AnomalySpec {
                kind: AnomalyShape::Pothole,
                at_millis: 200,
                magnitude: 3.0,
                pitch: 1.5,
            }],
            ..Default::default()
        };
        let recording = build_recording_from_config(&config).unwrap();
        let accel: Vec<f32> = recording
            .readings
            .iter()
            .filter(|r| r.channel == SensorChannel::AccelZ)
            .map(|r| r.value)
            .collect();

        assert_eq!(accel[0], config.baseline);
        assert!((accel[10] - (config.baseline - 3.0)).abs() < 1e-5);
        assert!((accel[13] - (config.baseline + 3.0)).abs() < 1e-5);
        assert_eq!(accel[20], config.baseline);
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let config = GeneratorConfig {
            sample_rate_hz: 0.0,
            ..Default::default()
        };
        assert!(build_recording_from_config(&config).is_err());
    }
}
