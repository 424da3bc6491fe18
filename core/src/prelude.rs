use serde::{Deserialize, Serialize};

use crate::interface::DetectionResult;

/// Standard gravity, the resting vertical acceleration of a level road.
pub const EARTH_GRAVITY: f32 = 9.806_65;

/// Shared configuration for the window controller and every classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window_capacity: usize,
    pub cooldown_millis: i64,
    pub baseline: f32,
    /// Windows shorter than this are never classified.
    pub min_samples: usize,
    pub pitch_threshold: f32,
    pub roll_threshold_pothole: f32,
    pub roll_threshold_bump: f32,
    /// Minimum confidence a detected pattern needs before `tick` reports it.
    pub report_confidence: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_capacity: 50,
            cooldown_millis: 1000,
            baseline: EARTH_GRAVITY,
            min_samples: 10,
            pitch_threshold: 1.2,
            roll_threshold_pothole: 1.5,
            roll_threshold_bump: 0.8,
            report_confidence: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.window_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "window capacity must be positive".into(),
            ));
        }
        if self.cooldown_millis < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "cooldown must not be negative, got {}",
                self.cooldown_millis
            )));
        }
        if !self.baseline.is_finite() {
            return Err(EngineError::InvalidConfig("baseline must be finite".into()));
        }

        let thresholds = [
            ("pitch_threshold", self.pitch_threshold),
            ("roll_threshold_pothole", self.roll_threshold_pothole),
            ("roll_threshold_bump", self.roll_threshold_bump),
            ("report_confidence", self.report_confidence),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Sensor axis feeding one of the controller's windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    /// Vertical accelerometer axis, m/s².
    AccelZ,
    /// Gyroscope roll rate, rad/s.
    GyroRoll,
    /// Gyroscope pitch rate, rad/s.
    GyroPitch,
}

/// Common error type for engine construction and ingestion.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A pattern classifier over a snapshot of vertical acceleration samples.
///
/// Implementations are total: short or flat windows yield an undetected
/// result with zero confidence rather than an error.
pub trait AnomalyClassifier {
    fn classify(&self, window: &[f32], baseline: f32) -> DetectionResult;
}
