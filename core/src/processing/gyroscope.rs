use serde::{Deserialize, Serialize};

use crate::prelude::EngineConfig;

/// Rotation statistics over the roll (x) and pitch (y) windows of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GyroscopeAnalysis {
    /// Mean absolute roll rate.
    pub avg_x: f32,
    /// Mean absolute pitch rate.
    pub avg_y: f32,
    /// Largest absolute roll rate.
    pub max_x: f32,
    /// Largest absolute pitch rate.
    pub max_y: f32,
    /// Signed minimum roll rate.
    pub min_x: f32,
    /// Signed minimum pitch rate.
    pub min_y: f32,
    pub significant_pothole_rotation: bool,
    pub significant_bump_rotation: bool,
}

/// Derives rotation corroboration flags. The flags are exposed to the caller
/// and never folded into the accelerometer confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GyroscopeCorroborator {
    pitch_threshold: f32,
    roll_threshold_pothole: f32,
    roll_threshold_bump: f32,
}

impl Default for GyroscopeCorroborator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl GyroscopeCorroborator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            pitch_threshold: config.pitch_threshold,
            roll_threshold_pothole: config.roll_threshold_pothole,
            roll_threshold_bump: config.roll_threshold_bump,
        }
    }

    pub fn analyze(&self, roll: &[f32], pitch: &[f32]) -> GyroscopeAnalysis {
        let roll_stats = AxisStats::over(roll);
        let pitch_stats = AxisStats::over(pitch);
        let pitch_significant = pitch_stats.max_abs > self.pitch_threshold;

        GyroscopeAnalysis {
            avg_x: roll_stats.mean_abs,
            avg_y: pitch_stats.mean_abs,
            max_x: roll_stats.max_abs,
            max_y: pitch_stats.max_abs,
            min_x: roll_stats.min,
            min_y: pitch_stats.min,
            significant_pothole_rotation: pitch_significant
                && roll_stats.max_abs > self.roll_threshold_pothole,
            significant_bump_rotation: pitch_significant
                && roll_stats.max_abs > self.roll_threshold_bump,
        }
    }
}

struct AxisStats {
    mean_abs: f32,
    max_abs: f32,
    min: f32,
}

impl AxisStats {
    fn over(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self {
                mean_abs: 0.0,
                max_abs: 0.0,
                min: 0.0,
            };
        }

        let (sum, max_abs, min) = samples.iter().fold(
            (0.0f32, 0.0f32, f32::MAX),
            |(sum, max_abs, min), &v| (sum + v.abs(), max_abs.max(v.abs()), min.min(v)),
        );

        Self {
            mean_abs: sum / samples.len() as f32,
            max_abs,
            min,
        }
    }
}
