//! Sensor-window anomaly detection for road-surface monitoring.
//!
//! Raw vertical acceleration and gyroscope rates are buffered into sliding
//! windows; at every cooldown boundary the windows are smoothed and matched
//! against competing pothole and speed-bump patterns, producing a
//! confidence-scored detection.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use interface::{AnomalyKind, DetectionResult, PatternType, SensorReading};
pub use prelude::{AnomalyClassifier, EngineConfig, EngineError, SensorChannel};
pub use processing::DetectionEngine;
