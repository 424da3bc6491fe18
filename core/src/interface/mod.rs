pub mod detection;
pub mod reading;

pub use detection::{AnomalyKind, DetectionEvent, DetectionResult, PatternType};
pub use reading::{RideMetadata, RideRecording, SensorReading};
