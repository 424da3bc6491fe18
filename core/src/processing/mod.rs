pub mod engine;
pub mod gyroscope;
pub mod pothole;
pub mod speed_bump;
pub mod window;

pub use engine::{CycleReport, DetectionEngine};
pub use gyroscope::{GyroscopeAnalysis, GyroscopeCorroborator};
pub use pothole::PotholeClassifier;
pub use speed_bump::{symmetry_factor, SpeedBumpClassifier};
pub use window::{SampleWindow, WindowController, WindowSnapshot};
