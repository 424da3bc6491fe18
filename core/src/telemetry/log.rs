use log::{debug, info, warn};

use crate::interface::DetectionResult;

const TARGET: &str = "roadcore";

#[derive(Debug, Clone, Copy)]
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!(target: TARGET, "{}", message);
    }

    /// Per-matcher diagnostics, one line per candidate pattern.
    pub fn pattern(&self, classifier: &str, result: &DetectionResult) {
        if result.detected {
            debug!(
                target: TARGET,
                "{} candidate {} at {} confidence {:.3}",
                classifier,
                result.pattern_type.map(|p| p.as_str()).unwrap_or("-"),
                result.detection_index,
                result.confidence
            );
        }
    }

    pub fn rejected(&self, message: &str) {
        warn!(target: TARGET, "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
