use serde::{Deserialize, Serialize};
use std::fmt;

/// Road anomaly category reported upward to the UI and upload layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    #[serde(rename = "POTHOLE")]
    Pothole,
    #[serde(rename = "SPEED_BUMP")]
    SpeedBump,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Pothole => "POTHOLE",
            AnomalyKind::SpeedBump => "SPEED_BUMP",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape matched by one of the competing pattern matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    Classic,
    Wide,
    Compound,
    ClassicBump,
    ExtendedBump,
    DoubleBump,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Classic => "Classic",
            PatternType::Wide => "Wide",
            PatternType::Compound => "Compound",
            PatternType::ClassicBump => "ClassicBump",
            PatternType::ExtendedBump => "ExtendedBump",
            PatternType::DoubleBump => "DoubleBump",
        }
    }

    pub fn kind(&self) -> AnomalyKind {
        match self {
            PatternType::Classic | PatternType::Wide | PatternType::Compound => {
                AnomalyKind::Pothole
            }
            PatternType::ClassicBump | PatternType::ExtendedBump | PatternType::DoubleBump => {
                AnomalyKind::SpeedBump
            }
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one classifier invocation over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detected: bool,
    /// Unbounded score; combination factors can push it above 1.0.
    pub confidence: f32,
    /// Offset into the analyzed window where the pattern began, -1 if undetected.
    pub detection_index: i32,
    pub pattern_type: Option<PatternType>,
    /// Filled in only once the engine selects this result for reporting.
    pub detection_type: Option<AnomalyKind>,
    /// The raw window that was analyzed.
    pub input_y_acc_values: Vec<f32>,
    #[serde(default)]
    pub input_gyro_pitch_values: Vec<f32>,
}

impl DetectionResult {
    pub fn undetected(window: &[f32]) -> Self {
        Self {
            detected: false,
            confidence: 0.0,
            detection_index: -1,
            pattern_type: None,
            detection_type: None,
            input_y_acc_values: window.to_vec(),
            input_gyro_pitch_values: Vec::new(),
        }
    }

    pub fn detected(
        pattern: PatternType,
        confidence: f32,
        detection_index: usize,
        window: &[f32],
    ) -> Self {
        Self {
            detected: true,
            confidence,
            detection_index: detection_index as i32,
            pattern_type: Some(pattern),
            detection_type: None,
            input_y_acc_values: window.to_vec(),
            input_gyro_pitch_values: Vec::new(),
        }
    }

    /// Picks the highest-confidence result; earlier entries win ties, and the
    /// first entry is returned when every candidate scores zero.
    pub fn best_of(candidates: Vec<DetectionResult>) -> Option<DetectionResult> {
        candidates.into_iter().reduce(|best, candidate| {
            if candidate.confidence > best.confidence {
                candidate
            } else {
                best
            }
        })
    }
}

/// Entry of the engine's event log, one per detected pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub kind: AnomalyKind,
    pub pattern: Option<PatternType>,
    pub confidence: f32,
    pub timestamp_millis: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_to_upload_tags() {
        let json = serde_json::to_string(&AnomalyKind::SpeedBump).unwrap();
        assert_eq!(json, "\"SPEED_BUMP\"");
        assert_eq!(AnomalyKind::Pothole.to_string(), "POTHOLE");
    }

    #[test]
    fn pattern_maps_to_its_kind() {
        assert_eq!(PatternType::Compound.kind(), AnomalyKind::Pothole);
        assert_eq!(PatternType::DoubleBump.kind(), AnomalyKind::SpeedBump);
        assert_eq!(PatternType::ExtendedBump.as_str(), "ExtendedBump");
    }

    #[test]
    fn best_of_prefers_earlier_entry_on_tie() {
        let window = [9.8; 4];
        let first = DetectionResult::detected(PatternType::Classic, 0.8, 2, &window);
        let second = DetectionResult::detected(PatternType::Wide, 0.8, 3, &window);
        let best = DetectionResult::best_of(vec![first, second]).unwrap();
        assert_eq!(best.pattern_type, Some(PatternType::Classic));
        assert_eq!(best.detection_type, None);
    }

    #[test]
    fn best_of_falls_back_to_first_when_nothing_detected() {
        let window = [9.8; 4];
        let candidates = vec![
            DetectionResult::undetected(&window),
            DetectionResult::undetected(&window),
        ];
        let best = DetectionResult::best_of(candidates).unwrap();
        assert!(!best.detected);
        assert_eq!(best.detection_index, -1);
    }
}
