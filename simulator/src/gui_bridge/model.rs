use crate::workflow::runner::{ReportedDetection, WorkflowResult};
use roadcore::interface::DetectionEvent;
use roadcore::telemetry::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Latest replay outcome as served to list/map front ends.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedModel {
    pub ride: String,
    pub detections: Vec<ReportedDetection>,
    pub events: Vec<DetectionEvent>,
    pub metrics: MetricsSnapshot,
}

impl FeedModel {
    pub fn from_result(result: &WorkflowResult) -> Self {
        Self {
            ride: result.ride.clone(),
            detections: result.detections.clone(),
            events: result.events.clone(),
            metrics: result.metrics,
        }
    }
}
