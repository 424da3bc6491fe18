use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::debug;
use roadcore::interface::{AnomalyKind, DetectionEvent, DetectionResult, RideRecording};
use roadcore::processing::{CycleReport, DetectionEngine};
use roadcore::telemetry::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// One anomaly reported by the engine during a replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedDetection {
    pub timestamp_millis: i64,
    pub kind: AnomalyKind,
    pub result: DetectionResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub ride: String,
    pub detections: Vec<ReportedDetection>,
    pub events: Vec<DetectionEvent>,
    pub last_cycle: Option<CycleReport>,
    pub metrics: MetricsSnapshot,
}

impl WorkflowResult {
    pub fn count(&self, kind: AnomalyKind) -> usize {
        self.detections.iter().filter(|d| d.kind == kind).count()
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Replays a recording through a fresh engine, using each reading's
    /// timestamp as the clock, and flushes the final window.
    pub fn execute(&self, recording: &RideRecording) -> anyhow::Result<WorkflowResult> {
        let mut engine =
            DetectionEngine::new(self.config.engine.clone()).context("building detection engine")?;
        let mut detections = Vec::new();

        for reading in &recording.readings {
            let now = reading.timestamp_millis();
            match engine.on_reading(reading, now) {
                Ok(Some((kind, result))) => detections.push(ReportedDetection {
                    timestamp_millis: now,
                    kind,
                    result,
                }),
                Ok(None) => {}
                Err(err) => debug!("skipping reading at {}: {}", now, err),
            }
        }

        if let Some(last) = recording.readings.last() {
            let flush_at = engine.windows().last_detection_millis().max(last.timestamp_millis())
                + self.config.engine.cooldown_millis;
            if let Some((kind, result)) = engine.tick(flush_at) {
                detections.push(ReportedDetection {
                    timestamp_millis: flush_at,
                    kind,
                    result,
                });
            }
        }

        Ok(WorkflowResult {
            ride: recording.metadata.name.clone(),
            detections,
            events: engine.events().to_vec(),
            last_cycle: engine.last_report().cloned(),
            metrics: engine.metrics(),
        })
    }
}
