use serde::{Deserialize, Serialize};

use crate::interface::{AnomalyKind, DetectionEvent, DetectionResult, SensorReading};
use crate::prelude::{AnomalyClassifier, EngineConfig, EngineError, EngineResult, SensorChannel};
use crate::processing::gyroscope::{GyroscopeAnalysis, GyroscopeCorroborator};
use crate::processing::pothole::PotholeClassifier;
use crate::processing::speed_bump::SpeedBumpClassifier;
use crate::processing::window::{WindowController, WindowSnapshot};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{MetricsRecorder, MetricsSnapshot};

/// Everything computed during one classification cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub timestamp_millis: i64,
    pub pothole: DetectionResult,
    pub speed_bump: DetectionResult,
    /// Present only when both gyroscope windows were full.
    pub gyroscope: Option<GyroscopeAnalysis>,
    pub selected: Option<(AnomalyKind, DetectionResult)>,
}

/// Ingestion and classification facade over the window controller and the
/// classifiers. Owns all mutable state; classifiers only see snapshots.
#[derive(Debug)]
pub struct DetectionEngine {
    config: EngineConfig,
    windows: WindowController,
    pothole: PotholeClassifier,
    speed_bump: SpeedBumpClassifier,
    gyroscope: GyroscopeCorroborator,
    pending: Vec<DetectionResult>,
    events: Vec<DetectionEvent>,
    last_report: Option<CycleReport>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl DetectionEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            windows: WindowController::new(config.window_capacity, config.cooldown_millis),
            pothole: PotholeClassifier::new(config.min_samples),
            speed_bump: SpeedBumpClassifier::new(config.min_samples),
            gyroscope: GyroscopeCorroborator::from_config(&config),
            pending: Vec::new(),
            events: Vec::new(),
            last_report: None,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Buffers one raw reading. Non-finite values are rejected and never
    /// reach a window.
    pub fn ingest(
        &mut self,
        channel: SensorChannel,
        value: f32,
        timestamp_nanos: i64,
    ) -> EngineResult<()> {
        self.check(channel, value)?;
        self.windows.push(channel, value, timestamp_nanos);
        self.metrics.record_sample(channel);
        Ok(())
    }

    /// Runs the cooldown boundary. Returns the reported anomaly when a
    /// classification ran and one of the classifiers was confident enough.
    pub fn tick(&mut self, now_millis: i64) -> Option<(AnomalyKind, DetectionResult)> {
        let boundary = self.windows.cooldown_elapsed(now_millis);
        let snapshot = match self.windows.tick(now_millis) {
            Some(snapshot) => snapshot,
            None => {
                if boundary {
                    self.metrics.record_skipped();
                }
                return None;
            }
        };

        let report = self.classify(&snapshot, now_millis);
        self.metrics.record_cycle();

        for result in [&report.pothole, &report.speed_bump] {
            if let (true, Some(pattern)) = (result.detected, result.pattern_type) {
                self.events.push(DetectionEvent {
                    kind: pattern.kind(),
                    pattern: Some(pattern),
                    confidence: result.confidence,
                    timestamp_millis: now_millis,
                });
            }
        }

        if let Some((kind, result)) = &report.selected {
            self.metrics.record_report(*kind);
            self.pending.push(result.clone());
        }

        self.logger.record(&format!(
            "cycle at {} over {} samples: pothole {:.3}, speed bump {:.3}, reported {}",
            now_millis,
            snapshot.accel.len(),
            report.pothole.confidence,
            report.speed_bump.confidence,
            report
                .selected
                .as_ref()
                .map(|(kind, _)| kind.as_str())
                .unwrap_or("nothing")
        ));

        let selected = report.selected.clone();
        self.last_report = Some(report);
        selected
    }

    /// Sensor-event entry point: the boundary is checked before the reading
    /// is buffered, so a reading arriving at a boundary opens the next window.
    pub fn on_reading(
        &mut self,
        reading: &SensorReading,
        now_millis: i64,
    ) -> EngineResult<Option<(AnomalyKind, DetectionResult)>> {
        self.check(reading.channel, reading.value)?;
        let outcome = self.tick(now_millis);
        self.ingest(reading.channel, reading.value, reading.timestamp_nanos)?;
        Ok(outcome)
    }

    /// Classifies one snapshot without touching engine state.
    pub fn classify(&self, snapshot: &WindowSnapshot, now_millis: i64) -> CycleReport {
        let baseline = self.config.baseline;
        let pothole = self.pothole.classify(&snapshot.accel, baseline);
        let speed_bump = self.speed_bump.classify(&snapshot.accel, baseline);
        let gyroscope = snapshot
            .gyro_full
            .then(|| self.gyroscope.analyze(&snapshot.roll, &snapshot.pitch));

        let selected = self
            .select(&pothole, AnomalyKind::Pothole)
            .or_else(|| self.select(&speed_bump, AnomalyKind::SpeedBump))
            .map(|(kind, mut result)| {
                result.detection_type = Some(kind);
                result.input_gyro_pitch_values = snapshot.pitch.clone();
                (kind, result)
            });

        CycleReport {
            timestamp_millis: now_millis,
            pothole,
            speed_bump,
            gyroscope,
            selected,
        }
    }

    fn select(
        &self,
        result: &DetectionResult,
        kind: AnomalyKind,
    ) -> Option<(AnomalyKind, DetectionResult)> {
        (result.detected && result.confidence >= self.config.report_confidence)
            .then(|| (kind, result.clone()))
    }

    fn check(&self, channel: SensorChannel, value: f32) -> EngineResult<()> {
        if value.is_finite() {
            return Ok(());
        }
        self.metrics.record_rejected();
        self.logger
            .rejected(&format!("dropping non-finite {:?} sample {}", channel, value));
        Err(EngineError::InvalidInput(format!(
            "non-finite {:?} sample",
            channel
        )))
    }

    pub fn last_report(&self) -> Option<&CycleReport> {
        self.last_report.as_ref()
    }

    /// Results reported since the last drain, oldest first.
    pub fn pending(&self) -> &[DetectionResult] {
        &self.pending
    }

    pub fn drain_pending(&mut self) -> Vec<DetectionResult> {
        std::mem::take(&mut self.pending)
    }

    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    pub fn windows(&self) -> &WindowController {
        &self.windows
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Session stop: clears windows, cooldown, pending results, events and
    /// counters.
    pub fn reset(&mut self) {
        self.windows.reset();
        self.metrics.reset();
        self.pending.clear();
        self.events.clear();
        self.last_report = None;
    }
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::PatternType;

    const BASELINE: f32 = 9.8;

    fn engine() -> DetectionEngine {
        DetectionEngine::new(EngineConfig {
            baseline: BASELINE,
            ..Default::default()
        })
        .unwrap()
    }

    fn padded(core: &[f32]) -> Vec<f32> {
        let mut window = vec![BASELINE; 10];
        window.extend_from_slice(core);
        window.resize(50, BASELINE);
        window
    }

    fn pothole_window() -> Vec<f32> {
        let mut core = vec![6.0; 3];
        core.extend_from_slice(&[13.5; 3]);
        padded(&core)
    }

    fn bump_window() -> Vec<f32> {
        let hump = [11.8, 11.8, 9.0, 9.0];
        let mut core = hump.to_vec();
        core.extend_from_slice(&[BASELINE; 12]);
        core.extend_from_slice(&hump);
        padded(&core)
    }

    fn feed(engine: &mut DetectionEngine, accel: &[f32], pitch: f32) {
        for (i, &value) in accel.iter().enumerate() {
            let t = i as i64 * 20_000_000;
            engine.ingest(SensorChannel::AccelZ, value, t).unwrap();
            engine.ingest(SensorChannel::GyroRoll, 0.4, t).unwrap();
            engine.ingest(SensorChannel::GyroPitch, pitch, t).unwrap();
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            window_capacity: 0,
            ..Default::default()
        };
        assert!(DetectionEngine::new(config).is_err());
    }

    #[test]
    fn pothole_is_reported_at_boundary() {
        let mut engine = engine();
        let window = pothole_window();
        feed(&mut engine, &window, 1.3);

        let (kind, result) = engine.tick(1000).expect("pothole reported");
        assert_eq!(kind, AnomalyKind::Pothole);
        assert_eq!(result.pattern_type, Some(PatternType::Classic));
        assert_eq!(result.detection_type, Some(AnomalyKind::Pothole));
        assert_eq!(result.input_y_acc_values, window);
        assert_eq!(result.input_gyro_pitch_values, vec![1.3; 50]);

        let report = engine.last_report().unwrap();
        assert_eq!(report.pothole.detection_type, None);
        let gyro = report.gyroscope.expect("gyro windows were full");
        assert!(!gyro.significant_pothole_rotation);
        assert!(!gyro.significant_bump_rotation);
        assert_eq!(engine.pending().len(), 1);
        assert!(engine
            .events()
            .iter()
            .any(|event| event.kind == AnomalyKind::Pothole));
    }

    #[test]
    fn bump_is_reported_with_its_own_result() {
        let mut engine = engine();
        feed(&mut engine, &bump_window(), 0.0);

        let (kind, result) = engine.tick(1000).expect("bump reported");
        assert_eq!(kind, AnomalyKind::SpeedBump);
        assert_eq!(result.detection_type, Some(AnomalyKind::SpeedBump));
        assert_eq!(result.pattern_type, Some(PatternType::DoubleBump));
        assert_eq!(result.detection_index, 10);
        assert!(!engine.last_report().unwrap().pothole.detected);
    }

    #[test]
    fn flat_road_reports_nothing() {
        let mut engine = engine();
        feed(&mut engine, &[BASELINE; 50], 0.0);

        assert!(engine.tick(1000).is_none());
        let report = engine.last_report().expect("classification ran");
        assert!(report.selected.is_none());
        assert!(engine.pending().is_empty());
        assert_eq!(engine.metrics().cycles_run, 1);
    }

    #[test]
    fn low_confidence_detection_is_logged_but_not_reported() {
        let mut engine = DetectionEngine::new(EngineConfig {
            baseline: BASELINE,
            report_confidence: 5.0,
            ..Default::default()
        })
        .unwrap();
        feed(&mut engine, &pothole_window(), 0.0);

        assert!(engine.tick(1000).is_none());
        assert!(engine.last_report().unwrap().pothole.detected);
        assert!(!engine.events().is_empty());
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn partial_gyro_windows_skip_corroboration() {
        let mut engine = engine();
        for value in pothole_window() {
            engine.ingest(SensorChannel::AccelZ, value, 0).unwrap();
        }
        engine.ingest(SensorChannel::GyroPitch, 2.0, 0).unwrap();

        engine.tick(1000);
        assert!(engine.last_report().unwrap().gyroscope.is_none());
    }

    #[test]
    fn cooldown_limits_classification_cadence() {
        let mut engine = engine();
        feed(&mut engine, &pothole_window(), 0.0);
        assert!(engine.tick(1000).is_some());

        feed(&mut engine, &pothole_window(), 0.0);
        assert!(engine.tick(1500).is_none());
        assert_eq!(engine.windows().window(SensorChannel::AccelZ).len(), 50);

        assert!(engine.tick(2000).is_some());
        assert!(engine.windows().window(SensorChannel::AccelZ).is_empty());
        assert_eq!(engine.metrics().cycles_run, 2);
        assert_eq!(engine.drain_pending().len(), 2);
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn boundary_without_accel_is_skipped() {
        let mut engine = engine();
        engine.ingest(SensorChannel::GyroRoll, 0.1, 0).unwrap();
        assert!(engine.tick(1000).is_none());
        assert!(engine.last_report().is_none());
        assert_eq!(engine.metrics().cycles_skipped, 1);
    }

    #[test]
    fn reading_at_boundary_opens_next_window() {
        let mut engine = engine();
        for (i, value) in pothole_window().into_iter().enumerate() {
            let reading = SensorReading::new(SensorChannel::AccelZ, value, i as i64);
            assert!(engine.on_reading(&reading, 100 + i as i64).unwrap().is_none());
        }

        let reading = SensorReading::new(SensorChannel::AccelZ, 9.9, 0);
        let outcome = engine.on_reading(&reading, 1000).unwrap();
        assert_eq!(outcome.map(|(kind, _)| kind), Some(AnomalyKind::Pothole));
        assert_eq!(
            engine.windows().window(SensorChannel::AccelZ).snapshot(),
            vec![9.9]
        );
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let mut engine = engine();
        let err = engine
            .ingest(SensorChannel::AccelZ, f32::NAN, 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let reading = SensorReading::new(SensorChannel::GyroPitch, f32::INFINITY, 0);
        assert!(engine.on_reading(&reading, 5000).is_err());
        assert_eq!(engine.windows().last_detection_millis(), 0);
        assert_eq!(engine.metrics().rejected_samples, 2);
    }

    #[test]
    fn reset_clears_session_state() {
        let mut engine = engine();
        feed(&mut engine, &pothole_window(), 0.0);
        engine.tick(1000);
        engine.ingest(SensorChannel::AccelZ, 9.8, 0).unwrap();

        engine.reset();
        assert!(engine.pending().is_empty());
        assert!(engine.events().is_empty());
        assert!(engine.last_report().is_none());
        assert!(engine.windows().window(SensorChannel::AccelZ).is_empty());
        assert!(!engine.windows().is_accel_fresh());
        assert_eq!(engine.metrics(), MetricsSnapshot::default());
    }
}
