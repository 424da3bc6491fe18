use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::interface::AnomalyKind;
use crate::prelude::SensorChannel;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub accel_samples: usize,
    pub gyro_samples: usize,
    pub rejected_samples: usize,
    pub cycles_run: usize,
    pub cycles_skipped: usize,
    pub potholes_reported: usize,
    pub speed_bumps_reported: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_sample(&self, channel: SensorChannel) {
        if let Ok(mut metrics) = self.inner.lock() {
            match channel {
                SensorChannel::AccelZ => metrics.accel_samples += 1,
                SensorChannel::GyroRoll | SensorChannel::GyroPitch => metrics.gyro_samples += 1,
            }
        }
    }

    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected_samples += 1;
        }
    }

    pub fn record_cycle(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cycles_run += 1;
        }
    }

    pub fn record_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cycles_skipped += 1;
        }
    }

    pub fn record_report(&self, kind: AnomalyKind) {
        if let Ok(mut metrics) = self.inner.lock() {
            match kind {
                AnomalyKind::Pothole => metrics.potholes_reported += 1,
                AnomalyKind::SpeedBump => metrics.speed_bumps_reported += 1,
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|metrics| *metrics).unwrap_or_default()
    }

    pub fn reset(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            *metrics = MetricsSnapshot::default();
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_channel_and_kind() {
        let metrics = MetricsRecorder::new();
        metrics.record_sample(SensorChannel::AccelZ);
        metrics.record_sample(SensorChannel::GyroRoll);
        metrics.record_sample(SensorChannel::GyroPitch);
        metrics.record_cycle();
        metrics.record_report(AnomalyKind::SpeedBump);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.accel_samples, 1);
        assert_eq!(snapshot.gyro_samples, 2);
        assert_eq!(snapshot.cycles_run, 1);
        assert_eq!(snapshot.speed_bumps_reported, 1);
        assert_eq!(snapshot.potholes_reported, 0);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
