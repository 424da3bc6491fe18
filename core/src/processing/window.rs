use std::collections::VecDeque;

use crate::prelude::SensorChannel;

/// Fixed-capacity FIFO of scalar readings; the oldest value is evicted when
/// a push would exceed capacity.
#[derive(Debug, Clone)]
pub struct SampleWindow<T = f32> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> SampleWindow<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a value, returning the evicted one if the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.values.len() >= self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.values.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Copy of every window taken at a cooldown boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSnapshot {
    pub accel: Vec<f32>,
    pub roll: Vec<f32>,
    pub pitch: Vec<f32>,
    pub timestamps: Vec<i64>,
    /// Both gyroscope windows had reached capacity.
    pub gyro_full: bool,
}

/// Owns the sliding windows and the cooldown cadence.
///
/// `tick` runs before each reading is pushed. Once the cooldown has
/// elapsed it hands out a snapshot (only if an accelerometer sample arrived
/// since the previous boundary), then clears every window and restarts the
/// cooldown.
#[derive(Debug, Clone)]
pub struct WindowController {
    accel: SampleWindow<f32>,
    roll: SampleWindow<f32>,
    pitch: SampleWindow<f32>,
    timestamps: SampleWindow<i64>,
    cooldown_millis: i64,
    last_detection_millis: i64,
    accel_fresh: bool,
    gyro_fresh: bool,
}

impl WindowController {
    pub fn new(capacity: usize, cooldown_millis: i64) -> Self {
        Self {
            accel: SampleWindow::with_capacity(capacity),
            roll: SampleWindow::with_capacity(capacity),
            pitch: SampleWindow::with_capacity(capacity),
            timestamps: SampleWindow::with_capacity(capacity),
            cooldown_millis,
            last_detection_millis: 0,
            accel_fresh: false,
            gyro_fresh: false,
        }
    }

    pub fn push(&mut self, channel: SensorChannel, value: f32, timestamp_nanos: i64) {
        match channel {
            SensorChannel::AccelZ => {
                self.accel.push(value);
                self.timestamps.push(timestamp_nanos);
                self.accel_fresh = true;
            }
            SensorChannel::GyroRoll => {
                self.roll.push(value);
                self.gyro_fresh = true;
            }
            SensorChannel::GyroPitch => {
                self.pitch.push(value);
                self.gyro_fresh = true;
            }
        }
    }

    pub fn cooldown_elapsed(&self, now_millis: i64) -> bool {
        now_millis - self.last_detection_millis >= self.cooldown_millis
    }

    /// Returns a snapshot when the boundary fires with fresh accelerometer
    /// data, `None` otherwise. Windows are cleared at every boundary.
    pub fn tick(&mut self, now_millis: i64) -> Option<WindowSnapshot> {
        if !self.cooldown_elapsed(now_millis) {
            return None;
        }

        let snapshot = self.accel_fresh.then(|| self.snapshot());

        self.clear_windows();
        self.accel_fresh = false;
        self.gyro_fresh = false;
        self.last_detection_millis = now_millis;

        snapshot
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            accel: self.accel.snapshot(),
            roll: self.roll.snapshot(),
            pitch: self.pitch.snapshot(),
            timestamps: self.timestamps.snapshot(),
            gyro_full: self.roll.is_full() && self.pitch.is_full(),
        }
    }

    pub fn window(&self, channel: SensorChannel) -> &SampleWindow<f32> {
        match channel {
            SensorChannel::AccelZ => &self.accel,
            SensorChannel::GyroRoll => &self.roll,
            SensorChannel::GyroPitch => &self.pitch,
        }
    }

    pub fn is_accel_fresh(&self) -> bool {
        self.accel_fresh
    }

    pub fn is_gyro_fresh(&self) -> bool {
        self.gyro_fresh
    }

    pub fn last_detection_millis(&self) -> i64 {
        self.last_detection_millis
    }

    /// Session stop: empty windows, drop freshness and restart the cooldown clock.
    pub fn reset(&mut self) {
        self.clear_windows();
        self.accel_fresh = false;
        self.gyro_fresh = false;
        self.last_detection_millis = 0;
    }

    fn clear_windows(&mut self) {
        self.accel.clear();
        self.roll.clear();
        self.pitch.clear();
        self.timestamps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_evicts_oldest_past_capacity() {
        let mut window = SampleWindow::with_capacity(50);
        for i in 0..=50 {
            window.push(i as f32);
        }
        let values = window.snapshot();
        assert_eq!(values.len(), 50);
        assert!(!values.contains(&0.0));
        assert_eq!(values.first(), Some(&1.0));
        assert_eq!(values.last(), Some(&50.0));
    }

    #[test]
    fn push_reports_evicted_value() {
        let mut window = SampleWindow::with_capacity(2);
        assert_eq!(window.push(1.0), None);
        assert_eq!(window.push(2.0), None);
        assert_eq!(window.push(3.0), Some(1.0));
        assert!(window.is_full());
    }

    #[test]
    fn channels_are_buffered_independently() {
        let mut controller = WindowController::new(4, 1000);
        controller.push(SensorChannel::GyroPitch, 0.2, 1);
        controller.push(SensorChannel::AccelZ, 9.8, 2);
        controller.push(SensorChannel::GyroRoll, -0.1, 3);
        controller.push(SensorChannel::AccelZ, 9.7, 4);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.accel, vec![9.8, 9.7]);
        assert_eq!(snapshot.timestamps, vec![2, 4]);
        assert_eq!(snapshot.roll, vec![-0.1]);
        assert_eq!(snapshot.pitch, vec![0.2]);
        assert!(!snapshot.gyro_full);
    }

    #[test]
    fn tick_before_cooldown_does_nothing() {
        let mut controller = WindowController::new(10, 1000);
        assert!(controller.tick(1000).is_none());
        controller.push(SensorChannel::AccelZ, 9.8, 0);

        assert!(controller.tick(1500).is_none());
        assert_eq!(controller.window(SensorChannel::AccelZ).len(), 1);
        assert!(controller.is_accel_fresh());
    }

    #[test]
    fn boundaries_fire_once_per_cooldown_and_clear_windows() {
        let mut controller = WindowController::new(10, 1000);
        controller.push(SensorChannel::AccelZ, 9.8, 0);
        controller.push(SensorChannel::GyroRoll, 0.3, 0);

        let first = controller.tick(1000).expect("first boundary");
        assert_eq!(first.accel, vec![9.8]);
        assert!(controller.window(SensorChannel::AccelZ).is_empty());
        assert!(controller.window(SensorChannel::GyroRoll).is_empty());
        assert!(!controller.is_gyro_fresh());

        controller.push(SensorChannel::AccelZ, 9.6, 0);
        assert!(controller.tick(1999).is_none());

        let second = controller.tick(2000).expect("second boundary");
        assert_eq!(second.accel, vec![9.6]);
    }

    #[test]
    fn boundary_without_fresh_accel_clears_but_skips() {
        let mut controller = WindowController::new(10, 1000);
        controller.push(SensorChannel::GyroPitch, 1.0, 0);

        assert!(controller.tick(1000).is_none());
        assert!(controller.window(SensorChannel::GyroPitch).is_empty());
        assert_eq!(controller.last_detection_millis(), 1000);
    }

    #[test]
    fn gyro_full_requires_both_axes() {
        let mut controller = WindowController::new(2, 1000);
        for _ in 0..3 {
            controller.push(SensorChannel::GyroRoll, 0.5, 0);
        }
        assert!(!controller.snapshot().gyro_full);
        controller.push(SensorChannel::GyroPitch, 0.5, 0);
        controller.push(SensorChannel::GyroPitch, 0.5, 0);
        assert!(controller.snapshot().gyro_full);
    }
}
