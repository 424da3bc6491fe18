use serde::{Deserialize, Serialize};

use crate::prelude::SensorChannel;

/// One raw sensor value as delivered by the platform sensor callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub channel: SensorChannel,
    pub value: f32,
    pub timestamp_nanos: i64,
}

impl SensorReading {
    pub fn new(channel: SensorChannel, value: f32, timestamp_nanos: i64) -> Self {
        Self {
            channel,
            value,
            timestamp_nanos,
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_nanos / 1_000_000
    }
}

/// Describes the drive a recording was captured or synthesized from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RideMetadata {
    pub name: String,
    pub sample_rate_hz: f32,
    pub duration_millis: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Ordered stream of readings, interleaved across channels in arrival order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RideRecording {
    pub metadata: RideMetadata,
    pub readings: Vec<SensorReading>,
}

impl RideRecording {
    pub fn new(metadata: RideMetadata, readings: Vec<SensorReading>) -> Self {
        Self { metadata, readings }
    }

    pub fn channel_count(&self, channel: SensorChannel) -> usize {
        self.readings
            .iter()
            .filter(|reading| reading.channel == channel)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_round_trips_through_json() {
        let recording = RideRecording::new(
            RideMetadata {
                name: "short".into(),
                sample_rate_hz: 50.0,
                duration_millis: 40,
                description: None,
            },
            vec![
                SensorReading::new(SensorChannel::AccelZ, 9.8, 0),
                SensorReading::new(SensorChannel::GyroPitch, 0.1, 20_000_000),
            ],
        );

        let json = serde_json::to_string(&recording).unwrap();
        assert!(json.contains("\"accel_z\""));
        let parsed: RideRecording = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.channel_count(SensorChannel::AccelZ), 1);
        assert_eq!(parsed.readings[1].timestamp_millis(), 20);
    }
}
