use crate::interface::{DetectionResult, PatternType};
use crate::math::{DataStats, KalmanSmoother, StatsHelper};
use crate::prelude::AnomalyClassifier;
use crate::telemetry::log::LogManager;

const DROP_STD_FACTOR: f32 = 1.5;
const DROP_RANGE_FACTOR: f32 = 0.12;
const RECOVERY_STD_FACTOR: f32 = 1.8;
const RECOVERY_RANGE_FACTOR: f32 = 0.15;
const NORMAL_STD_FACTOR: f32 = 0.8;
const NORMAL_RANGE_FACTOR: f32 = 0.04;

const CLASSIC_RECOVERY_FRACTION: f32 = 0.7;
const CLASSIC_DROP_TIMEOUT: usize = 15;
const CLASSIC_NORMALIZE_TIMEOUT: usize = 20;
const CLASSIC_DURATION: (usize, usize) = (3, 12);
const CLASSIC_SCALE: f32 = 0.95;

/// The wide matcher runs on a softened drop threshold.
const WIDE_THRESHOLD_SCALE: f32 = 0.7;
const WIDE_DROP_FRACTION: f32 = 0.6;
const WIDE_RECOVERY_FRACTION: f32 = 0.5;
const WIDE_MIN_RUN: usize = 5;
const WIDE_DURATION: (usize, usize) = (8, 25);
const WIDE_SCALE: f32 = 0.85;

const COMPOUND_DROP_FRACTION: f32 = 0.7;
const COMPOUND_PEAK_FRACTION: f32 = 0.6;
const COMPOUND_MAX_SPAN: usize = 25;
const COMPOUND_DIP_BONUS: f32 = 0.15;
const COMPOUND_SCALE: f32 = 0.9;
const COMPOUND_CAP: f32 = 0.95;

/// Thresholds derived from the statistics of one smoothed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropThresholds {
    pub drop: f32,
    pub recovery: f32,
    pub normal_range: f32,
}

impl DropThresholds {
    pub fn from_stats(stats: &DataStats) -> Self {
        Self {
            drop: (stats.std_dev * DROP_STD_FACTOR).max(stats.range * DROP_RANGE_FACTOR),
            recovery: (stats.std_dev * RECOVERY_STD_FACTOR)
                .max(stats.range * RECOVERY_RANGE_FACTOR),
            normal_range: (stats.std_dev * NORMAL_STD_FACTOR)
                .max(stats.range * NORMAL_RANGE_FACTOR),
        }
    }
}

/// Runs the classic, wide and compound drop/recovery matchers and keeps the
/// most confident one.
#[derive(Debug, Clone)]
pub struct PotholeClassifier {
    min_samples: usize,
    smoother: KalmanSmoother,
    logger: LogManager,
}

impl PotholeClassifier {
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples,
            smoother: KalmanSmoother::default(),
            logger: LogManager::new(),
        }
    }
}

impl Default for PotholeClassifier {
    fn default() -> Self {
        Self::new(10)
    }
}

impl AnomalyClassifier for PotholeClassifier {
    fn classify(&self, window: &[f32], baseline: f32) -> DetectionResult {
        if window.len() < self.min_samples {
            return DetectionResult::undetected(window);
        }

        let smoothed = self.smoother.smooth(window);
        let stats = StatsHelper::compute(&smoothed);
        let thresholds = DropThresholds::from_stats(&stats);

        let candidates = vec![
            classic_pattern(&smoothed, baseline, &thresholds, window),
            wide_pattern(
                &smoothed,
                baseline,
                thresholds.drop * WIDE_THRESHOLD_SCALE,
                thresholds.recovery,
                window,
            ),
            compound_pattern(
                &smoothed,
                baseline,
                thresholds.drop,
                thresholds.recovery,
                window,
            ),
        ];
        for candidate in &candidates {
            self.logger.pattern("pothole", candidate);
        }

        DetectionResult::best_of(candidates).unwrap_or_else(|| DetectionResult::undetected(window))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClassicState {
    Normal,
    Drop { start: usize, strength: f32 },
    Recovery { start: usize, drop: f32, recovery: f32 },
}

/// Sharp drop, sharp recovery, then a return to the baseline band.
pub(crate) fn classic_pattern(
    data: &[f32],
    baseline: f32,
    thresholds: &DropThresholds,
    window: &[f32],
) -> DetectionResult {
    let mut state = ClassicState::Normal;

    for (i, &value) in data.iter().enumerate().skip(1) {
        state = match state {
            ClassicState::Normal => {
                let drop = baseline - value;
                if drop > thresholds.drop {
                    ClassicState::Drop {
                        start: i,
                        strength: drop / thresholds.drop,
                    }
                } else {
                    ClassicState::Normal
                }
            }
            ClassicState::Drop { start, strength } => {
                let recovery = value - baseline;
                if recovery > thresholds.recovery * CLASSIC_RECOVERY_FRACTION {
                    ClassicState::Recovery {
                        start,
                        drop: strength,
                        recovery: recovery / thresholds.recovery,
                    }
                } else if i - start > CLASSIC_DROP_TIMEOUT {
                    ClassicState::Normal
                } else {
                    state
                }
            }
            ClassicState::Recovery {
                start,
                drop,
                recovery,
            } => {
                if (value - baseline).abs() < thresholds.normal_range {
                    let duration = i - start;
                    let duration_factor =
                        if (CLASSIC_DURATION.0..=CLASSIC_DURATION.1).contains(&duration) {
                            1.0
                        } else {
                            0.7
                        };
                    let confidence =
                        (drop * 0.4 + recovery * 0.4 + duration_factor * 0.2) * CLASSIC_SCALE;
                    return DetectionResult::detected(
                        PatternType::Classic,
                        confidence,
                        start,
                        window,
                    );
                } else if i - start > CLASSIC_NORMALIZE_TIMEOUT {
                    ClassicState::Normal
                } else {
                    state
                }
            }
        };
    }

    DetectionResult::undetected(window)
}

/// Long, shallower sustained drop followed by a recovery above baseline.
pub(crate) fn wide_pattern(
    data: &[f32],
    baseline: f32,
    drop_threshold: f32,
    recovery_threshold: f32,
    window: &[f32],
) -> DetectionResult {
    let mut run_length = 0usize;
    let mut max_strength = 0.0f32;
    let mut run_start = 0usize;

    for (i, &value) in data.iter().enumerate().skip(1) {
        let drop = baseline - value;

        if drop > drop_threshold * WIDE_DROP_FRACTION {
            if run_length == 0 {
                run_start = i;
            }
            run_length += 1;
            max_strength = max_strength.max(drop / drop_threshold);
        } else if run_length >= WIDE_MIN_RUN
            && value > baseline + recovery_threshold * WIDE_RECOVERY_FRACTION
        {
            let duration = i - run_start;
            let duration_quality = if (WIDE_DURATION.0..=WIDE_DURATION.1).contains(&duration) {
                1.0
            } else {
                0.6
            };
            let confidence = max_strength * 0.5 + duration_quality * 0.5 * WIDE_SCALE;
            return DetectionResult::detected(PatternType::Wide, confidence, run_start, window);
        } else if run_length > 0 && run_length < WIDE_MIN_RUN {
            run_length = 0;
            max_strength = 0.0;
        }
    }

    DetectionResult::undetected(window)
}

/// Two or more dips with a rebound between them inside a short span.
pub(crate) fn compound_pattern(
    data: &[f32],
    baseline: f32,
    drop_threshold: f32,
    recovery_threshold: f32,
    window: &[f32],
) -> DetectionResult {
    let mut dip_count = 0usize;
    let mut first_dip: Option<usize> = None;
    let mut last_peak: Option<usize> = None;
    let mut total_strength = 0.0f32;

    for i in 2..data.len().saturating_sub(1) {
        let (prev, current, next) = (data[i - 1], data[i], data[i + 1]);

        let local_min = current < prev
            && current < next
            && baseline - current > drop_threshold * COMPOUND_DROP_FRACTION;
        let local_max = current > prev
            && current > next
            && current - baseline > recovery_threshold * COMPOUND_PEAK_FRACTION;

        if local_min {
            if dip_count == 0 {
                first_dip = Some(i);
            }
            dip_count += 1;
            total_strength += (baseline - current) / drop_threshold;
        } else if local_max {
            last_peak = Some(i);
        }

        if let (Some(first), Some(peak)) = (first_dip, last_peak) {
            if dip_count >= 2 && peak > first && i - first <= COMPOUND_MAX_SPAN {
                let confidence = (total_strength / dip_count as f32)
                    * (dip_count as f32 * COMPOUND_DIP_BONUS)
                    * COMPOUND_SCALE;
                return DetectionResult::detected(
                    PatternType::Compound,
                    confidence.min(COMPOUND_CAP),
                    first,
                    window,
                );
            }
        }
    }

    DetectionResult::undetected(window)
}
